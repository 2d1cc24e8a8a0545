// ABOUTME: Parameter values mapped onto the closed set of database types the plugin binds
// ABOUTME: Converts dynamically-typed JSON values and attaches them to driver queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 pgexec contributors

//! # Parameter Binding
//!
//! Engine parameters arrive as a name → JSON-value dictionary. Each value is
//! mapped onto exactly one [`ParamValue`] variant; anything outside the
//! closed set fails with an error naming the parameter and its runtime type.
//! Strings that parse as UUIDs bind as UUIDs; auto-detection takes priority
//! over plain text. Hosts that build requests programmatically can reach the
//! kinds JSON cannot express (timestamps, decimals) through the `From`
//! constructors.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;
use uuid::Uuid;

use crate::constants::PARAMETER_MARKER;
use crate::errors::{PluginError, PluginResult};

/// A parameter value in one of the supported database kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// SQL NULL
    Null,
    /// Text value
    Text(String),
    /// UUID value
    Uuid(Uuid),
    /// 64-bit signed integer
    Integer(i64),
    /// Double-precision float
    Real(f64),
    /// Arbitrary-precision decimal
    Decimal(Decimal),
    /// Boolean value
    Boolean(bool),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
}

impl ParamValue {
    /// Map a dynamically-typed JSON value onto a database kind.
    ///
    /// `name` is the caller-supplied parameter name, used verbatim in error
    /// messages.
    pub fn from_json(name: &str, value: &Value) -> PluginResult<Self> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(flag) => Ok(Self::Boolean(*flag)),
            Value::Number(number) => number
                .as_i64()
                .map(Self::Integer)
                .or_else(|| number.as_f64().map(Self::Real))
                .ok_or_else(|| PluginError::UnsupportedParameterType {
                    name: name.to_owned(),
                    type_name: "number".to_owned(),
                }),
            Value::String(text) => Ok(Uuid::parse_str(text)
                .map_or_else(|_| Self::Text(text.clone()), Self::Uuid)),
            Value::Array(_) => Err(PluginError::UnsupportedParameterType {
                name: name.to_owned(),
                type_name: "array".to_owned(),
            }),
            Value::Object(_) => Err(PluginError::UnsupportedParameterType {
                name: name.to_owned(),
                type_name: "object".to_owned(),
            }),
        }
    }

    /// Attach this value to a driver query with its natural type.
    #[must_use]
    pub fn bind<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            Self::Null => query.bind(Option::<String>::None),
            Self::Text(text) => query.bind(text.clone()),
            Self::Uuid(id) => query.bind(*id),
            Self::Integer(value) => query.bind(*value),
            Self::Real(value) => query.bind(*value),
            Self::Decimal(value) => query.bind(*value),
            Self::Boolean(flag) => query.bind(*flag),
            Self::Timestamp(instant) => query.bind(*instant),
        }
    }
}

impl From<Uuid> for ParamValue {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::Timestamp(instant)
    }
}

impl From<Decimal> for ParamValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for ParamValue {
    fn from(flag: bool) -> Self {
        Self::Boolean(flag)
    }
}

impl From<String> for ParamValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ParamValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Normalize a parameter name to carry exactly one leading marker.
///
/// `id`, `@id`, and `@@id` all normalize to `@id`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let bare = name.trim().trim_start_matches(PARAMETER_MARKER);
    format!("{PARAMETER_MARKER}{bare}")
}

/// A parameter dictionary converted and ready for binding.
///
/// Every entry of the source map is converted up front, so an unsupported
/// value fails the whole invocation whether or not the statement references
/// it.
#[derive(Debug, Clone, Default)]
pub struct BoundParameters {
    entries: Vec<(String, ParamValue)>,
}

impl BoundParameters {
    /// Convert a name → JSON-value dictionary, normalizing names.
    pub fn from_map(params: &Map<String, Value>) -> PluginResult<Self> {
        let mut entries = Vec::with_capacity(params.len());
        for (name, value) in params {
            let converted = ParamValue::from_json(name, value)?;
            entries.push((normalize_name(name), converted));
        }
        Ok(Self { entries })
    }

    /// Look up a value by name; the probe may arrive with or without the
    /// leading marker.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        let probe = normalize_name(name);
        self.entries
            .iter()
            .find(|(entry_name, _)| *entry_name == probe)
            .map(|(_, value)| value)
    }

    /// Number of bound entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}
