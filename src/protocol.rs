// ABOUTME: Invocation contract shared between the engine and the plugin
// ABOUTME: Request/response envelopes, the operation enum, and per-call context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 pgexec contributors

//! # Invocation Contract
//!
//! The engine drives the plugin with an [`InvocationRequest`] plus a
//! [`CallContext`] stamped by its dispatch layer. A `query` invocation comes
//! back as a [`QueryContext`] envelope (generated identifier, `Database`
//! format tag, ordered rows); an `execute` invocation surfaces no payload.
//! The affected-row total is logged, not returned to the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
pub use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::{PluginError, PluginResult};

/// One row of a result set: column name → value, in result-set column order.
pub type ResultRow = Map<String, Value>;

/// Operation requested by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Row-returning statement
    Query,
    /// Row-affecting statement
    Execute,
}

impl Operation {
    /// Case-insensitive lookup of an operation name.
    pub fn parse(name: &str) -> PluginResult<Self> {
        let trimmed = name.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "query" => Ok(Self::Query),
            "execute" => Ok(Self::Execute),
            _ => Err(PluginError::validation(format!(
                "operation '{trimmed}' is not supported"
            ))),
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Execute => "execute",
        }
    }
}

/// Batch payload for `execute`: the statement runs once per row, each row
/// supplying its own parameter bindings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchPayload {
    /// Per-row parameter dictionaries
    #[serde(alias = "Rows")]
    pub rows: Vec<Map<String, Value>>,
}

impl BatchPayload {
    /// Wrap a sequence of row-parameter dictionaries.
    #[must_use]
    pub fn new(rows: Vec<Map<String, Value>>) -> Self {
        Self { rows }
    }
}

/// One invocation from the engine.
///
/// Field aliases accept the PascalCase spelling some engine frontends emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Operation name, matched case-insensitively against `query`/`execute`
    #[serde(alias = "Operation")]
    pub operation: String,
    /// SQL template with `@name` parameter markers
    #[serde(alias = "Sql")]
    pub sql: String,
    /// Parameter dictionary for single-statement invocations
    #[serde(default, alias = "Params")]
    pub params: Map<String, Value>,
    /// Batch payload, meaningful for `execute` only
    #[serde(default, alias = "Data", skip_serializing_if = "Option::is_none")]
    pub data: Option<BatchPayload>,
}

impl InvocationRequest {
    /// A `query` request for the given SQL with no parameters.
    #[must_use]
    pub fn query(sql: impl Into<String>) -> Self {
        Self::new(Operation::Query, sql)
    }

    /// An `execute` request for the given SQL with no parameters.
    #[must_use]
    pub fn execute(sql: impl Into<String>) -> Self {
        Self::new(Operation::Execute, sql)
    }

    fn new(operation: Operation, sql: impl Into<String>) -> Self {
        Self {
            operation: operation.as_str().to_owned(),
            sql: sql.into(),
            params: Map::new(),
            data: None,
        }
    }

    /// Add one parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Replace the parameter dictionary.
    #[must_use]
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Attach a batch payload.
    #[must_use]
    pub fn with_batch(mut self, batch: BatchPayload) -> Self {
        self.data = Some(batch);
        self
    }
}

/// Format tag carried by the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultFormat {
    /// Tabular database rows
    Database,
}

/// Response envelope for row-returning operations: a generated identifier,
/// the format tag, and the row sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryContext {
    /// Identifier generated per invocation
    pub id: Uuid,
    /// Always [`ResultFormat::Database`]
    pub format: ResultFormat,
    /// Result rows in arrival order
    pub rows: Vec<ResultRow>,
}

impl QueryContext {
    /// Wrap rows in a fresh envelope.
    #[must_use]
    pub fn new(rows: Vec<ResultRow>) -> Self {
        Self {
            id: Uuid::new_v4(),
            format: ResultFormat::Database,
            rows,
        }
    }

    /// Number of rows carried.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Outcome of a dispatched statement.
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// `query`: the response envelope
    Rows(QueryContext),
    /// `execute`: total affected rows (logged, not surfaced to the engine)
    Affected(u64),
}

impl ExecutionResult {
    /// The payload surfaced to the engine: `query` rows become a JSON
    /// envelope, `execute` success carries none.
    #[must_use]
    pub fn into_payload(self) -> Option<Value> {
        match self {
            Self::Rows(context) => {
                let mut envelope = Map::new();
                envelope.insert("id".into(), Value::String(context.id.to_string()));
                envelope.insert("format".into(), Value::String("Database".into()));
                envelope.insert(
                    "rows".into(),
                    Value::Array(context.rows.into_iter().map(Value::Object).collect()),
                );
                Some(Value::Object(envelope))
            }
            Self::Affected(_) => None,
        }
    }
}

/// Where an invocation entered the plugin from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOrigin {
    /// The engine's dispatch table, the only sanctioned path
    Engine,
    /// Anything that bypasses the dispatch table (dynamic lookup, harness
    /// shortcuts); rejected before any other validation
    OutOfBand,
}

/// Per-invocation context stamped by the engine's dispatch layer.
#[derive(Debug, Clone)]
pub struct CallContext {
    origin: CallOrigin,
    cancellation: CancellationToken,
}

impl CallContext {
    /// Context for a sanctioned engine-dispatched call.
    #[must_use]
    pub fn engine() -> Self {
        Self::new(CallOrigin::Engine, CancellationToken::new())
    }

    /// Context with an explicit origin and cancellation token.
    #[must_use]
    pub fn new(origin: CallOrigin, cancellation: CancellationToken) -> Self {
        Self {
            origin,
            cancellation,
        }
    }

    /// The stamped origin.
    #[must_use]
    pub const fn origin(&self) -> CallOrigin {
        self.origin
    }

    /// The cancellation token for this invocation.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fail fast when the invocation has been cancelled. Checked at call
    /// entry and again before every network-bound step.
    pub fn ensure_active(&self) -> PluginResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(PluginError::Cancelled);
        }
        Ok(())
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::engine()
    }
}
