// ABOUTME: Connection-string normalization and typed connection settings
// ABOUTME: Accepts postgres:// URIs or key-value strings and produces driver options
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 pgexec contributors

//! # Connection Configuration
//!
//! The plugin accepts its connection string in either of two shapes:
//!
//! - a `postgres://` / `postgresql://` URI, which is normalized into the
//!   key-value form with SSL forced to required, or
//! - a key-value string (`Host=...;Port=...;Username=...;Password=...;
//!   Database=...`), which passes through unchanged.
//!
//! The normalized string is then parsed into [`ConnectionSettings`], the
//! typed form the executor turns into driver options per invocation.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use url::Url;

use crate::constants::DEFAULT_PORT;
use crate::errors::{PluginError, PluginResult};

/// Static configuration handed to the plugin at initialization and owned by
/// it for the rest of its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Specifications {
    /// Database connection string, URI or key-value form.
    #[serde(alias = "ConnectionString", alias = "connectionString")]
    pub connection_string: String,
}

/// Normalize a raw connection string into key-value form.
///
/// URIs are decomposed (host, port defaulting to 5432, user-info with an
/// optional colon-separated password, database from the path) and re-encoded
/// with `SSL Mode=Require` forced. Anything else non-empty is passed through
/// unchanged.
pub fn normalize_connection_string(raw: &str) -> PluginResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PluginError::configuration(
            "connection string must not be empty",
        ));
    }
    if !has_postgres_scheme(trimmed) {
        return Ok(raw.to_owned());
    }

    let uri = Url::parse(trimmed)
        .map_err(|e| PluginError::configuration(format!("invalid PostgreSQL URI: {e}")))?;
    let host = uri
        .host_str()
        .ok_or_else(|| PluginError::configuration("PostgreSQL URI is missing a host"))?;
    let port = uri.port().unwrap_or(DEFAULT_PORT);
    let username = decode_component(uri.username())?;
    let password = uri.password().map(decode_component).transpose()?;
    let database = decode_component(uri.path().trim_start_matches('/'))?;

    let mut pairs = vec![format!("Host={host}"), format!("Port={port}")];
    if !username.is_empty() {
        pairs.push(format!("Username={username}"));
    }
    if let Some(password) = password {
        pairs.push(format!("Password={password}"));
    }
    if !database.is_empty() {
        pairs.push(format!("Database={database}"));
    }
    pairs.push("SSL Mode=Require".to_owned());
    Ok(pairs.join(";"))
}

fn has_postgres_scheme(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    lower.starts_with("postgres://") || lower.starts_with("postgresql://")
}

fn decode_component(raw: &str) -> PluginResult<String> {
    urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| {
            PluginError::configuration(format!("invalid percent-encoding in connection URI: {e}"))
        })
}

/// SSL negotiation mode, mirroring the modes the driver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    /// Never use SSL
    Disable,
    /// Prefer plain, fall back to SSL
    Allow,
    /// Prefer SSL, fall back to plain
    Prefer,
    /// Require SSL, no certificate verification
    Require,
    /// Require SSL and a trusted certificate
    VerifyCa,
    /// Require SSL, trusted certificate, and matching hostname
    VerifyFull,
}

impl SslMode {
    /// Parse an SSL mode word, case-insensitive, tolerating the usual
    /// separator spellings (`verify-full`, `VerifyFull`, `verify_full`).
    pub fn parse(raw: &str) -> PluginResult<Self> {
        let folded: String = raw
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "disable" | "disabled" => Ok(Self::Disable),
            "allow" => Ok(Self::Allow),
            "prefer" | "preferred" => Ok(Self::Prefer),
            "require" | "required" => Ok(Self::Require),
            "verifyca" => Ok(Self::VerifyCa),
            "verifyfull" => Ok(Self::VerifyFull),
            _ => Err(PluginError::configuration(format!(
                "unrecognized SSL mode '{raw}'"
            ))),
        }
    }

    fn as_pg(self) -> PgSslMode {
        match self {
            Self::Disable => PgSslMode::Disable,
            Self::Allow => PgSslMode::Allow,
            Self::Prefer => PgSslMode::Prefer,
            Self::Require => PgSslMode::Require,
            Self::VerifyCa => PgSslMode::VerifyCa,
            Self::VerifyFull => PgSslMode::VerifyFull,
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Self::Disable => "disable",
            Self::Allow => "allow",
            Self::Prefer => "prefer",
            Self::Require => "require",
            Self::VerifyCa => "verify-ca",
            Self::VerifyFull => "verify-full",
        };
        f.write_str(word)
    }
}

/// Typed connection settings parsed from the normalized key-value string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Login role, when specified
    pub username: Option<String>,
    /// Login password, when specified
    pub password: Option<String>,
    /// Target database, when specified
    pub database: Option<String>,
    /// SSL negotiation mode, when specified
    pub ssl_mode: Option<SslMode>,
}

impl ConnectionSettings {
    /// Parse a key-value connection string.
    ///
    /// Keys match case-insensitively with internal whitespace ignored
    /// (`SSL Mode` and `sslmode` are the same key); unrecognized keys are
    /// skipped with a debug log so driver-specific extras don't break the
    /// plugin. Malformed segments and non-numeric ports are configuration
    /// errors.
    pub fn parse(connection_string: &str) -> PluginResult<Self> {
        let mut settings = Self {
            host: String::new(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            database: None,
            ssl_mode: None,
        };

        for segment in connection_string.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                PluginError::configuration(format!(
                    "malformed connection-string segment '{segment}'"
                ))
            })?;
            let folded: String = key
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_ascii_lowercase();
            let value = value.trim();

            match folded.as_str() {
                "host" | "server" => settings.host = value.to_owned(),
                "port" => {
                    settings.port = value.parse().map_err(|_| {
                        PluginError::configuration(format!("invalid port '{value}'"))
                    })?;
                }
                "username" | "user" | "userid" => settings.username = Some(value.to_owned()),
                "password" | "pwd" => settings.password = Some(value.to_owned()),
                "database" | "db" | "dbname" => settings.database = Some(value.to_owned()),
                "sslmode" => settings.ssl_mode = Some(SslMode::parse(value)?),
                other => {
                    tracing::debug!(key = other, "ignoring unrecognized connection-string key");
                }
            }
        }

        if settings.host.is_empty() {
            return Err(PluginError::configuration(
                "connection string does not specify a host",
            ));
        }
        Ok(settings)
    }

    /// Normalize and parse in one step.
    pub fn from_raw(raw: &str) -> PluginResult<Self> {
        let normalized = normalize_connection_string(raw)?;
        Self::parse(&normalized)
    }

    /// Driver options for one connection attempt.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        let mut options = PgConnectOptions::new().host(&self.host).port(self.port);
        if let Some(username) = &self.username {
            options = options.username(username);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        if let Some(database) = &self.database {
            options = options.database(database);
        }
        if let Some(ssl_mode) = self.ssl_mode {
            options = options.ssl_mode(ssl_mode.as_pg());
        }
        options
    }
}

/// Key-value rendering with the password masked, for logs.
impl fmt::Display for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host={};Port={}", self.host, self.port)?;
        if let Some(username) = &self.username {
            write!(f, ";Username={username}")?;
        }
        if self.password.is_some() {
            write!(f, ";Password=****")?;
        }
        if let Some(database) = &self.database {
            write!(f, ";Database={database}")?;
        }
        if let Some(ssl_mode) = self.ssl_mode {
            write!(f, ";SSL Mode={ssl_mode}")?;
        }
        Ok(())
    }
}
