// ABOUTME: Logging configuration and structured logging setup for the plugin
// ABOUTME: Configures log level and output format over tracing-subscriber
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 pgexec contributors

//! Structured logging setup.
//!
//! The host engine usually owns the global subscriber; [`init`] exists for
//! standalone use (integration tests, local harnesses) and is a no-op when a
//! subscriber is already installed.

use anyhow::Result;
use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::constants::SERVICE_NAME;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
}

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Read configuration from `PGEXEC_LOG_LEVEL` / `PGEXEC_LOG_FORMAT`,
    /// falling back to defaults for anything unset or unrecognized.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let level = env::var("PGEXEC_LOG_LEVEL").unwrap_or(defaults.level);
        let format = env::var("PGEXEC_LOG_FORMAT")
            .ok()
            .map_or(defaults.format, |raw| match raw.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => LogFormat::Pretty,
            });
        Self {
            level,
            format,
            include_location: defaults.include_location,
        }
    }
}

/// Install a global subscriber for the configured level and format.
///
/// Honors `RUST_LOG` when set; otherwise filters at `config.level`. Safe to
/// call more than once: subsequent calls leave the existing subscriber in
/// place.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let registry = tracing_subscriber::registry().with(filter);
    let outcome = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_file(config.include_location)
                    .with_line_number(config.include_location),
            )
            .try_init(),
    };

    if outcome.is_ok() {
        tracing::debug!(service = SERVICE_NAME, "logging initialized");
    }
    Ok(())
}
