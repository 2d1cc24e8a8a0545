// ABOUTME: Unified error taxonomy for the PostgreSQL statement-execution plugin
// ABOUTME: Defines PluginError variants and stable machine-readable error codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 pgexec contributors

//! # Error Handling
//!
//! Every failure the plugin can surface to a host engine is one of the
//! variants below. Errors always propagate to the caller; database failures
//! are logged with message detail before propagation and nothing is retried.

use thiserror::Error;

/// Convenience alias for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// Failures surfaced by the plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Missing or malformed connection configuration.
    #[error("invalid connection configuration: {reason}")]
    Configuration {
        /// What was wrong with the supplied configuration
        reason: String,
    },

    /// The invocation request failed validation before reaching the database.
    #[error("invalid request: {reason}")]
    Validation {
        /// What was wrong with the request
        reason: String,
    },

    /// A parameter value could not be mapped onto a supported database type.
    #[error("unsupported type for parameter '{name}': {type_name}")]
    UnsupportedParameterType {
        /// Name of the offending parameter
        name: String,
        /// Runtime type of the offending value
        type_name: String,
    },

    /// Execution was attempted before the plugin received its specifications.
    #[error("plugin is not initialized; supply specifications before executing")]
    NotInitialized,

    /// The call did not come through the engine's dispatch path.
    #[error("access denied: plugin entry points accept engine-dispatched calls only")]
    AccessDenied,

    /// The invocation was cancelled before a network-bound step.
    #[error("invocation cancelled")]
    Cancelled,

    /// Failure surfaced by the database driver (connectivity, syntax,
    /// constraint violations).
    #[error("database error: {source}")]
    Database {
        /// Underlying driver error
        #[from]
        source: sqlx::Error,
    },
}

impl PluginError {
    /// Build a [`PluginError::Configuration`].
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Build a [`PluginError::Validation`].
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for host engines that key behavior off
    /// error kinds rather than display strings.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::UnsupportedParameterType { .. } => "TYPE_BINDING_ERROR",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::Cancelled => "CANCELLED",
            Self::Database { .. } => "DATABASE_ERROR",
        }
    }
}
