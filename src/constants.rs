// ABOUTME: Shared constants used across the plugin modules
// ABOUTME: Default server port, the parameter marker character, and the service name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 pgexec contributors

//! Crate-wide constants.

/// Default PostgreSQL server port used when a connection URI omits one.
pub const DEFAULT_PORT: u16 = 5432;

/// Marker character carried by normalized parameter names (`@name`).
pub const PARAMETER_MARKER: char = '@';

/// Service name reported by the logging layer.
pub const SERVICE_NAME: &str = "pgexec-plugin";
