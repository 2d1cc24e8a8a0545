// ABOUTME: Host-facing plugin lifecycle with origin and initialization guards
// ABOUTME: PostgresPlugin wires specifications, the executor, and the dispatch contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 pgexec contributors

//! # Plugin Lifecycle
//!
//! The engine registers a [`PostgresPlugin`], calls
//! [`initialize`](WorkflowPlugin::initialize) once with its specifications,
//! then drives it with [`execute`](WorkflowPlugin::execute) calls. Both entry
//! points verify the stamped call origin before anything else and fail
//! closed: executing before initialization, or arriving off the engine's
//! dispatch path, never reaches the database.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

use crate::config::{ConnectionSettings, Specifications};
use crate::errors::{PluginError, PluginResult};
use crate::executor::StatementExecutor;
use crate::protocol::{CallContext, CallOrigin, ExecutionResult, InvocationRequest, Operation};

/// Identity the plugin reports to the engine's registry.
#[derive(Debug, Clone, Serialize)]
pub struct PluginDescriptor {
    /// Registry name (must be unique within the engine)
    pub name: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Human-readable description
    pub description: &'static str,
}

/// Host-facing contract every engine plugin satisfies.
#[async_trait]
pub trait WorkflowPlugin: Send + Sync {
    /// Registry metadata.
    fn descriptor(&self) -> &PluginDescriptor;

    /// Receive static specifications. Must run before any
    /// [`execute`](WorkflowPlugin::execute) call.
    async fn initialize(
        &mut self,
        specifications: Specifications,
        ctx: &CallContext,
    ) -> PluginResult<()>;

    /// Run one invocation.
    async fn execute(
        &self,
        request: InvocationRequest,
        ctx: &CallContext,
    ) -> PluginResult<ExecutionResult>;
}

const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "postgresql",
    version: env!("CARGO_PKG_VERSION"),
    description: "Parameterized SQL queries and commands against PostgreSQL",
};

/// PostgreSQL statement-execution plugin.
pub struct PostgresPlugin {
    descriptor: PluginDescriptor,
    executor: Option<StatementExecutor>,
}

impl PostgresPlugin {
    /// A plugin awaiting initialization.
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: DESCRIPTOR,
            executor: None,
        }
    }

    /// Whether specifications have been supplied.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.executor.is_some()
    }

    fn executor(&self) -> PluginResult<&StatementExecutor> {
        self.executor.as_ref().ok_or(PluginError::NotInitialized)
    }

    async fn execute_inner(
        &self,
        request: &InvocationRequest,
        ctx: &CallContext,
    ) -> PluginResult<ExecutionResult> {
        let executor = self.executor()?;
        let operation = Operation::parse(&request.operation)?;
        if request.sql.trim().is_empty() {
            return Err(PluginError::validation(
                "sql statement text must not be empty",
            ));
        }
        executor.dispatch(operation, request, ctx).await
    }
}

impl Default for PostgresPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject calls that bypassed the engine's dispatch table, ahead of every
/// other check.
fn verify_origin(ctx: &CallContext) -> PluginResult<()> {
    match ctx.origin() {
        CallOrigin::Engine => Ok(()),
        CallOrigin::OutOfBand => Err(PluginError::AccessDenied),
    }
}

#[async_trait]
impl WorkflowPlugin for PostgresPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn initialize(
        &mut self,
        specifications: Specifications,
        ctx: &CallContext,
    ) -> PluginResult<()> {
        verify_origin(ctx)?;
        ctx.ensure_active()?;

        let settings = ConnectionSettings::from_raw(&specifications.connection_string)
            .inspect_err(|e| error!("initialization failed: {e}"))?;
        info!("initialized PostgreSQL plugin for {settings}");
        self.executor = Some(StatementExecutor::new(settings));
        Ok(())
    }

    async fn execute(
        &self,
        request: InvocationRequest,
        ctx: &CallContext,
    ) -> PluginResult<ExecutionResult> {
        verify_origin(ctx)?;
        ctx.ensure_active()?;

        let result = self.execute_inner(&request, ctx).await;
        if let Err(e) = &result {
            error!("execution failed: {e}");
        }
        result
    }
}
