// ABOUTME: Query and execute dispatch paths over one scoped connection per invocation
// ABOUTME: Binds parameters, runs statements through the driver, and shapes results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 pgexec contributors

//! # Statement Execution
//!
//! Each invocation opens its own connection, uses it for one statement (or
//! one batch loop), and releases it when the call scope ends. Pooling, if
//! any, belongs to the driver and the deployment, not this crate. Failures
//! propagate unretried; a failed batch row aborts the remaining rows.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgColumn, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, Postgres, Row, TypeInfo};
use tracing::info;
use uuid::Uuid;

use crate::config::ConnectionSettings;
use crate::errors::{PluginError, PluginResult};
use crate::params::BoundParameters;
use crate::protocol::{
    CallContext, ExecutionResult, InvocationRequest, Operation, QueryContext, ResultRow,
};
use crate::sql::NamedStatement;

/// Executes validated requests against the configured server.
#[derive(Debug, Clone)]
pub struct StatementExecutor {
    settings: ConnectionSettings,
}

impl StatementExecutor {
    /// Build an executor over parsed connection settings.
    #[must_use]
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }

    /// The settings this executor connects with.
    #[must_use]
    pub const fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Route a validated request down its operation path.
    pub async fn dispatch(
        &self,
        operation: Operation,
        request: &InvocationRequest,
        ctx: &CallContext,
    ) -> PluginResult<ExecutionResult> {
        match operation {
            Operation::Query => self.run_query(request, ctx).await.map(ExecutionResult::Rows),
            Operation::Execute => self
                .run_execute(request, ctx)
                .await
                .map(ExecutionResult::Affected),
        }
    }

    async fn connect(&self, ctx: &CallContext) -> PluginResult<PgConnection> {
        ctx.ensure_active()?;
        let connection = PgConnection::connect_with(&self.settings.connect_options()).await?;
        Ok(connection)
    }

    async fn run_query(
        &self,
        request: &InvocationRequest,
        ctx: &CallContext,
    ) -> PluginResult<QueryContext> {
        let statement = NamedStatement::parse(&request.sql);
        let params = BoundParameters::from_map(&request.params)?;
        let query = build_query(&statement, &params)?;

        let mut connection = self.connect(ctx).await?;
        ctx.ensure_active()?;
        let rows = query.fetch_all(&mut connection).await?;
        let shaped: Vec<ResultRow> = rows.iter().map(row_to_result_row).collect();

        let context = QueryContext::new(shaped);
        info!("query returned {} row(s)", context.row_count());
        Ok(context)
    }

    async fn run_execute(
        &self,
        request: &InvocationRequest,
        ctx: &CallContext,
    ) -> PluginResult<u64> {
        let statement = NamedStatement::parse(&request.sql);
        let mut affected: u64 = 0;

        if let Some(batch) = &request.data {
            let mut connection = self.connect(ctx).await?;
            // first failure aborts the remaining batch rows
            for row_params in &batch.rows {
                ctx.ensure_active()?;
                let params = BoundParameters::from_map(row_params)?;
                let outcome = build_query(&statement, &params)?
                    .execute(&mut connection)
                    .await?;
                affected += outcome.rows_affected();
            }
        } else {
            let params = BoundParameters::from_map(&request.params)?;
            let query = build_query(&statement, &params)?;
            let mut connection = self.connect(ctx).await?;
            ctx.ensure_active()?;
            let outcome = query.execute(&mut connection).await?;
            affected = outcome.rows_affected();
        }

        info!("statement affected {affected} row(s)");
        Ok(affected)
    }
}

/// Attach the statement's referenced parameters, in placeholder order.
fn build_query<'q>(
    statement: &'q NamedStatement,
    params: &BoundParameters,
) -> PluginResult<Query<'q, Postgres, PgArguments>> {
    let mut query = sqlx::query(statement.sql());
    for name in statement.names() {
        let value = params.get(name).ok_or_else(|| {
            PluginError::validation(format!("no value supplied for parameter '@{name}'"))
        })?;
        query = value.bind(query);
    }
    Ok(query)
}

fn row_to_result_row(row: &PgRow) -> ResultRow {
    let mut shaped = Map::new();
    for column in row.columns() {
        shaped.insert(column.name().to_owned(), decode_column(row, column));
    }
    shaped
}

/// Decode one column into a JSON value by the driver's reported type name.
/// NULLs and undecodable values become JSON null; types outside the table
/// fall back to a best-effort text decode.
fn decode_column(row: &PgRow, column: &PgColumn) -> Value {
    let index = column.ordinal();
    match column.type_info().name() {
        "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::from),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::from),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::from),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::from(f64::from(v))),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::from),
        "NUMERIC" => row
            .try_get::<Option<rust_decimal::Decimal>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::String(v.to_string())),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::String),
        "UUID" => row
            .try_get::<Option<Uuid>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::String(v.to_string())),
        "JSON" | "JSONB" => row
            .try_get::<Option<Value>, _>(index)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::String(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::String(v.to_string())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::String(v.to_string())),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::String(v.to_string())),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, |v| Value::String(BASE64.encode(v))),
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map_or(Value::Null, Value::String),
    }
}
