// ABOUTME: Smoke tests against a live PostgreSQL server
// ABOUTME: Skipped unless PGEXEC_TEST_DATABASE_URL points at a reachable database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 pgexec contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use pgexec_plugin::config::Specifications;
use pgexec_plugin::plugin::{PostgresPlugin, WorkflowPlugin};
use pgexec_plugin::protocol::{
    BatchPayload, CallContext, ExecutionResult, InvocationRequest,
};
use serde_json::json;
use uuid::Uuid;

/// Returns an initialized plugin, or `None` when no test database is
/// configured (the suite stays green without one).
///
/// URI connection strings get SSL forced to required; point the variable at
/// a key-value string (`Host=...;...`) for servers without TLS.
async fn live_plugin() -> Option<PostgresPlugin> {
    let url = std::env::var("PGEXEC_TEST_DATABASE_URL").ok()?;
    let mut plugin = PostgresPlugin::new();
    plugin
        .initialize(
            Specifications {
                connection_string: url,
            },
            &CallContext::engine(),
        )
        .await
        .unwrap();
    Some(plugin)
}

#[tokio::test]
async fn test_query_select_one_returns_a_single_row() {
    let Some(plugin) = live_plugin().await else {
        eprintln!("PGEXEC_TEST_DATABASE_URL not set; skipping");
        return;
    };

    let result = plugin
        .execute(
            InvocationRequest::query("SELECT 1 AS one"),
            &CallContext::engine(),
        )
        .await
        .unwrap();

    let ExecutionResult::Rows(context) = result else {
        panic!("query must produce rows");
    };
    assert_eq!(context.row_count(), 1);
    assert_eq!(context.rows[0].get("one"), Some(&json!(1)));
}

#[tokio::test]
async fn test_named_markers_round_trip() {
    let Some(plugin) = live_plugin().await else {
        eprintln!("PGEXEC_TEST_DATABASE_URL not set; skipping");
        return;
    };

    let request = InvocationRequest::query(
        "SELECT @label::text AS label, @count::int8 AS count, @count::int8 * 2 AS doubled",
    )
    .with_param("label", json!("answer"))
    .with_param("count", json!(21));
    let result = plugin.execute(request, &CallContext::engine()).await.unwrap();

    let ExecutionResult::Rows(context) = result else {
        panic!("query must produce rows");
    };
    let row = &context.rows[0];
    assert_eq!(row.get("label"), Some(&json!("answer")));
    assert_eq!(row.get("count"), Some(&json!(21)));
    assert_eq!(row.get("doubled"), Some(&json!(42)));
}

#[tokio::test]
async fn test_batched_execute_sums_affected_rows() {
    let Some(plugin) = live_plugin().await else {
        eprintln!("PGEXEC_TEST_DATABASE_URL not set; skipping");
        return;
    };
    let ctx = CallContext::engine();
    let table = format!("pgexec_smoke_{}", Uuid::new_v4().simple());

    plugin
        .execute(
            InvocationRequest::execute(format!("CREATE TABLE {table} (x int NOT NULL)")),
            &ctx,
        )
        .await
        .unwrap();

    let rows = (1..=3)
        .map(|x| {
            let mut row = serde_json::Map::new();
            row.insert("x".into(), json!(x));
            row
        })
        .collect();
    let result = plugin
        .execute(
            InvocationRequest::execute(format!("INSERT INTO {table} (x) VALUES (@x)"))
                .with_batch(BatchPayload::new(rows)),
            &ctx,
        )
        .await
        .unwrap();
    assert!(matches!(result, ExecutionResult::Affected(3)));

    let result = plugin
        .execute(
            InvocationRequest::query(format!("SELECT count(*) AS total FROM {table}")),
            &ctx,
        )
        .await
        .unwrap();
    let ExecutionResult::Rows(context) = result else {
        panic!("query must produce rows");
    };
    assert_eq!(context.rows[0].get("total"), Some(&json!(3)));

    plugin
        .execute(
            InvocationRequest::execute(format!("DROP TABLE {table}")),
            &ctx,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_constraint_violation_surfaces_as_database_error() {
    let Some(plugin) = live_plugin().await else {
        eprintln!("PGEXEC_TEST_DATABASE_URL not set; skipping");
        return;
    };
    let ctx = CallContext::engine();

    let err = plugin
        .execute(InvocationRequest::query("SELECT * FROM pgexec_no_such_table"), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "DATABASE_ERROR");
}
