// ABOUTME: Unit tests for parameter value conversion and name normalization
// ABOUTME: Covers every supported kind, UUID auto-detection, and unsupported-type failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 pgexec contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{TimeZone, Utc};
use pgexec_plugin::errors::PluginError;
use pgexec_plugin::params::{normalize_name, BoundParameters, ParamValue};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use uuid::Uuid;

fn map_of(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_owned(), value.clone()))
        .collect()
}

#[test]
fn test_one_bound_parameter_per_supported_kind() {
    let params = map_of(&[
        ("count", json!(42)),
        ("ratio", json!(0.5)),
        ("label", json!("plain text")),
        ("key", json!("0d6c8a30-9a2b-4c4e-8f4e-2a6a1f9b1d11")),
        ("active", json!(true)),
        ("missing", Value::Null),
    ]);
    let bound = BoundParameters::from_map(&params).unwrap();
    assert_eq!(bound.len(), params.len());

    assert_eq!(bound.get("count"), Some(&ParamValue::Integer(42)));
    assert_eq!(bound.get("ratio"), Some(&ParamValue::Real(0.5)));
    assert_eq!(
        bound.get("label"),
        Some(&ParamValue::Text("plain text".to_owned()))
    );
    assert_eq!(bound.get("active"), Some(&ParamValue::Boolean(true)));
    assert_eq!(bound.get("missing"), Some(&ParamValue::Null));
}

#[test]
fn test_uuid_auto_detection_wins_over_text() {
    let id = "0d6c8a30-9a2b-4c4e-8f4e-2a6a1f9b1d11";
    let value = ParamValue::from_json("key", &json!(id)).unwrap();
    assert_eq!(value, ParamValue::Uuid(Uuid::parse_str(id).unwrap()));
}

#[test]
fn test_near_uuid_strings_stay_text() {
    let value = ParamValue::from_json("key", &json!("not-a-uuid-at-all")).unwrap();
    assert!(matches!(value, ParamValue::Text(_)));
}

#[test]
fn test_arrays_and_objects_are_unsupported() {
    for (value, expected_type) in [(json!([1, 2, 3]), "array"), (json!({"a": 1}), "object")] {
        let err = ParamValue::from_json("payload", &value).unwrap_err();
        match err {
            PluginError::UnsupportedParameterType { name, type_name } => {
                assert_eq!(name, "payload");
                assert_eq!(type_name, expected_type);
            }
            other => panic!("expected UnsupportedParameterType, got {other:?}"),
        }
    }
}

#[test]
fn test_unsupported_value_fails_the_whole_dictionary() {
    let params = map_of(&[("fine", json!(1)), ("broken", json!([true]))]);
    let err = BoundParameters::from_map(&params).unwrap_err();
    assert_eq!(err.code(), "TYPE_BINDING_ERROR");
}

#[test]
fn test_name_normalization_carries_one_marker() {
    assert_eq!(normalize_name("id"), "@id");
    assert_eq!(normalize_name("@id"), "@id");
    assert_eq!(normalize_name("@@id"), "@id");
    assert_eq!(normalize_name("  id "), "@id");
}

#[test]
fn test_lookup_accepts_marked_and_bare_names() {
    let params = map_of(&[("@id", json!(7))]);
    let bound = BoundParameters::from_map(&params).unwrap();
    assert_eq!(bound.get("id"), Some(&ParamValue::Integer(7)));
    assert_eq!(bound.get("@id"), Some(&ParamValue::Integer(7)));
    assert_eq!(bound.get("other"), None);
}

#[test]
fn test_native_constructors_cover_non_json_kinds() {
    let instant = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
    assert_eq!(
        ParamValue::from(instant),
        ParamValue::Timestamp(instant)
    );

    let amount = Decimal::new(12345, 2);
    assert_eq!(ParamValue::from(amount), ParamValue::Decimal(amount));

    let id = Uuid::new_v4();
    assert_eq!(ParamValue::from(id), ParamValue::Uuid(id));

    assert_eq!(ParamValue::from(true), ParamValue::Boolean(true));
    assert_eq!(ParamValue::from(9_i64), ParamValue::Integer(9));
    assert_eq!(ParamValue::from("text"), ParamValue::Text("text".into()));
}

#[test]
fn test_iteration_preserves_insertion_order() {
    let params = map_of(&[("b", json!(1)), ("a", json!(2)), ("c", json!(3))]);
    let bound = BoundParameters::from_map(&params).unwrap();
    let names: Vec<&str> = bound.iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["@b", "@a", "@c"]);
}
