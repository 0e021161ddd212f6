//! Tests for the json filter

use super::*;
use serde_json::json;

fn event(value: serde_json::Value) -> Event {
    match value {
        serde_json::Value::Object(map) => Event::from(map),
        _ => unreachable!(),
    }
}

fn filter(yaml: &str) -> JsonFilter {
    let options: DriverOptions = serde_yaml::from_str(yaml).unwrap();
    JsonFilter::from_options(&options).unwrap()
}

#[test]
fn test_merges_object_at_root_by_default() {
    let mut filter = filter("{}");
    let input = event(json!({"message": r#"{"level": "info", "n": 1}"#, "host": "web-1"}));
    let (out, success) = filter.filter(input);
    let out = out.unwrap();
    assert!(success);
    assert_eq!(out.get_str("level"), Some("info"));
    assert_eq!(out.get("n"), Some(&json!(1)));
    assert_eq!(out.get_str("host"), Some("web-1"));
    // Source consumed.
    assert_eq!(out.get("message"), None);
}

#[test]
fn test_target_takes_any_json_value() {
    let mut filter = filter("field: payload\ntarget: parsed");
    let (out, success) = filter.filter(event(json!({"payload": "[1, 2, 3]"})));
    let out = out.unwrap();
    assert!(success);
    assert_eq!(out.get("parsed"), Some(&json!([1, 2, 3])));
    assert_eq!(out.get("payload"), None);
}

#[test]
fn test_preserve_keeps_source() {
    let mut filter = filter("preserve: true");
    let (out, success) = filter.filter(event(json!({"message": r#"{"a": 1}"#})));
    let out = out.unwrap();
    assert!(success);
    assert_eq!(out.get_str("message"), Some(r#"{"a": 1}"#));
    assert_eq!(out.get("a"), Some(&json!(1)));
}

#[test]
fn test_scalar_document_without_target_fails() {
    let mut filter = filter("{}");
    let input = event(json!({"message": "42"}));
    let (out, success) = filter.filter(input.clone());
    assert!(!success);
    assert_eq!(out.unwrap(), input);
}

#[test]
fn test_unparseable_or_missing_field_fails() {
    let mut filter = filter("{}");
    let (_, success) = filter.filter(event(json!({"message": "{not json"})));
    assert!(!success);
    let (_, success) = filter.filter(event(json!({})));
    assert!(!success);
    let (_, success) = filter.filter(event(json!({"message": 7})));
    assert!(!success);
}
