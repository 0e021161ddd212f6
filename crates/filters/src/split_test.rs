//! Tests for the split filter

use super::*;
use serde_json::json;

fn event(value: serde_json::Value) -> Event {
    match value {
        serde_json::Value::Object(map) => Event::from(map),
        _ => unreachable!(),
    }
}

fn filter(yaml: &str) -> SplitFilter {
    let options: DriverOptions = serde_yaml::from_str(yaml).unwrap();
    SplitFilter::from_options(&options).unwrap()
}

#[test]
fn test_splits_into_named_keys() {
    let mut filter = filter("field: message\nseparator: ' '\nkeys: [verb, path, status]");
    let (out, success) = filter.filter(event(json!({"message": "GET /api 200"})));
    let out = out.unwrap();
    assert!(success);
    assert_eq!(out.get_str("verb"), Some("GET"));
    assert_eq!(out.get_str("path"), Some("/api"));
    assert_eq!(out.get_str("status"), Some("200"));
    // Source kept by default.
    assert_eq!(out.get_str("message"), Some("GET /api 200"));
}

#[test]
fn test_remove_drops_source() {
    let mut filter = filter("field: message\nseparator: ','\nkeys: [a, b]\nremove: true");
    let (out, success) = filter.filter(event(json!({"message": "x,y"})));
    let out = out.unwrap();
    assert!(success);
    assert_eq!(out.get("message"), None);
    assert_eq!(out.get_str("b"), Some("y"));
}

#[test]
fn test_extra_parts_are_ignored() {
    let mut filter = filter("field: message\nseparator: ' '\nkeys: [first]");
    let (out, success) = filter.filter(event(json!({"message": "a b c"})));
    assert!(success);
    assert_eq!(out.unwrap().get_str("first"), Some("a"));
}

#[test]
fn test_too_few_parts_fails() {
    let mut filter = filter("field: message\nseparator: ' '\nkeys: [a, b, c]");
    let (out, success) = filter.filter(event(json!({"message": "one two"})));
    assert!(!success);
    // The event forwards untouched for failTag handling.
    assert_eq!(out.unwrap().get("a"), None);
}

#[test]
fn test_missing_or_non_string_field_fails() {
    let mut filter = filter("field: message\nseparator: ' '\nkeys: [a]");
    let (_, success) = filter.filter(event(json!({})));
    assert!(!success);
    let (_, success) = filter.filter(event(json!({"message": 42})));
    assert!(!success);
}

#[test]
fn test_invalid_configs_rejected() {
    let bad_sep: DriverOptions =
        serde_yaml::from_str("field: m\nseparator: ''\nkeys: [a]").unwrap();
    assert!(SplitFilter::from_options(&bad_sep).is_err());

    let no_keys: DriverOptions = serde_yaml::from_str("field: m\nseparator: ','\nkeys: []").unwrap();
    assert!(SplitFilter::from_options(&no_keys).is_err());

    let missing_field: DriverOptions = serde_yaml::from_str("separator: ','\nkeys: [a]").unwrap();
    assert!(SplitFilter::from_options(&missing_field).is_err());
}
