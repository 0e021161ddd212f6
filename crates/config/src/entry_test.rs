//! Tests for stage entry parsing

use super::*;
use serde_json::json;

fn mapping(yaml: &str) -> serde_yaml::Mapping {
    serde_yaml::from_str(yaml).expect("test yaml parses")
}

#[test]
fn test_minimal_entry_with_null_options() {
    let entry = StageEntry::parse(StageKind::Input, mapping("stdin:")).unwrap();
    assert_eq!(entry.driver_type, "stdin");
    assert!(entry.options.is_empty());
    assert!(entry.common.conditions.is_empty());
    assert!(entry.batch.is_none());
}

#[test]
fn test_shared_options_are_peeled_off() {
    let entry = StageEntry::parse(
        StageKind::Filter,
        mapping(
            r#"
rename:
  if:
    - 'EQ(level, "debug")'
    - Exist(msg)
  add_fields:
    host.name: web-1
    retries: 3
  remove_fields: [raw]
  add_tags: [renamed]
  remove_tags: [pending]
  failTag: rename_failed
  fields:
    old: new
"#,
        ),
    )
    .unwrap();

    assert_eq!(entry.driver_type, "rename");
    assert_eq!(entry.common.conditions.len(), 2);
    assert_eq!(
        entry.common.add_fields,
        vec![
            ("host.name".to_string(), json!("web-1")),
            ("retries".to_string(), json!(3)),
        ]
    );
    assert_eq!(entry.common.remove_fields, vec!["raw"]);
    assert_eq!(entry.common.add_tags, vec!["renamed"]);
    assert_eq!(entry.common.remove_tags, vec!["pending"]);
    assert_eq!(entry.common.fail_tag.as_deref(), Some("rename_failed"));

    // Only the driver's own options remain.
    assert_eq!(entry.options.len(), 1);
    assert!(entry.options.contains_key("fields"));
}

#[test]
fn test_fail_tag_rejected_outside_filters() {
    for kind in [StageKind::Input, StageKind::Output] {
        let raw = mapping("stdin:\n  failTag: nope");
        let err = StageEntry::parse(kind, raw).unwrap_err();
        assert!(err.to_string().contains("failTag"), "got: {err}");
    }
}

#[test]
fn test_multi_key_entry_rejected() {
    let raw = mapping("stdin: {}\ntcp: {}");
    let err = StageEntry::parse(StageKind::Input, raw).unwrap_err();
    assert!(err.to_string().contains("single-key"), "got: {err}");
}

#[test]
fn test_batch_options_extracted_for_outputs() {
    let entry = StageEntry::parse(
        StageKind::Output,
        mapping(
            r#"
file:
  path: /var/log/out.jsonl
  batch_size: 100
  batch_bytes: 1048576
  batch_interval: 2s
  max_retries: 5
  retry_min_backoff: 100ms
  retry_max_backoff: 10s
  dead_letter:
    "null": {}
"#,
        ),
    )
    .unwrap();

    let batch = entry.batch.expect("outputs carry batch options");
    assert_eq!(batch.batch_size, 100);
    assert_eq!(batch.batch_bytes, Some(1_048_576));
    assert_eq!(batch.batch_interval, std::time::Duration::from_secs(2));
    assert_eq!(batch.max_retries, 5);
    assert_eq!(batch.retry_min_backoff, std::time::Duration::from_millis(100));
    assert_eq!(batch.retry_max_backoff, std::time::Duration::from_secs(10));
    let dl = batch.dead_letter.expect("dead letter configured");
    assert_eq!(dl.driver_type, "null");

    // The driver keeps its own options.
    assert!(entry.options.contains_key("path"));
    assert!(!entry.options.contains_key("batch_size"));
}

#[test]
fn test_batch_defaults() {
    let entry = StageEntry::parse(StageKind::Output, mapping("stdout: {}")).unwrap();
    let batch = entry.batch.unwrap();
    assert_eq!(batch.batch_size, 1);
    assert_eq!(batch.batch_bytes, None);
    assert_eq!(batch.max_retries, 3);
    assert!(batch.dead_letter.is_none());
}

#[test]
fn test_zero_batch_size_rejected() {
    let raw = mapping("stdout:\n  batch_size: 0");
    assert!(StageEntry::parse(StageKind::Output, raw).is_err());
}

#[test]
fn test_bad_duration_rejected() {
    let raw = mapping("stdout:\n  batch_interval: soonish");
    assert!(StageEntry::parse(StageKind::Output, raw).is_err());
}

#[test]
fn test_yaml_to_json_conversion() {
    let yaml: serde_yaml::Value = serde_yaml::from_str(
        r#"
s: text
i: -2
f: 0.5
b: true
n: null
seq: [1, two]
map:
  nested: ok
"#,
    )
    .unwrap();

    let json = yaml_to_json(yaml).unwrap();
    assert_eq!(
        json,
        json!({
            "s": "text",
            "i": -2,
            "f": 0.5,
            "b": true,
            "n": null,
            "seq": [1, "two"],
            "map": {"nested": "ok"},
        })
    );
}
