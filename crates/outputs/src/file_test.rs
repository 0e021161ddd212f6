//! Tests for the file output

use super::*;
use serde_json::json;

fn event(value: serde_json::Value) -> Event {
    match value {
        serde_json::Value::Object(map) => Event::from(map),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_appends_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.jsonl");
    let mut output = FileOutput::new(FileOutputConfig { path: path.clone() });

    assert!(output.emit(&[event(json!({"n": 1}))]).await);
    assert!(output.emit(&[event(json!({"n": 2})), event(json!({"n": 3}))]).await);
    output.shutdown().await;

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(lines[2]).unwrap(),
        json!({"n": 3})
    );
}

#[tokio::test]
async fn test_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/out.jsonl");
    let mut output = FileOutput::new(FileOutputConfig { path: path.clone() });

    assert!(output.emit(&[event(json!({"ok": true}))]).await);
    output.shutdown().await;
    assert!(path.exists());
}

#[tokio::test]
async fn test_unwritable_path_reports_failure() {
    let mut output = FileOutput::new(FileOutputConfig {
        // A path under a file, not a directory.
        path: PathBuf::from("/dev/null/sub/out.jsonl"),
    });
    assert!(!output.emit(&[event(json!({"n": 1}))]).await);
}

#[tokio::test]
async fn test_missing_path_option_rejected() {
    let options: DriverOptions = serde_yaml::from_str("{}").unwrap();
    assert!(FileOutput::from_options(&options).is_err());
}
