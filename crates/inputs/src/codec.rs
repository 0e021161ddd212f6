//! Line decoding shared by the built-in inputs

use chrono::{SecondsFormat, Utc};
use hauler_event::{Event, TIMESTAMP_FIELD};
use serde_json::Value;

/// Decode one raw line into an event.
///
/// A line parsing as a JSON object becomes the event; anything else is
/// wrapped as `{"message": line}`. Events without a timestamp get stamped
/// with the read time.
pub(crate) fn decode_line(line: &str) -> Event {
    let trimmed = line.trim_end_matches(['\r', '\n']);

    let mut event = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Event::from(map),
        _ => {
            let mut event = Event::new();
            event.set("message", trimmed);
            event
        }
    };

    if event.get(TIMESTAMP_FIELD).is_none() {
        event.set(
            TIMESTAMP_FIELD,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );
    }
    event
}
