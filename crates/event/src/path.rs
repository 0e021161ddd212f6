//! Dotted-path resolution over JSON value trees
//!
//! Paths are dot-separated segments; a segment that parses as a decimal
//! number indexes into an array, anything else keys into an object. Writes
//! create missing intermediate objects but never auto-create through
//! non-mapping values, and never grow arrays.

use serde_json::{Map, Value};

/// Look up a value by dotted path.
pub fn get<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = root.get(first)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Write a value at a dotted path, creating missing intermediate objects.
///
/// Returns `false` (leaving the tree unchanged) when a path step hits a
/// scalar or an out-of-range array index.
pub fn set(root: &mut Map<String, Value>, path: &str, value: Value) -> bool {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return false;
    }

    let (leaf, parents) = match segments.split_last() {
        Some(split) => split,
        None => return false,
    };

    // Walk without mutating first: creating intermediates eagerly would leave
    // partial structure behind on a blocked path.
    if !write_path_exists(root, parents, leaf) {
        return false;
    }

    let mut current: &mut Value = {
        let first = segments[0];
        if segments.len() == 1 {
            root.insert(first.to_string(), value);
            return true;
        }
        root.entry(first.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
    };

    for segment in &parents[1..] {
        current = match current {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => match segment.parse::<usize>() {
                Ok(idx) if idx < items.len() => &mut items[idx],
                _ => return false,
            },
            _ => return false,
        };
    }

    match current {
        Value::Object(map) => {
            map.insert(leaf.to_string(), value);
            true
        }
        Value::Array(items) => match leaf.parse::<usize>() {
            Ok(idx) if idx < items.len() => {
                items[idx] = value;
                true
            }
            _ => false,
        },
        _ => false,
    }
}

/// Check that a write along `parents` + `leaf` would succeed without
/// touching the tree. Missing object keys are fine (they get created);
/// scalars and bad array indices block the write.
fn write_path_exists(root: &Map<String, Value>, parents: &[&str], leaf: &str) -> bool {
    let mut current: Option<&Value> = None;

    for segment in parents.iter() {
        let next = match current {
            None => root.get(*segment),
            Some(Value::Object(map)) => map.get(*segment),
            Some(Value::Array(items)) => match segment.parse::<usize>() {
                Ok(idx) if idx < items.len() => items.get(idx),
                _ => return false,
            },
            Some(_) => return false,
        };

        match next {
            Some(v) => current = Some(v),
            // Missing key in an object: the rest of the chain gets created
            // as objects, which always accepts the leaf.
            None => {
                return match current {
                    None | Some(Value::Object(_)) => true,
                    // Arrays never auto-create elements.
                    Some(_) => false,
                };
            }
        }
    }

    match current {
        None | Some(Value::Object(_)) => true,
        Some(Value::Array(items)) => matches!(leaf.parse::<usize>(), Ok(idx) if idx < items.len()),
        Some(_) => false,
    }
}

/// Remove and return the value at a dotted path.
pub fn remove(root: &mut Map<String, Value>, path: &str) -> Option<Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let (leaf, parents) = segments.split_last()?;

    if parents.is_empty() {
        return root.remove(*leaf);
    }

    let mut current = root.get_mut(parents[0])?;
    for segment in &parents[1..] {
        current = match current {
            Value::Object(map) => map.get_mut(*segment)?,
            Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    match current {
        Value::Object(map) => map.remove(*leaf),
        Value::Array(items) => match leaf.parse::<usize>() {
            Ok(idx) if idx < items.len() => Some(items.remove(idx)),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
#[path = "path_test.rs"]
mod tests;
