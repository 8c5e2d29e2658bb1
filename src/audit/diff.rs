//! Diff generation for audit logging
//!
//! Produces a one-line summary of the fields that changed between two JSON
//! states. Nested objects (category maps, global settings) are walked so the
//! summary names the exact field, e.g. `categories.Groceries.monthly_limit`.

use serde_json::{Map, Value};

/// Bookkeeping fields that change on every write and carry no information
const IGNORED_FIELDS: &[&str] = &["updated_at"];

const MAX_STRING_LEN: usize = 50;

/// Generate a human-readable diff between two JSON values
///
/// Returns `None` when nothing but ignored fields changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let mut changes = Vec::new();
    collect_changes(before, after, "", &mut changes);

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn collect_changes(before: &Value, after: &Value, prefix: &str, changes: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            collect_object_changes(before_obj, after_obj, prefix, changes)
        }
        _ if before != after => changes.push(format!(
            "{}{} -> {}",
            label(prefix),
            format_value(before),
            format_value(after)
        )),
        _ => {}
    }
}

fn collect_object_changes(
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    prefix: &str,
    changes: &mut Vec<String>,
) {
    for (key, before_val) in before {
        if prefix.is_empty() && IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let path = join(prefix, key);
        match after.get(key) {
            Some(after_val) => collect_changes(before_val, after_val, &path, changes),
            None => changes.push(format!("{}: {} -> (removed)", path, format_value(before_val))),
        }
    }

    for (key, after_val) in after {
        if !before.contains_key(key) {
            changes.push(format!(
                "{}: (added) -> {}",
                join(prefix, key),
                format_value(after_val)
            ));
        }
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn label(prefix: &str) -> String {
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{}: ", prefix)
    }
}

/// Format a JSON value for human-readable display
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > MAX_STRING_LEN => {
            let truncated: String = s.chars().take(MAX_STRING_LEN - 3).collect();
            format!("\"{}...\"", truncated)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
