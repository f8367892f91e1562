//! Validation of the enabled map received from the UI.
//!
//! This is the only fail-closed step of a build: any problem rejects the
//! whole map before the document is touched.
//!
//! Keys are sanitized (control and markup characters stripped, whitespace
//! collapsed) and values coerced to booleans. Accepted values:
//! - JSON booleans
//! - numbers (zero is false, anything else true)
//! - the strings `true`/`false`, `yes`/`no`, `on`/`off`, `1`/`0` and `""`

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::ValidationError;
use crate::limits::{MAX_ENABLED_KEYS, MAX_KEY_LEN};
use crate::model::EnabledMap;

/// Characters never allowed in a property key.
const STRIPPED_CHARS: &[char] = &['<', '>', '"', '\'', '`', '\\'];

/// Strips disallowed characters and collapses whitespace runs to one space.
pub fn sanitize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if c.is_control() || STRIPPED_CHARS.contains(&c) {
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

/// Reads a JSON value as a boolean, if it has an obvious boolean meaning.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" | "" => Some(false),
            _ => None,
        },
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validates a raw enabled map and returns its sanitized form.
pub fn validate_enabled_map(raw: &Value) -> Result<EnabledMap, ValidationError> {
    let Value::Object(entries) = raw else {
        return Err(ValidationError::NotAnObject {
            found: json_kind(raw),
        });
    };
    if entries.is_empty() {
        return Err(ValidationError::Empty);
    }
    if entries.len() > MAX_ENABLED_KEYS {
        return Err(ValidationError::TooManyKeys {
            count: entries.len(),
            max: MAX_ENABLED_KEYS,
        });
    }

    let mut seen: FxHashMap<String, &str> =
        FxHashMap::with_capacity_and_hasher(entries.len(), Default::default());
    let mut map = EnabledMap::new();
    for (raw_key, value) in entries {
        let key = sanitize_key(raw_key);
        if key.is_empty() {
            return Err(ValidationError::EmptyKey {
                raw: raw_key.clone(),
            });
        }
        let len = key.chars().count();
        if len > MAX_KEY_LEN {
            return Err(ValidationError::KeyTooLong {
                key,
                len,
                max: MAX_KEY_LEN,
            });
        }
        if let Some(first) = seen.get(&key) {
            return Err(ValidationError::DuplicateKey {
                first: first.to_string(),
                second: raw_key.clone(),
            });
        }
        let enabled = coerce_bool(value).ok_or_else(|| ValidationError::NotCoercible {
            key: key.clone(),
            found: value.to_string(),
        })?;
        seen.insert(key.clone(), raw_key);
        map.insert(key, enabled);
    }

    Ok(map)
}
