//! Structured claim parsing.
//!
//! Some sgID claims (household members, vehicles, ...) arrive as JSON
//! stringified arrays or objects. These helpers expand them.

use std::collections::BTreeMap;

use serde_json::Value;

use super::error::SgidError;

fn is_stringified_array_or_object(value: &str) -> bool {
    (value.starts_with('[') && value.ends_with(']')) || (value.starts_with('{') && value.ends_with('}'))
}

/// Parse a single claim value. Never fails: anything that is not a
/// bracket/brace-wrapped valid JSON document comes back as a JSON string.
pub fn parse_data_value(value: &str) -> Value {
    if is_stringified_array_or_object(value) {
        if let Ok(parsed) = serde_json::from_str::<Value>(value) {
            return parsed;
        }
    }
    Value::String(value.to_string())
}

/// Parse every value of a decrypted `data` map.
///
/// `data` must be a JSON object whose values are all strings.
pub fn parse_data(data: &Value) -> Result<BTreeMap<String, Value>, SgidError> {
    let map = data.as_object().ok_or(SgidError::InvalidUserinfoData)?;
    map.iter()
        .map(|(k, v)| {
            v.as_str()
                .map(|s| (k.clone(), parse_data_value(s)))
                .ok_or(SgidError::InvalidUserinfoData)
        })
        .collect()
}
