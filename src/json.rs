use serde_json::Value;

use crate::error::Result;

/// Parses `text` into a generic JSON tree
pub fn try_parse_json(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Parses `text` into a generic JSON tree of maps, arrays and scalars,
/// which is handy when testing custom JSON readers.
///
/// # Panics
///
/// Panics if `text` is not valid JSON.
pub fn parse_json(text: &str) -> Value {
    match try_parse_json(text) {
        Ok(value) => value,
        Err(e) => panic!("invalid JSON {:?}: {}", text, e),
    }
}
