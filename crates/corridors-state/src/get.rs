use serde_json::Value;

use crate::types::{parse_keypath, PathStep};

/// Get a value from the tree by path.
///
/// Returns `None` if the path doesn't exist or walks through the wrong
/// kind of container.
pub fn get<'a>(val: &'a Value, path: &[PathStep]) -> Option<&'a Value> {
    let mut current = val;
    for step in path {
        current = match (current, step) {
            (Value::Object(map), PathStep::Key(key)) => map.get(key)?,
            (Value::Array(arr), PathStep::Index(idx)) => arr.get(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Get a value from the tree by dotted keypath.
pub fn get_keypath<'a>(val: &'a Value, keypath: &str) -> Option<&'a Value> {
    get(val, &parse_keypath(keypath))
}
