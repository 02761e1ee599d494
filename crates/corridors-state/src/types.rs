//! Path types for addressing values in the state tree.

use std::fmt;

use serde_json::Value;

use crate::validate::validate_path;
use crate::PathError;

/// A step in a state tree path.
///
/// `Key` addresses a map field, `Index` addresses a sequence element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// A state tree path, walked from the root.
pub type Path = Vec<PathStep>;

impl PathStep {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathStep::Key(k) => Some(k),
            PathStep::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathStep::Key(_) => None,
            PathStep::Index(i) => Some(*i),
        }
    }

    /// The empty container this step expects to walk into.
    pub(crate) fn empty_container(&self) -> Value {
        match self {
            PathStep::Key(_) => Value::Object(serde_json::Map::new()),
            PathStep::Index(_) => Value::Array(Vec::new()),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(k) => f.write_str(k),
            PathStep::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathStep {
    fn from(key: &str) -> Self {
        PathStep::Key(key.to_string())
    }
}

impl From<String> for PathStep {
    fn from(key: String) -> Self {
        PathStep::Key(key)
    }
}

impl From<usize> for PathStep {
    fn from(index: usize) -> Self {
        PathStep::Index(index)
    }
}

/// Check if a string represents a valid non-negative integer sequence index.
///
/// # Example
///
/// ```
/// use corridors_state::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("abc"));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Parse a dotted keypath into path steps.
///
/// Segments that look like sequence indices become [`PathStep::Index`].
///
/// # Example
///
/// ```
/// use corridors_state::{parse_keypath, PathStep};
///
/// assert!(parse_keypath("").is_empty());
/// assert_eq!(
///     parse_keypath("games.0.uuid"),
///     vec![PathStep::from("games"), PathStep::Index(0), PathStep::from("uuid")],
/// );
/// ```
pub fn parse_keypath(keypath: &str) -> Path {
    if keypath.is_empty() {
        return Vec::new();
    }
    keypath
        .split('.')
        .map(|segment| {
            if is_valid_index(segment) {
                match segment.parse() {
                    Ok(i) => PathStep::Index(i),
                    Err(_) => PathStep::Key(segment.to_string()),
                }
            } else {
                PathStep::Key(segment.to_string())
            }
        })
        .collect()
}

/// Format path steps as a dotted keypath.
///
/// ```
/// use corridors_state::{format_keypath, parse_keypath};
///
/// assert_eq!(format_keypath(&parse_keypath("current_game.board.turn")), "current_game.board.turn");
/// assert_eq!(format_keypath(&[]), "");
/// ```
pub fn format_keypath(path: &[PathStep]) -> String {
    let mut out = String::new();
    for (i, step) in path.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&step.to_string());
    }
    out
}

/// Read a path from its wire form.
///
/// The server writes either a dotted keypath string or an array of
/// string keys and non-negative integer indices.
///
/// # Errors
///
/// - `PathError::InvalidPath` if the value is neither a string nor an array
/// - `PathError::InvalidStep` if an array element is not a key or index
/// - `PathError::TooLong` if the path is deeper than the allowed maximum
pub fn path_from_json(value: &Value) -> Result<Path, PathError> {
    let path = match value {
        Value::String(keypath) => parse_keypath(keypath),
        Value::Array(steps) => steps
            .iter()
            .enumerate()
            .map(|(position, step)| match step {
                Value::String(key) => Ok(PathStep::Key(key.clone())),
                Value::Number(n) => n
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .map(PathStep::Index)
                    .ok_or(PathError::InvalidStep { position }),
                _ => Err(PathError::InvalidStep { position }),
            })
            .collect::<Result<Path, PathError>>()?,
        _ => return Err(PathError::InvalidPath),
    };
    validate_path(&path)?;
    Ok(path)
}

/// Convert a path to its array wire form.
pub fn path_to_json(path: &[PathStep]) -> Value {
    Value::Array(
        path.iter()
            .map(|step| match step {
                PathStep::Key(k) => Value::String(k.clone()),
                PathStep::Index(i) => Value::from(*i),
            })
            .collect(),
    )
}

/// Check if `prefix` is equal to, or an ancestor of, `path`.
///
/// ```
/// use corridors_state::{is_prefix, parse_keypath};
///
/// let game = parse_keypath("current_game");
/// assert!(is_prefix(&game, &parse_keypath("current_game.board.turn")));
/// assert!(is_prefix(&game, &game));
/// assert!(!is_prefix(&parse_keypath("current_game.board"), &game));
/// ```
pub fn is_prefix(prefix: &[PathStep], path: &[PathStep]) -> bool {
    prefix.len() <= path.len() && prefix.iter().zip(path).all(|(a, b)| a == b)
}
