//! Patch types and the patch applier.
//!
//! A patch is a single path-addressed mutation sent by the server. Missing
//! intermediate containers are created on the way down: an `Index` step
//! creates a sequence, a `Key` step creates a map. The shape of the whole
//! path is checked before anything is written, so a rejected patch leaves
//! the tree untouched.

use serde_json::Value;
use thiserror::Error;

use crate::types::{format_keypath, Path, PathStep};

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// `Append` target exists but is not a sequence.
    #[error("ASSIGN_CONFLICT: `{}` is not a sequence", format_keypath(.path))]
    AssignConflict { path: Path },
    /// Step `step` of `path` cannot be resolved against the existing shape.
    #[error("INVALID_PATH: cannot resolve step {step} of `{}`", format_keypath(.path))]
    InvalidPath { path: Path, step: usize },
    /// Only a map may replace the whole tree.
    #[error("ROOT_NOT_MAP")]
    RootNotMap,
}

// ── Patch ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    Assign,
    Append,
}

impl PatchKind {
    /// Wire verb for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchKind::Assign => "set",
            PatchKind::Append => "push",
        }
    }
}

/// A single mutation of the state tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Set the value at `path`, overwriting whatever was there.
    Assign { path: Path, value: Value },
    /// Append `value` to the sequence at `path`.
    Append { path: Path, value: Value },
}

impl Patch {
    pub fn assign(path: impl Into<Path>, value: Value) -> Self {
        Patch::Assign { path: path.into(), value }
    }

    pub fn append(path: impl Into<Path>, value: Value) -> Self {
        Patch::Append { path: path.into(), value }
    }

    pub fn kind(&self) -> PatchKind {
        match self {
            Patch::Assign { .. } => PatchKind::Assign,
            Patch::Append { .. } => PatchKind::Append,
        }
    }

    pub fn path(&self) -> &[PathStep] {
        match self {
            Patch::Assign { path, .. } | Patch::Append { path, .. } => path,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Patch::Assign { value, .. } | Patch::Append { value, .. } => value,
        }
    }
}

// ── Shape check ───────────────────────────────────────────────────────────

/// Walks `path` without writing and reports the first step that could not
/// be resolved. `None` stands for a container that would be created.
fn check(doc: &Value, patch: &Patch) -> Result<(), PatchError> {
    let path = patch.path();
    let invalid = |step: usize| PatchError::InvalidPath { path: path.to_vec(), step };

    if path.is_empty() {
        return match patch {
            Patch::Assign { value, .. } if value.is_object() => Ok(()),
            Patch::Assign { .. } => Err(PatchError::RootNotMap),
            Patch::Append { .. } if doc.is_array() => Ok(()),
            Patch::Append { .. } => Err(PatchError::AssignConflict { path: Vec::new() }),
        };
    }

    let mut current: Option<&Value> = Some(doc);
    for (i, step) in path.iter().enumerate() {
        current = match (current, step) {
            (None | Some(Value::Null), PathStep::Key(_)) => None,
            (None | Some(Value::Null), PathStep::Index(0)) => None,
            (None | Some(Value::Null), PathStep::Index(_)) => return Err(invalid(i)),
            (Some(Value::Object(map)), PathStep::Key(key)) => map.get(key),
            (Some(Value::Array(arr)), PathStep::Index(idx)) if *idx <= arr.len() => arr.get(*idx),
            _ => return Err(invalid(i)),
        };
    }

    match (patch, current) {
        (Patch::Append { .. }, Some(target)) if !target.is_null() && !target.is_array() => {
            Err(PatchError::AssignConflict { path: path.to_vec() })
        }
        _ => Ok(()),
    }
}

/// Returns the slot at `path`, creating containers on the way. A slot that
/// did not exist yet holds `null`.
fn slot_mut<'a>(doc: &'a mut Value, path: &[PathStep]) -> Result<&'a mut Value, PatchError> {
    let mut current = doc;
    for (i, step) in path.iter().enumerate() {
        if current.is_null() {
            *current = step.empty_container();
        }
        current = match (current, step) {
            (Value::Object(map), PathStep::Key(key)) => {
                map.entry(key.clone()).or_insert(Value::Null)
            }
            (Value::Array(arr), PathStep::Index(idx)) => {
                if *idx == arr.len() {
                    arr.push(Value::Null);
                }
                match arr.get_mut(*idx) {
                    Some(slot) => slot,
                    None => return Err(PatchError::InvalidPath { path: path.to_vec(), step: i }),
                }
            }
            _ => return Err(PatchError::InvalidPath { path: path.to_vec(), step: i }),
        };
    }
    Ok(current)
}

// ── Apply ─────────────────────────────────────────────────────────────────

/// Apply a single patch to `doc` in place.
///
/// # Errors
///
/// - `PatchError::AssignConflict` if an `Append` target is not a sequence
/// - `PatchError::InvalidPath` if a step does not fit the existing shape
/// - `PatchError::RootNotMap` if the root would be replaced by a non-map
///
/// On error `doc` is unchanged.
///
/// # Example
///
/// ```
/// use corridors_state::{apply_patch, parse_keypath, Patch};
/// use serde_json::json;
///
/// let mut doc = json!({});
/// apply_patch(&mut doc, &Patch::assign(parse_keypath("board.turn"), json!("red"))).unwrap();
/// apply_patch(&mut doc, &Patch::append(parse_keypath("locations"), json!([2, 3]))).unwrap();
/// assert_eq!(doc, json!({"board": {"turn": "red"}, "locations": [[2, 3]]}));
/// ```
pub fn apply_patch(doc: &mut Value, patch: &Patch) -> Result<(), PatchError> {
    check(doc, patch)?;
    let slot = slot_mut(doc, patch.path())?;
    match patch {
        Patch::Assign { value, .. } => {
            *slot = value.clone();
            Ok(())
        }
        Patch::Append { path, value } => {
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            match slot {
                Value::Array(arr) => {
                    arr.push(value.clone());
                    Ok(())
                }
                _ => Err(PatchError::AssignConflict { path: path.clone() }),
            }
        }
    }
}

/// Apply patches in order, skipping the ones that fail.
///
/// Returns the index and error of every skipped patch.
pub fn apply_patches(doc: &mut Value, patches: &[Patch]) -> Vec<(usize, PatchError)> {
    patches
        .iter()
        .enumerate()
        .filter_map(|(i, patch)| apply_patch(doc, patch).err().map(|e| (i, e)))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────
