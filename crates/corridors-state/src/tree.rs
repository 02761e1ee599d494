//! The local mirror of server-authoritative state.

use std::fmt;

use serde_json::{Map, Value};

use crate::get::{get, get_keypath};
use crate::patch::{apply_patch, Patch, PatchError};
use crate::types::PathStep;

/// A JSON state tree mutated only through patches.
///
/// The root is always a map. Every successful patch bumps `revision`,
/// which is what observers compare to learn that the tree changed.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTree {
    root: Value,
    revision: u64,
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTree {
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
            revision: 0,
        }
    }

    /// Apply one patch and return the new revision.
    ///
    /// A failed patch leaves both the tree and the revision unchanged.
    pub fn apply(&mut self, patch: &Patch) -> Result<u64, PatchError> {
        apply_patch(&mut self.root, patch)?;
        self.revision += 1;
        Ok(self.revision)
    }

    /// Drop all synchronized state.
    ///
    /// The revision still moves forward so observers re-derive.
    pub fn reset(&mut self) {
        self.root = Value::Object(Map::new());
        self.revision += 1;
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.root.as_object().map_or(true, Map::is_empty)
    }

    pub fn get(&self, path: &[PathStep]) -> Option<&Value> {
        get(&self.root, path)
    }

    pub fn get_keypath(&self, keypath: &str) -> Option<&Value> {
        get_keypath(&self.root, keypath)
    }
}

impl fmt::Display for StateTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
