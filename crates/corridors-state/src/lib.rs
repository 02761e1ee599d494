//! Path-addressed state tree for the Corridors client.
//!
//! The server owns the game state and streams it to the client as small
//! patches, each addressed by a path into a nested JSON tree. This crate
//! holds the path types, the patch applier and the [`StateTree`] that the
//! rest of the client reads from.
//!
//! # Example
//!
//! ```
//! use corridors_state::{parse_keypath, Patch, StateTree};
//! use serde_json::json;
//!
//! let mut tree = StateTree::new();
//! tree.apply(&Patch::assign(parse_keypath("game.players.red.name"), json!("Alice"))).unwrap();
//! tree.apply(&Patch::append(parse_keypath("game.locations"), json!([2, 3]))).unwrap();
//!
//! assert_eq!(tree.get_keypath("game.players.red.name"), Some(&json!("Alice")));
//! assert_eq!(tree.get_keypath("game.locations.0"), Some(&json!([2, 3])));
//! ```

use thiserror::Error;

pub mod types;
pub use types::{
    format_keypath, is_prefix, is_valid_index, parse_keypath, path_from_json, path_to_json, Path,
    PathStep,
};

pub mod validate;
pub use validate::{validate_path, MAX_PATH_LENGTH};

pub mod get;
pub use get::{get, get_keypath};

pub mod patch;
pub use patch::{apply_patch, apply_patches, Patch, PatchError, PatchKind};

pub mod tree;
pub use tree::StateTree;

/// Errors reading a path from its wire form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path")]
    InvalidPath,
    #[error("Invalid path step at position {position}")]
    InvalidStep { position: usize },
    #[error("Path too long: {len} steps")]
    TooLong { len: usize },
}
