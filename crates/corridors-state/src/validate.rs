//! Validation functions for state tree paths.

use crate::types::PathStep;
use crate::PathError;

/// Maximum allowed path depth.
pub const MAX_PATH_LENGTH: usize = 256;

/// Validate a path received from the wire.
///
/// # Errors
///
/// Returns `PathError::TooLong` if the path exceeds the maximum depth
/// (256 steps).
///
/// # Example
///
/// ```
/// use corridors_state::{parse_keypath, validate_path, PathStep};
///
/// validate_path(&parse_keypath("current_game.board.turn")).unwrap();
/// validate_path(&(0..300).map(PathStep::Index).collect::<Vec<_>>()).unwrap_err();
/// ```
pub fn validate_path(path: &[PathStep]) -> Result<(), PathError> {
    if path.len() > MAX_PATH_LENGTH {
        return Err(PathError::TooLong { len: path.len() });
    }
    Ok(())
}
