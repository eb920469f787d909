//! Error taxonomy for capture operations.
//!
//! Every failure here is recoverable: the store is left unchanged and the
//! caller decides how to surface it.

use crate::model::RoomId;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors raised by [`CaptureStore`](crate::CaptureStore) and
/// [`CaptureSession`](crate::CaptureSession).
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Empty or otherwise invalid input.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// A scan targeted a room that is not in the store. Nothing was recorded.
    #[error("Room {room_id} does not exist; scan not recorded")]
    Orphan { room_id: RoomId },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// A session step was requested from the wrong state.
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CaptureError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;
