//! RoomCapture Core Library
//!
//! The capture hierarchy (Project → Drawing → Room → Scan) and the engine
//! that keeps room pins on a floor-plan document in sync with it.

pub mod config;
pub mod coords;
pub mod error;
pub mod events;
pub mod model;
pub mod overlay;
pub mod pointer;
pub mod session;
pub mod storage;
pub mod store;
pub mod viewer;

pub use config::{CaptureConfig, ConfigError};
pub use coords::{NormalizedPoint, to_normalized, to_pointer};
pub use error::{CaptureError, CaptureResult};
pub use events::StoreEvent;
pub use model::{
    DocumentRef, Drawing, DrawingId, Project, ProjectId, Room, RoomId, Scan, ScanId,
};
pub use overlay::{OverlayPatch, OverlayReconciler, reconcile};
pub use pointer::{
    CaptureEvent, GestureRecognizer, Interaction, PointerCoordinator, PointerEvent, RawPointer,
};
pub use session::{CaptureSession, ScanTicket, SessionState};
pub use storage::{
    AutoSaveManager, DocumentStorage, FileStorage, MemoryStorage, OwnerToken, ProjectRecord,
    ProjectStorage, StorageError, StorageResult,
};
pub use store::{CaptureStore, ProjectReport, RoomReport};
pub use viewer::{DocumentViewer, MarkerTag, MemoryViewer};
