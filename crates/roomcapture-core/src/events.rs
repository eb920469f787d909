//! Change notifications emitted by the capture store.
//!
//! The store queues one event per entity change; consumers drain the queue
//! with [`CaptureStore::poll_events`](crate::CaptureStore::poll_events).
//! Cascading deletes emit an event for every removed descendant, children
//! first.

use crate::model::{DrawingId, ProjectId, RoomId, ScanId};

/// A single change to the capture hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ProjectCreated {
        project: ProjectId,
    },
    ProjectDeleted {
        project: ProjectId,
    },
    DrawingAdded {
        project: ProjectId,
        drawing: DrawingId,
    },
    DrawingRemoved {
        project: ProjectId,
        drawing: DrawingId,
    },
    ActiveDrawingChanged {
        project: ProjectId,
        drawing: Option<DrawingId>,
    },
    RoomCreated {
        project: ProjectId,
        drawing: DrawingId,
        room: RoomId,
    },
    RoomUpdated {
        project: ProjectId,
        drawing: DrawingId,
        room: RoomId,
    },
    RoomRemoved {
        project: ProjectId,
        drawing: DrawingId,
        room: RoomId,
    },
    ScanAdded {
        project: ProjectId,
        room: RoomId,
        scan: ScanId,
    },
    ScanUpdated {
        project: ProjectId,
        room: RoomId,
        scan: ScanId,
    },
    ScanRemoved {
        project: ProjectId,
        room: RoomId,
        scan: ScanId,
    },
    /// A project was replaced wholesale from its persisted record.
    Restored {
        project: ProjectId,
    },
}

impl StoreEvent {
    /// The project whose persisted record this event dirties.
    pub fn project(&self) -> ProjectId {
        match self {
            Self::ProjectCreated { project }
            | Self::ProjectDeleted { project }
            | Self::DrawingAdded { project, .. }
            | Self::DrawingRemoved { project, .. }
            | Self::ActiveDrawingChanged { project, .. }
            | Self::RoomCreated { project, .. }
            | Self::RoomUpdated { project, .. }
            | Self::RoomRemoved { project, .. }
            | Self::ScanAdded { project, .. }
            | Self::ScanUpdated { project, .. }
            | Self::ScanRemoved { project, .. }
            | Self::Restored { project } => *project,
        }
    }

    /// Whether the pins shown for `drawing` may have changed.
    pub fn affects_overlay(&self, drawing: DrawingId) -> bool {
        match self {
            Self::RoomCreated { drawing: d, .. }
            | Self::RoomUpdated { drawing: d, .. }
            | Self::RoomRemoved { drawing: d, .. }
            | Self::DrawingRemoved { drawing: d, .. } => *d == drawing,
            Self::Restored { .. } | Self::ProjectDeleted { .. } => true,
            _ => false,
        }
    }
}
