//! The two-step room capture flow: name a room at a point, then scan it.
//!
//! ```text
//! Idle ──placement──▶ AwaitingName ──name──▶ AwaitingScan ──scan──▶ Idle
//!   ▲                      │                      │
//!   └──────── cancel ──────┴──────────────────────┘
//! ```
//!
//! Cancelling before a name is accepted creates nothing. Cancelling after
//! leaves a room with no scans, which is valid. Image materialization is
//! tracked by a [`ScanTicket`]; a ticket from an abandoned session is
//! ignored so a late completion never records a scan.

use crate::coords::NormalizedPoint;
use crate::error::{CaptureError, CaptureResult};
use crate::model::{DrawingId, ProjectId, Room, RoomId, Scan};
use crate::pointer::CaptureEvent;
use crate::store::CaptureStore;

/// Where the capture flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    Idle,
    /// A point was chosen; waiting for the room's name.
    AwaitingName { point: NormalizedPoint },
    /// The room exists; waiting for a scan against it.
    AwaitingScan {
        room: RoomId,
        /// Generation of the in-flight capture, if one has started.
        capturing: Option<u64>,
    },
}

impl SessionState {
    fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingName { .. } => "awaiting a room name",
            Self::AwaitingScan { .. } => "awaiting a scan",
        }
    }
}

/// Handle for one in-flight image capture.
///
/// Hand it back to [`CaptureSession::complete_capture`] when the images are
/// ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTicket {
    room: RoomId,
    generation: u64,
}

impl ScanTicket {
    pub fn room(&self) -> RoomId {
        self.room
    }
}

/// Drives room creation and scanning on one drawing.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    project: ProjectId,
    drawing: DrawingId,
    state: SessionState,
    /// Bumped on every capture start and every abandonment.
    generation: u64,
}

impl CaptureSession {
    pub fn new(project: ProjectId, drawing: DrawingId) -> Self {
        Self {
            project,
            drawing,
            state: SessionState::Idle,
            generation: 0,
        }
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    pub fn drawing(&self) -> DrawingId {
        self.drawing
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The point awaiting a name, for showing a provisional marker.
    pub fn pending_point(&self) -> Option<NormalizedPoint> {
        match self.state {
            SessionState::AwaitingName { point } => Some(point),
            _ => None,
        }
    }

    /// Feed a pointer-resolved event. Returns `true` if the session reacted.
    pub fn handle_event(&mut self, event: &CaptureEvent) -> bool {
        match event {
            CaptureEvent::PlacementRequested(point) => {
                self.request_placement(*point);
                true
            }
            CaptureEvent::RoomSelected(_) => false,
        }
    }

    /// Start (or restart) a placement at `point`.
    ///
    /// Any pending name or scan is abandoned first.
    pub fn request_placement(&mut self, point: NormalizedPoint) {
        if !matches!(self.state, SessionState::Idle) {
            self.abandon();
        }
        self.state = SessionState::AwaitingName { point };
    }

    /// Name the pending placement, creating the room.
    ///
    /// A blank name is rejected and the session keeps waiting for a name.
    pub fn submit_name(&mut self, store: &mut CaptureStore, name: &str) -> CaptureResult<Room> {
        let SessionState::AwaitingName { point } = self.state else {
            return Err(self.invalid("name a room"));
        };
        if name.trim().is_empty() {
            return Err(CaptureError::Validation(
                "room name must not be empty".to_string(),
            ));
        }

        let room = store.create_room(self.project, self.drawing, name, point)?;
        self.state = SessionState::AwaitingScan {
            room: room.id,
            capturing: None,
        };
        Ok(room)
    }

    /// Begin capturing images for the room awaiting a scan.
    pub fn begin_capture(&mut self) -> CaptureResult<ScanTicket> {
        let SessionState::AwaitingScan { room, .. } = self.state else {
            return Err(self.invalid("start a capture"));
        };
        self.generation += 1;
        self.state = SessionState::AwaitingScan {
            room,
            capturing: Some(self.generation),
        };
        Ok(ScanTicket {
            room,
            generation: self.generation,
        })
    }

    /// Record the images of a finished capture.
    ///
    /// Returns `Ok(None)` without touching the store when the ticket belongs
    /// to an abandoned or superseded capture. Otherwise the session returns
    /// to idle whether or not the store accepted the scan.
    pub fn complete_capture(
        &mut self,
        store: &mut CaptureStore,
        ticket: ScanTicket,
        image_file_names: Vec<String>,
    ) -> CaptureResult<Option<Scan>> {
        let current = matches!(
            self.state,
            SessionState::AwaitingScan { room, capturing: Some(generation) }
                if room == ticket.room && generation == ticket.generation
        );
        if !current {
            log::debug!(
                "Suppressed completion of abandoned capture for room {}",
                ticket.room
            );
            return Ok(None);
        }

        self.state = SessionState::Idle;
        store
            .add_scan(self.project, ticket.room, image_file_names)
            .map(Some)
    }

    /// Abandon whatever is pending. The store is never modified.
    pub fn cancel(&mut self) {
        self.abandon();
        self.state = SessionState::Idle;
    }

    fn abandon(&mut self) {
        if let SessionState::AwaitingScan { room, .. } = self.state {
            log::debug!("Abandoned capture for room {}", room);
        }
        self.generation += 1;
    }

    fn invalid(&self, action: &'static str) -> CaptureError {
        CaptureError::InvalidTransition {
            action,
            state: self.state.label(),
        }
    }
}
