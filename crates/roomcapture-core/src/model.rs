//! Entities of the capture hierarchy: Project → Drawing → Room → Scan.
//!
//! Instances are owned by [`CaptureStore`](crate::CaptureStore); everything
//! handed out to callers is a borrow or a clone.

use crate::coords::NormalizedPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh, never-before-used identity.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

entity_id!(
    /// Identity of a [`Project`].
    ProjectId
);
entity_id!(
    /// Identity of a [`Drawing`].
    DrawingId
);
entity_id!(
    /// Identity of a [`Room`].
    RoomId
);
entity_id!(
    /// Identity of a [`Scan`].
    ScanId
);

/// Key of a drawing's document bytes inside a
/// [`DocumentStorage`](crate::storage::DocumentStorage).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentRef(String);

impl DocumentRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Root of the hierarchy. Only ever created by an explicit user command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub foreman: String,
    pub created_at: DateTime<Utc>,
}

/// An imported floor-plan document belonging to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub id: DrawingId,
    pub project_id: ProjectId,
    pub name: String,
    /// Where the drawing's bytes live. Only this record reads or writes them.
    pub document: DocumentRef,
    pub created_at: DateTime<Utc>,
}

/// A physical location pinned on a drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub project_id: ProjectId,
    pub drawing_id: DrawingId,
    pub name: String,
    /// Pin position, always normalized.
    pub pin: NormalizedPoint,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn pin_x(&self) -> f64 {
        self.pin.x()
    }

    pub fn pin_y(&self) -> f64 {
        self.pin.y()
    }
}

/// A set of captured images recorded against a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub id: ScanId,
    pub project_id: ProjectId,
    pub room_id: RoomId,
    /// Image references in capture order. Never decoded here.
    pub image_file_names: Vec<String>,
    pub captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_complete: Option<bool>,
}
