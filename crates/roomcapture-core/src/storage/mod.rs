//! Persistence collaborators.
//!
//! Two concerns live here: project records (the one-shot `save` /
//! `load_projects` persistence boundary) and drawing document bytes. Both are
//! traits so the capture store never depends on a particular backend.

mod autosave;
mod file;
mod memory;

pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::model::{DocumentRef, Drawing, DrawingId, Project, ProjectId, Room, Scan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque caller identity from the identity provider.
///
/// Only used to scope persistence calls; its contents are never inspected.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerToken(String);

impl OwnerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OwnerToken(..)")
    }
}

/// Everything persisted for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project: Project,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    #[serde(default)]
    pub active_drawing: Option<DrawingId>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub scans: Vec<Scan>,
}

impl ProjectRecord {
    pub fn id(&self) -> ProjectId {
        self.project.id
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Backend for project records.
pub trait ProjectStorage: Send + Sync {
    /// Save (create or replace) a project record.
    fn save(&self, owner: &OwnerToken, record: &ProjectRecord) -> BoxFuture<'_, StorageResult<()>>;

    /// Load every project record belonging to `owner`.
    fn load_projects(&self, owner: &OwnerToken) -> BoxFuture<'_, StorageResult<Vec<ProjectRecord>>>;

    /// Delete a project record. Deleting a missing record is not an error.
    fn delete(&self, owner: &OwnerToken, project: ProjectId) -> BoxFuture<'_, StorageResult<()>>;
}

/// Backend for drawing document bytes.
pub trait DocumentStorage: Send + Sync {
    /// Copy `bytes` into storage under `key`, replacing any previous content.
    fn put(&self, key: &str, bytes: &[u8]) -> BoxFuture<'_, StorageResult<DocumentRef>>;

    /// Read back stored bytes.
    fn read(&self, document: &DocumentRef) -> BoxFuture<'_, StorageResult<Vec<u8>>>;

    /// Remove stored bytes.
    fn remove(&self, document: &DocumentRef) -> BoxFuture<'_, StorageResult<()>>;
}
