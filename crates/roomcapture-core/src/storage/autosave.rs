//! Automatic persistence of changed projects.
//!
//! The manager watches [`StoreEvent`]s, remembers which projects changed,
//! and writes their records once the save interval has elapsed.

use crate::events::StoreEvent;
use crate::model::ProjectId;
use crate::storage::{OwnerToken, ProjectStorage, StorageResult};
use crate::store::CaptureStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Saves dirty project records to a [`ProjectStorage`].
pub struct AutoSaveManager<S: ProjectStorage> {
    storage: Arc<S>,
    owner: OwnerToken,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: HashSet<ProjectId>,
    deleted: HashSet<ProjectId>,
}

impl<S: ProjectStorage> AutoSaveManager<S> {
    /// Create a manager persisting on behalf of `owner`.
    pub fn new(storage: Arc<S>, owner: OwnerToken) -> Self {
        Self {
            storage,
            owner,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: HashSet::new(),
            deleted: HashSet::new(),
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record changes drained from the store.
    pub fn observe(&mut self, events: &[StoreEvent]) {
        for event in events {
            let project = event.project();
            match event {
                // Loaded from storage, nothing new to write.
                StoreEvent::Restored { .. } => {}
                StoreEvent::ProjectDeleted { .. } => {
                    self.dirty.remove(&project);
                    self.deleted.insert(project);
                }
                _ => {
                    self.deleted.remove(&project);
                    self.dirty.insert(project);
                }
            }
        }
    }

    /// Mark a project as changed.
    pub fn mark_dirty(&mut self, project: ProjectId) {
        self.dirty.insert(project);
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty() || !self.deleted.is_empty()
    }

    /// Whether there are changes and the interval has elapsed.
    pub fn should_save(&self) -> bool {
        if !self.is_dirty() {
            return false;
        }

        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if [`should_save`](Self::should_save). Returns whether it did.
    pub async fn maybe_save(&mut self, store: &CaptureStore) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }

        self.save(store).await?;
        Ok(true)
    }

    /// Write every dirty project and delete every deleted one now.
    ///
    /// Projects that fail to save stay dirty for the next attempt.
    pub async fn save(&mut self, store: &CaptureStore) -> StorageResult<()> {
        let mut dirty: Vec<ProjectId> = self.dirty.iter().copied().collect();
        dirty.sort();
        for project in dirty {
            match store.record(project) {
                Some(record) => self.storage.save(&self.owner, &record).await?,
                None => log::debug!("Project {} vanished before save", project),
            }
            self.dirty.remove(&project);
        }

        let mut deleted: Vec<ProjectId> = self.deleted.iter().copied().collect();
        deleted.sort();
        for project in deleted {
            self.storage.delete(&self.owner, project).await?;
            self.deleted.remove(&project);
        }

        self.last_save = Some(Instant::now());
        Ok(())
    }

    /// Load every stored project into `store`. Returns how many were loaded.
    pub async fn load(&mut self, store: &mut CaptureStore) -> StorageResult<usize> {
        let records = self.storage.load_projects(&self.owner).await?;
        let count = records.len();
        store.restore(records);
        self.last_save = Some(Instant::now());
        log::info!("Loaded {} projects", count);
        Ok(count)
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
