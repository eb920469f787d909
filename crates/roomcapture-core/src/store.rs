//! The capture store: authoritative owner of projects, drawings, rooms and scans.

use crate::coords::NormalizedPoint;
use crate::error::{CaptureError, CaptureResult};
use crate::events::StoreEvent;
use crate::model::{Drawing, DrawingId, Project, ProjectId, Room, RoomId, Scan, ScanId};
use crate::storage::{DocumentStorage, ProjectRecord};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Per-room line of a [`ProjectReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RoomReport {
    pub room: Room,
    pub drawing_name: String,
    pub scan_count: usize,
    pub image_count: usize,
}

/// Summary of everything captured in a project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectReport {
    pub project: Project,
    /// Rooms in creation order.
    pub rooms: Vec<RoomReport>,
}

impl ProjectReport {
    pub fn total_scans(&self) -> usize {
        self.rooms.iter().map(|r| r.scan_count).sum()
    }
}

/// Owns the capture hierarchy and every mutation of it.
///
/// All writes go through `&mut self`, so there is exactly one writer at a
/// time. Queries are side-effect free. Every change is queued as a
/// [`StoreEvent`] for [`poll_events`](Self::poll_events).
pub struct CaptureStore {
    /// Most recently created first.
    projects: Vec<Project>,
    drawings: Vec<Drawing>,
    rooms: Vec<Room>,
    scans: Vec<Scan>,
    active_drawings: HashMap<ProjectId, DrawingId>,
    documents: Arc<dyn DocumentStorage>,
    events: Vec<StoreEvent>,
}

impl CaptureStore {
    /// Create an empty store whose drawing bytes live in `documents`.
    pub fn new(documents: Arc<dyn DocumentStorage>) -> Self {
        Self {
            projects: Vec::new(),
            drawings: Vec::new(),
            rooms: Vec::new(),
            scans: Vec::new(),
            active_drawings: HashMap::new(),
            documents,
            events: Vec::new(),
        }
    }

    /// The backend holding drawing bytes.
    pub fn documents(&self) -> &Arc<dyn DocumentStorage> {
        &self.documents
    }

    /// Drain queued change notifications, oldest first.
    pub fn poll_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// Create a project and place it at the head of the project list.
    pub fn create_project(&mut self, name: &str, foreman: &str) -> CaptureResult<Project> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CaptureError::Validation(
                "project name must not be empty".to_string(),
            ));
        }

        let project = Project {
            id: ProjectId::generate(),
            name: name.to_string(),
            foreman: foreman.trim().to_string(),
            created_at: Utc::now(),
        };
        self.projects.insert(0, project.clone());
        self.events.push(StoreEvent::ProjectCreated {
            project: project.id,
        });
        log::info!("Created project {} ({})", project.name, project.id);
        Ok(project)
    }

    /// Projects, most recently created first.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Delete a project and everything beneath it.
    ///
    /// Document bytes are removed best-effort, as in
    /// [`delete_drawing`](Self::delete_drawing).
    pub async fn delete_project(&mut self, project: ProjectId) -> CaptureResult<()> {
        if self.project(project).is_none() {
            return Err(CaptureError::not_found("Project", project));
        }

        let drawing_ids: Vec<DrawingId> = self.drawings_of(project).iter().map(|d| d.id).collect();
        for drawing in drawing_ids {
            self.delete_drawing(drawing).await?;
        }

        self.projects.retain(|p| p.id != project);
        self.active_drawings.remove(&project);
        self.events.push(StoreEvent::ProjectDeleted { project });
        log::info!("Deleted project {}", project);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Drawings
    // ------------------------------------------------------------------

    /// Import a drawing by copying `source` into drawing-scoped storage.
    ///
    /// The record is appended only after the copy succeeds; a failed copy
    /// leaves the store untouched. The first drawing of a project with no
    /// active drawing becomes active.
    pub async fn add_drawing(
        &mut self,
        source: &[u8],
        name: &str,
        project: ProjectId,
    ) -> CaptureResult<Drawing> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CaptureError::Validation(
                "drawing name must not be empty".to_string(),
            ));
        }
        if self.project(project).is_none() {
            return Err(CaptureError::not_found("Project", project));
        }

        let id = DrawingId::generate();
        let documents = Arc::clone(&self.documents);
        let document = documents.put(&id.to_string(), source).await?;

        let drawing = Drawing {
            id,
            project_id: project,
            name: name.to_string(),
            document,
            created_at: Utc::now(),
        };
        self.drawings.push(drawing.clone());
        self.events.push(StoreEvent::DrawingAdded {
            project,
            drawing: id,
        });
        log::info!(
            "Imported drawing {} ({} bytes) into project {}",
            drawing.name,
            source.len(),
            project
        );

        if !self.active_drawings.contains_key(&project) {
            self.active_drawings.insert(project, id);
            self.events.push(StoreEvent::ActiveDrawingChanged {
                project,
                drawing: Some(id),
            });
        }
        Ok(drawing)
    }

    /// Delete a drawing, its rooms, and their scans.
    ///
    /// The domain removal always completes. Failing to remove the stored
    /// bytes afterwards is logged, not returned.
    pub async fn delete_drawing(&mut self, drawing: DrawingId) -> CaptureResult<()> {
        let Some(index) = self.drawings.iter().position(|d| d.id == drawing) else {
            return Err(CaptureError::not_found("Drawing", drawing));
        };

        let room_ids: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|r| r.drawing_id == drawing)
            .map(|r| r.id)
            .collect();
        for room in room_ids {
            self.remove_room(room);
        }

        let removed = self.drawings.remove(index);
        self.events.push(StoreEvent::DrawingRemoved {
            project: removed.project_id,
            drawing,
        });
        if self.active_drawings.get(&removed.project_id) == Some(&drawing) {
            self.active_drawings.remove(&removed.project_id);
            self.events.push(StoreEvent::ActiveDrawingChanged {
                project: removed.project_id,
                drawing: None,
            });
        }
        log::info!("Deleted drawing {} ({})", removed.name, drawing);

        let documents = Arc::clone(&self.documents);
        if let Err(e) = documents.remove(&removed.document).await {
            log::warn!(
                "Failed to remove document {} for deleted drawing {}: {}",
                removed.document,
                drawing,
                e
            );
        }
        Ok(())
    }

    pub fn drawing(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id == id)
    }

    /// Drawings of a project, in import order.
    pub fn drawings_of(&self, project: ProjectId) -> Vec<&Drawing> {
        self.drawings
            .iter()
            .filter(|d| d.project_id == project)
            .collect()
    }

    /// Make `drawing` the capture target of `project`.
    pub fn set_active_drawing(
        &mut self,
        project: ProjectId,
        drawing: DrawingId,
    ) -> CaptureResult<()> {
        let Some(found) = self.drawing(drawing) else {
            return Err(CaptureError::not_found("Drawing", drawing));
        };
        if found.project_id != project {
            return Err(CaptureError::Validation(format!(
                "drawing {} does not belong to project {}",
                drawing, project
            )));
        }

        if self.active_drawings.insert(project, drawing) != Some(drawing) {
            self.events.push(StoreEvent::ActiveDrawingChanged {
                project,
                drawing: Some(drawing),
            });
        }
        Ok(())
    }

    /// The drawing currently targeted for capture in `project`, if any.
    pub fn active_drawing(&self, project: ProjectId) -> Option<&Drawing> {
        self.active_drawings
            .get(&project)
            .and_then(|id| self.drawing(*id))
    }

    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// Pin a new room on `drawing`.
    ///
    /// The drawing must exist and belong to `project`.
    pub fn create_room(
        &mut self,
        project: ProjectId,
        drawing: DrawingId,
        name: &str,
        pin: NormalizedPoint,
    ) -> CaptureResult<Room> {
        let name = validate_room_name(name)?;
        if self.project(project).is_none() {
            return Err(CaptureError::not_found("Project", project));
        }
        let Some(found) = self.drawing(drawing) else {
            return Err(CaptureError::not_found("Drawing", drawing));
        };
        if found.project_id != project {
            return Err(CaptureError::Validation(format!(
                "drawing {} does not belong to project {}",
                drawing, project
            )));
        }

        let room = Room {
            id: RoomId::generate(),
            project_id: project,
            drawing_id: drawing,
            name,
            pin,
            created_at: Utc::now(),
        };
        self.rooms.push(room.clone());
        self.events.push(StoreEvent::RoomCreated {
            project,
            drawing,
            room: room.id,
        });
        log::info!(
            "Created room {} at ({:.4}, {:.4}) on drawing {}",
            room.name,
            pin.x(),
            pin.y(),
            drawing
        );
        Ok(room)
    }

    pub fn rename_room(&mut self, room: RoomId, name: &str) -> CaptureResult<Room> {
        let name = validate_room_name(name)?;
        self.update_room(room, |r| r.name = name)
    }

    pub fn move_room(&mut self, room: RoomId, pin: NormalizedPoint) -> CaptureResult<Room> {
        self.update_room(room, |r| r.pin = pin)
    }

    fn update_room(&mut self, room: RoomId, edit: impl FnOnce(&mut Room)) -> CaptureResult<Room> {
        let Some(found) = self.rooms.iter_mut().find(|r| r.id == room) else {
            return Err(CaptureError::not_found("Room", room));
        };
        edit(found);
        let updated = found.clone();
        self.events.push(StoreEvent::RoomUpdated {
            project: updated.project_id,
            drawing: updated.drawing_id,
            room,
        });
        Ok(updated)
    }

    /// Delete a room and all of its scans.
    pub fn delete_room(&mut self, room: RoomId) -> CaptureResult<()> {
        if self.remove_room(room) {
            Ok(())
        } else {
            Err(CaptureError::not_found("Room", room))
        }
    }

    fn remove_room(&mut self, room: RoomId) -> bool {
        let Some(index) = self.rooms.iter().position(|r| r.id == room) else {
            return false;
        };

        let events = &mut self.events;
        self.scans.retain(|scan| {
            if scan.room_id != room {
                return true;
            }
            events.push(StoreEvent::ScanRemoved {
                project: scan.project_id,
                room,
                scan: scan.id,
            });
            false
        });

        let removed = self.rooms.remove(index);
        self.events.push(StoreEvent::RoomRemoved {
            project: removed.project_id,
            drawing: removed.drawing_id,
            room,
        });
        log::info!("Deleted room {} ({})", removed.name, room);
        true
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    /// Rooms pinned on a drawing, in creation order.
    pub fn rooms_of(&self, drawing: DrawingId) -> Vec<&Room> {
        self.rooms
            .iter()
            .filter(|r| r.drawing_id == drawing)
            .collect()
    }

    /// Rooms of a project across all its drawings, in creation order.
    pub fn rooms_in_project(&self, project: ProjectId) -> Vec<&Room> {
        self.rooms
            .iter()
            .filter(|r| r.project_id == project)
            .collect()
    }

    // ------------------------------------------------------------------
    // Scans
    // ------------------------------------------------------------------

    /// Record a scan captured now.
    ///
    /// Returns [`CaptureError::Orphan`] without recording anything when
    /// `room` is not currently in the store.
    pub fn add_scan(
        &mut self,
        project: ProjectId,
        room: RoomId,
        image_file_names: Vec<String>,
    ) -> CaptureResult<Scan> {
        self.add_scan_at(project, room, image_file_names, Utc::now())
    }

    /// Record a scan with an explicit capture time.
    pub fn add_scan_at(
        &mut self,
        project: ProjectId,
        room: RoomId,
        image_file_names: Vec<String>,
        captured_at: DateTime<Utc>,
    ) -> CaptureResult<Scan> {
        let Some(found) = self.room(room) else {
            log::warn!("Rejected scan for missing room {}", room);
            return Err(CaptureError::Orphan { room_id: room });
        };
        if found.project_id != project {
            return Err(CaptureError::Validation(format!(
                "room {} does not belong to project {}",
                room, project
            )));
        }

        let scan = Scan {
            id: ScanId::generate(),
            project_id: project,
            room_id: room,
            image_file_names,
            captured_at,
            coverage_complete: None,
        };
        self.scans.push(scan.clone());
        self.events.push(StoreEvent::ScanAdded {
            project,
            room,
            scan: scan.id,
        });
        log::info!(
            "Recorded scan {} with {} images in room {}",
            scan.id,
            scan.image_file_names.len(),
            room
        );
        Ok(scan)
    }

    /// Mark whether a scan covers its whole room.
    pub fn set_coverage_complete(&mut self, scan: ScanId, complete: bool) -> CaptureResult<Scan> {
        let Some(found) = self.scans.iter_mut().find(|s| s.id == scan) else {
            return Err(CaptureError::not_found("Scan", scan));
        };
        found.coverage_complete = Some(complete);
        let updated = found.clone();
        self.events.push(StoreEvent::ScanUpdated {
            project: updated.project_id,
            room: updated.room_id,
            scan,
        });
        Ok(updated)
    }

    pub fn scan(&self, id: ScanId) -> Option<&Scan> {
        self.scans.iter().find(|s| s.id == id)
    }

    /// Scans of a room, oldest capture first.
    ///
    /// Scans with equal timestamps keep their insertion order. A room that
    /// does not exist has no scans.
    pub fn scans_of(&self, room: RoomId) -> Vec<&Scan> {
        let mut scans: Vec<&Scan> = self.scans.iter().filter(|s| s.room_id == room).collect();
        scans.sort_by_key(|s| s.captured_at);
        scans
    }

    /// Total number of scans held.
    pub fn scan_count(&self) -> usize {
        self.scans.len()
    }

    // ------------------------------------------------------------------
    // Reports and persistence
    // ------------------------------------------------------------------

    /// Per-room scan and image counts for a project.
    pub fn report(&self, project: ProjectId) -> CaptureResult<ProjectReport> {
        let Some(found) = self.project(project) else {
            return Err(CaptureError::not_found("Project", project));
        };

        let rooms = self
            .rooms_in_project(project)
            .into_iter()
            .map(|room| {
                let scans = self.scans_of(room.id);
                RoomReport {
                    room: room.clone(),
                    drawing_name: self
                        .drawing(room.drawing_id)
                        .map(|d| d.name.clone())
                        .unwrap_or_default(),
                    scan_count: scans.len(),
                    image_count: scans.iter().map(|s| s.image_file_names.len()).sum(),
                }
            })
            .collect();

        Ok(ProjectReport {
            project: found.clone(),
            rooms,
        })
    }

    /// Snapshot a project and everything beneath it for persistence.
    pub fn record(&self, project: ProjectId) -> Option<ProjectRecord> {
        let found = self.project(project)?;
        Some(ProjectRecord {
            project: found.clone(),
            drawings: self.drawings_of(project).into_iter().cloned().collect(),
            active_drawing: self.active_drawings.get(&project).copied(),
            rooms: self.rooms_in_project(project).into_iter().cloned().collect(),
            scans: self
                .scans
                .iter()
                .filter(|s| s.project_id == project)
                .cloned()
                .collect(),
        })
    }

    /// Load persisted records, replacing any in-memory project with the same id.
    ///
    /// Entities that would violate the hierarchy (a room on a foreign or
    /// missing drawing, a scan whose room is gone) are dropped with a warning.
    pub fn restore(&mut self, records: Vec<ProjectRecord>) {
        for record in records {
            let project = record.id();
            self.forget_project(project);

            let drawing_ids: HashSet<DrawingId> = record
                .drawings
                .iter()
                .filter(|d| d.project_id == project)
                .map(|d| d.id)
                .collect();
            let rooms: Vec<Room> = record
                .rooms
                .into_iter()
                .filter(|r| {
                    let keep = r.project_id == project && drawing_ids.contains(&r.drawing_id);
                    if !keep {
                        log::warn!("Dropping room {} with no drawing in project {}", r.id, project);
                    }
                    keep
                })
                .collect();
            let room_ids: HashSet<RoomId> = rooms.iter().map(|r| r.id).collect();
            let scans = record.scans.into_iter().filter(|s| {
                let keep = s.project_id == project && room_ids.contains(&s.room_id);
                if !keep {
                    log::warn!("Dropping orphaned scan {} in project {}", s.id, project);
                }
                keep
            });

            self.drawings.extend(
                record
                    .drawings
                    .into_iter()
                    .filter(|d| drawing_ids.contains(&d.id)),
            );
            self.rooms.extend(rooms);
            self.scans.extend(scans);
            if let Some(active) = record.active_drawing.filter(|d| drawing_ids.contains(d)) {
                self.active_drawings.insert(project, active);
            }

            let at = self
                .projects
                .iter()
                .position(|p| p.created_at < record.project.created_at)
                .unwrap_or(self.projects.len());
            self.projects.insert(at, record.project);
            self.events.push(StoreEvent::Restored { project });
        }
    }

    /// Drop a project from memory without touching storage.
    fn forget_project(&mut self, project: ProjectId) {
        self.projects.retain(|p| p.id != project);
        self.drawings.retain(|d| d.project_id != project);
        self.rooms.retain(|r| r.project_id != project);
        self.scans.retain(|s| s.project_id != project);
        self.active_drawings.remove(&project);
    }
}

fn validate_room_name(name: &str) -> CaptureResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CaptureError::Validation(
            "room name must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentRef;
    use crate::storage::{BoxFuture, MemoryStorage, StorageError, StorageResult};
    use chrono::Duration;
    use pollster::block_on;

    /// Document storage where every operation fails.
    struct BrokenDocuments;

    impl DocumentStorage for BrokenDocuments {
        fn put(&self, _key: &str, _bytes: &[u8]) -> BoxFuture<'_, StorageResult<DocumentRef>> {
            Box::pin(async { Err(StorageError::Io("No space left on device".to_string())) })
        }

        fn read(&self, _document: &DocumentRef) -> BoxFuture<'_, StorageResult<Vec<u8>>> {
            Box::pin(async { Err(StorageError::Io("Permission denied".to_string())) })
        }

        fn remove(&self, _document: &DocumentRef) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(async { Err(StorageError::Io("Permission denied".to_string())) })
        }
    }

    fn pin(x: f64, y: f64) -> NormalizedPoint {
        NormalizedPoint::new(x, y).unwrap()
    }

    fn store_with_drawing() -> (CaptureStore, Arc<MemoryStorage>, Project, Drawing) {
        let documents = Arc::new(MemoryStorage::new());
        let mut store = CaptureStore::new(documents.clone());
        let project = store.create_project("Site 1", "J. Doe").unwrap();
        let drawing = block_on(store.add_drawing(b"%PDF", "Level 1", project.id)).unwrap();
        (store, documents, project, drawing)
    }

    #[test]
    fn test_create_project_rejects_blank_name() {
        let mut store = CaptureStore::new(Arc::new(MemoryStorage::new()));
        assert!(matches!(
            store.create_project("   ", "J. Doe"),
            Err(CaptureError::Validation(_))
        ));
        assert!(store.projects().is_empty());
        assert!(store.poll_events().is_empty());
    }

    #[test]
    fn test_projects_most_recent_first() {
        let mut store = CaptureStore::new(Arc::new(MemoryStorage::new()));
        let first = store.create_project("First", "A").unwrap();
        let second = store.create_project("Second", "B").unwrap();

        let ids: Vec<ProjectId> = store.projects().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_add_drawing_copies_bytes_and_activates() {
        let (store, documents, project, drawing) = store_with_drawing();

        assert_eq!(documents.document_count(), 1);
        assert_eq!(block_on(documents.read(&drawing.document)).unwrap(), b"%PDF");
        assert_eq!(store.drawings_of(project.id), vec![&drawing]);
        assert_eq!(store.active_drawing(project.id), Some(&drawing));
    }

    #[test]
    fn test_second_drawing_keeps_active() {
        let (mut store, _, project, first) = store_with_drawing();
        let second = block_on(store.add_drawing(b"2", "Level 2", project.id)).unwrap();

        assert_eq!(store.active_drawing(project.id).map(|d| d.id), Some(first.id));
        store.set_active_drawing(project.id, second.id).unwrap();
        assert_eq!(store.active_drawing(project.id).map(|d| d.id), Some(second.id));
    }

    #[test]
    fn test_add_drawing_storage_failure_leaves_no_record() {
        let mut store = CaptureStore::new(Arc::new(BrokenDocuments));
        let project = store.create_project("Site 1", "J. Doe").unwrap();
        store.poll_events();

        let result = block_on(store.add_drawing(b"%PDF", "Level 1", project.id));
        assert!(matches!(result, Err(CaptureError::Storage(_))));
        assert!(store.drawings_of(project.id).is_empty());
        assert!(store.active_drawing(project.id).is_none());
        assert!(store.poll_events().is_empty());
    }

    #[test]
    fn test_add_drawing_unknown_project() {
        let mut store = CaptureStore::new(Arc::new(MemoryStorage::new()));
        let result = block_on(store.add_drawing(b"x", "Plan", ProjectId::generate()));
        assert!(matches!(result, Err(CaptureError::NotFound { .. })));
    }

    #[test]
    fn test_delete_drawing_cascades_exactly() {
        let (mut store, documents, project, drawing) = store_with_drawing();
        let other = block_on(store.add_drawing(b"2", "Level 2", project.id)).unwrap();

        let a = store.create_room(project.id, drawing.id, "A", pin(0.1, 0.1)).unwrap();
        let b = store.create_room(project.id, drawing.id, "B", pin(0.2, 0.2)).unwrap();
        let keep = store.create_room(project.id, other.id, "Keep", pin(0.3, 0.3)).unwrap();
        store.add_scan(project.id, a.id, vec!["a1".into()]).unwrap();
        store.add_scan(project.id, b.id, vec!["b1".into()]).unwrap();
        let kept_scan = store.add_scan(project.id, keep.id, vec!["k1".into()]).unwrap();

        block_on(store.delete_drawing(drawing.id)).unwrap();

        assert!(store.drawing(drawing.id).is_none());
        assert!(store.rooms_of(drawing.id).is_empty());
        assert!(store.room(a.id).is_none());
        assert!(store.room(b.id).is_none());
        assert_eq!(store.rooms_of(other.id), vec![&keep]);
        assert_eq!(store.scan_count(), 1);
        assert_eq!(store.scans_of(keep.id), vec![&kept_scan]);
        assert_eq!(documents.document_count(), 1);
        assert!(store.active_drawing(project.id).is_none());
    }

    #[test]
    fn test_delete_drawing_emits_children_first() {
        let (mut store, _, project, drawing) = store_with_drawing();
        let room = store.create_room(project.id, drawing.id, "A", pin(0.5, 0.5)).unwrap();
        let scan = store.add_scan(project.id, room.id, vec![]).unwrap();
        store.poll_events();

        block_on(store.delete_drawing(drawing.id)).unwrap();
        let events = store.poll_events();
        assert_eq!(
            &events[..3],
            &[
                StoreEvent::ScanRemoved {
                    project: project.id,
                    room: room.id,
                    scan: scan.id
                },
                StoreEvent::RoomRemoved {
                    project: project.id,
                    drawing: drawing.id,
                    room: room.id
                },
                StoreEvent::DrawingRemoved {
                    project: project.id,
                    drawing: drawing.id
                },
            ]
        );
    }

    #[test]
    fn test_delete_drawing_survives_byte_removal_failure() {
        let documents = Arc::new(MemoryStorage::new());
        let mut store = CaptureStore::new(documents.clone());
        let project = store.create_project("Site 1", "J. Doe").unwrap();
        let drawing = block_on(store.add_drawing(b"%PDF", "Level 1", project.id)).unwrap();
        let room = store.create_room(project.id, drawing.id, "A", pin(0.5, 0.5)).unwrap();

        // Remove the bytes behind the store's back so the cascade's removal fails.
        block_on(documents.remove(&drawing.document)).unwrap();

        block_on(store.delete_drawing(drawing.id)).unwrap();
        assert!(store.drawing(drawing.id).is_none());
        assert!(store.room(room.id).is_none());
    }

    #[test]
    fn test_create_room_validates_hierarchy() {
        let (mut store, _, project, drawing) = store_with_drawing();
        let other = store.create_project("Site 2", "K. Roe").unwrap();

        assert!(matches!(
            store.create_room(other.id, drawing.id, "Closet", pin(0.5, 0.5)),
            Err(CaptureError::Validation(_))
        ));
        assert!(matches!(
            store.create_room(project.id, DrawingId::generate(), "Closet", pin(0.5, 0.5)),
            Err(CaptureError::NotFound { .. })
        ));
        assert!(matches!(
            store.create_room(project.id, drawing.id, " ", pin(0.5, 0.5)),
            Err(CaptureError::Validation(_))
        ));
        assert!(store.rooms_of(drawing.id).is_empty());
    }

    #[test]
    fn test_delete_room_cascades_to_scans() {
        let (mut store, _, project, drawing) = store_with_drawing();
        let room = store.create_room(project.id, drawing.id, "A", pin(0.5, 0.5)).unwrap();
        let other = store.create_room(project.id, drawing.id, "B", pin(0.6, 0.6)).unwrap();
        store.add_scan(project.id, room.id, vec!["1".into()]).unwrap();
        store.add_scan(project.id, room.id, vec!["2".into()]).unwrap();
        store.add_scan(project.id, other.id, vec!["3".into()]).unwrap();

        store.delete_room(room.id).unwrap();

        assert!(store.scans_of(room.id).is_empty());
        assert_eq!(store.scans_of(other.id).len(), 1);
        assert_eq!(store.rooms_of(drawing.id), vec![&other]);
        assert!(matches!(
            store.delete_room(room.id),
            Err(CaptureError::NotFound { .. })
        ));
    }

    #[test]
    fn test_add_scan_orphan_never_appends() {
        let (mut store, _, project, _) = store_with_drawing();
        let before = store.scan_count();
        store.poll_events();

        let result = store.add_scan(project.id, RoomId::generate(), vec!["x.jpg".into()]);
        assert!(matches!(result, Err(CaptureError::Orphan { .. })));
        assert_eq!(store.scan_count(), before);
        assert!(store.poll_events().is_empty());
    }

    #[test]
    fn test_add_scan_after_room_deleted_is_orphan() {
        let (mut store, _, project, drawing) = store_with_drawing();
        let room = store.create_room(project.id, drawing.id, "A", pin(0.5, 0.5)).unwrap();
        store.delete_room(room.id).unwrap();

        let result = store.add_scan(project.id, room.id, vec!["late.jpg".into()]);
        assert!(matches!(result, Err(CaptureError::Orphan { room_id }) if room_id == room.id));
        assert_eq!(store.scan_count(), 0);
    }

    #[test]
    fn test_scans_sorted_by_capture_time() {
        let (mut store, _, project, drawing) = store_with_drawing();
        let room = store.create_room(project.id, drawing.id, "A", pin(0.5, 0.5)).unwrap();
        let base = Utc::now();

        for offset in [30, 10, 20, 0, 10] {
            store
                .add_scan_at(
                    project.id,
                    room.id,
                    vec![format!("t{offset}")],
                    base + Duration::seconds(offset),
                )
                .unwrap();
        }

        let times: Vec<_> = store.scans_of(room.id).iter().map(|s| s.captured_at).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(times.len(), 5);
    }

    #[test]
    fn test_rename_and_move_room() {
        let (mut store, _, project, drawing) = store_with_drawing();
        let room = store.create_room(project.id, drawing.id, "A", pin(0.5, 0.5)).unwrap();

        let renamed = store.rename_room(room.id, "  Electrical Closet ").unwrap();
        assert_eq!(renamed.name, "Electrical Closet");
        assert!(matches!(
            store.rename_room(room.id, ""),
            Err(CaptureError::Validation(_))
        ));

        let moved = store.move_room(room.id, pin(0.25, 0.75)).unwrap();
        assert_eq!(moved.pin_x(), 0.25);
        assert_eq!(moved.pin_y(), 0.75);
        assert_eq!(store.room(room.id), Some(&moved));
    }

    #[test]
    fn test_coverage_flag() {
        let (mut store, _, project, drawing) = store_with_drawing();
        let room = store.create_room(project.id, drawing.id, "A", pin(0.5, 0.5)).unwrap();
        let scan = store.add_scan(project.id, room.id, vec![]).unwrap();
        assert_eq!(scan.coverage_complete, None);

        store.set_coverage_complete(scan.id, true).unwrap();
        assert_eq!(store.scan(scan.id).unwrap().coverage_complete, Some(true));
    }

    #[test]
    fn test_delete_project_cascades() {
        let (mut store, documents, project, drawing) = store_with_drawing();
        let keep = store.create_project("Other", "K. Roe").unwrap();
        let room = store.create_room(project.id, drawing.id, "A", pin(0.5, 0.5)).unwrap();
        store.add_scan(project.id, room.id, vec!["1".into()]).unwrap();

        block_on(store.delete_project(project.id)).unwrap();

        assert!(store.project(project.id).is_none());
        assert!(store.drawing(drawing.id).is_none());
        assert!(store.room(room.id).is_none());
        assert_eq!(store.scan_count(), 0);
        assert_eq!(documents.document_count(), 0);
        assert_eq!(store.projects(), &[keep]);
    }

    #[test]
    fn test_report_counts() {
        let (mut store, _, project, drawing) = store_with_drawing();
        let a = store.create_room(project.id, drawing.id, "A", pin(0.1, 0.1)).unwrap();
        let b = store.create_room(project.id, drawing.id, "B", pin(0.9, 0.9)).unwrap();
        store.add_scan(project.id, a.id, vec!["1".into(), "2".into()]).unwrap();
        store.add_scan(project.id, a.id, vec!["3".into()]).unwrap();

        let report = store.report(project.id).unwrap();
        assert_eq!(report.rooms.len(), 2);
        assert_eq!(report.rooms[0].room.id, a.id);
        assert_eq!(report.rooms[0].scan_count, 2);
        assert_eq!(report.rooms[0].image_count, 3);
        assert_eq!(report.rooms[0].drawing_name, "Level 1");
        assert_eq!(report.rooms[1].room.id, b.id);
        assert_eq!(report.rooms[1].scan_count, 0);
        assert_eq!(report.total_scans(), 2);
    }

    #[test]
    fn test_record_restore_roundtrip() {
        let (mut store, documents, project, drawing) = store_with_drawing();
        let room = store.create_room(project.id, drawing.id, "A", pin(0.5, 0.5)).unwrap();
        store.add_scan(project.id, room.id, vec!["1".into()]).unwrap();
        let record = store.record(project.id).unwrap();

        let mut restored = CaptureStore::new(documents);
        restored.restore(vec![record.clone()]);

        assert_eq!(restored.record(project.id), Some(record));
        assert_eq!(restored.active_drawing(project.id).map(|d| d.id), Some(drawing.id));
    }

    #[test]
    fn test_restore_drops_orphans() {
        let (mut store, documents, project, drawing) = store_with_drawing();
        let room = store.create_room(project.id, drawing.id, "A", pin(0.5, 0.5)).unwrap();
        store.add_scan(project.id, room.id, vec!["1".into()]).unwrap();
        let mut record = store.record(project.id).unwrap();
        record.rooms.clear();

        let mut restored = CaptureStore::new(documents);
        restored.restore(vec![record]);

        assert!(restored.room(room.id).is_none());
        assert_eq!(restored.scan_count(), 0);
        assert!(restored.drawing(drawing.id).is_some());
    }

    #[test]
    fn test_restore_orders_projects_newest_first() {
        let documents = Arc::new(MemoryStorage::new());
        let mut source = CaptureStore::new(documents.clone());
        let old = source.create_project("Old", "A").unwrap();
        let new = source.create_project("New", "B").unwrap();
        let mut old_record = source.record(old.id).unwrap();
        old_record.project.created_at = new.created_at - Duration::days(1);
        let new_record = source.record(new.id).unwrap();

        let mut restored = CaptureStore::new(documents);
        restored.restore(vec![old_record, new_record]);

        let ids: Vec<ProjectId> = restored.projects().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }
}
