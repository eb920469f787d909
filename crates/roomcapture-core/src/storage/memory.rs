//! In-memory storage implementation.

use super::{
    BoxFuture, DocumentStorage, OwnerToken, ProjectRecord, ProjectStorage, StorageError,
    StorageResult,
};
use crate::model::{DocumentRef, ProjectId};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    projects: RwLock<HashMap<(String, ProjectId), ProjectRecord>>,
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn document_count(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl ProjectStorage for MemoryStorage {
    fn save(&self, owner: &OwnerToken, record: &ProjectRecord) -> BoxFuture<'_, StorageResult<()>> {
        let key = (owner.as_str().to_string(), record.id());
        let record = record.clone();
        Box::pin(async move {
            let mut projects = self.projects.write().map_err(lock_error)?;
            projects.insert(key, record);
            Ok(())
        })
    }

    fn load_projects(
        &self,
        owner: &OwnerToken,
    ) -> BoxFuture<'_, StorageResult<Vec<ProjectRecord>>> {
        let owner = owner.as_str().to_string();
        Box::pin(async move {
            let projects = self.projects.read().map_err(lock_error)?;
            Ok(projects
                .iter()
                .filter(|((o, _), _)| *o == owner)
                .map(|(_, record)| record.clone())
                .collect())
        })
    }

    fn delete(&self, owner: &OwnerToken, project: ProjectId) -> BoxFuture<'_, StorageResult<()>> {
        let key = (owner.as_str().to_string(), project);
        Box::pin(async move {
            let mut projects = self.projects.write().map_err(lock_error)?;
            projects.remove(&key);
            Ok(())
        })
    }
}

impl DocumentStorage for MemoryStorage {
    fn put(&self, key: &str, bytes: &[u8]) -> BoxFuture<'_, StorageResult<DocumentRef>> {
        let key = key.to_string();
        let bytes = bytes.to_vec();
        Box::pin(async move {
            let mut documents = self.documents.write().map_err(lock_error)?;
            documents.insert(key.clone(), bytes);
            Ok(DocumentRef::new(key))
        })
    }

    fn read(&self, document: &DocumentRef) -> BoxFuture<'_, StorageResult<Vec<u8>>> {
        let key = document.as_str().to_string();
        Box::pin(async move {
            let documents = self.documents.read().map_err(lock_error)?;
            documents
                .get(&key)
                .cloned()
                .ok_or(StorageError::NotFound(key))
        })
    }

    fn remove(&self, document: &DocumentRef) -> BoxFuture<'_, StorageResult<()>> {
        let key = document.as_str().to_string();
        Box::pin(async move {
            let mut documents = self.documents.write().map_err(lock_error)?;
            documents
                .remove(&key)
                .map(|_| ())
                .ok_or(StorageError::NotFound(key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Project;
    use chrono::Utc;
    use pollster::block_on;

    fn record(name: &str) -> ProjectRecord {
        ProjectRecord {
            project: Project {
                id: ProjectId::generate(),
                name: name.to_string(),
                foreman: "J. Doe".to_string(),
                created_at: Utc::now(),
            },
            drawings: Vec::new(),
            active_drawing: None,
            rooms: Vec::new(),
            scans: Vec::new(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let owner = OwnerToken::new("tech-1");
        let record = record("Site 1");

        block_on(storage.save(&owner, &record)).unwrap();
        let loaded = block_on(storage.load_projects(&owner)).unwrap();

        assert_eq!(loaded, vec![record]);
    }

    #[test]
    fn test_owner_scoping() {
        let storage = MemoryStorage::new();
        block_on(storage.save(&OwnerToken::new("a"), &record("A"))).unwrap();

        let other = block_on(storage.load_projects(&OwnerToken::new("b"))).unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn test_delete_record() {
        let storage = MemoryStorage::new();
        let owner = OwnerToken::new("tech-1");
        let record = record("Site 1");

        block_on(storage.save(&owner, &record)).unwrap();
        block_on(storage.delete(&owner, record.id())).unwrap();
        assert!(block_on(storage.load_projects(&owner)).unwrap().is_empty());
    }

    #[test]
    fn test_document_put_read_remove() {
        let storage = MemoryStorage::new();
        let doc = block_on(storage.put("plan", b"%PDF-1.7")).unwrap();

        assert_eq!(block_on(storage.read(&doc)).unwrap(), b"%PDF-1.7");
        assert_eq!(storage.document_count(), 1);

        block_on(storage.remove(&doc)).unwrap();
        assert_eq!(storage.document_count(), 0);
        assert!(matches!(
            block_on(storage.read(&doc)),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_missing_document() {
        let storage = MemoryStorage::new();
        let result = block_on(storage.remove(&DocumentRef::new("missing")));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
