//! File-based storage implementation.
//!
//! Layout under the base directory:
//!
//! ```text
//! owners/<owner>/projects/<project-id>.json
//! documents/<key>.doc
//! ```

use super::{
    BoxFuture, DocumentStorage, OwnerToken, ProjectRecord, ProjectStorage, StorageError,
    StorageResult,
};
use crate::model::{DocumentRef, ProjectId};
use std::fs;
use std::path::{Path, PathBuf};

/// File-based storage for project records and drawing documents.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create file storage rooted at `base_path`, creating it if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(base_path.join("documents")).map_err(|e| {
            StorageError::Io(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// On-disk location of a stored document, for handing to a viewer.
    pub fn document_path(&self, document: &DocumentRef) -> PathBuf {
        self.base_path
            .join("documents")
            .join(format!("{}.doc", encode_key(document.as_str())))
    }

    fn projects_dir(&self, owner: &OwnerToken) -> PathBuf {
        self.base_path
            .join("owners")
            .join(encode_key(owner.as_str()))
            .join("projects")
    }

    fn project_path(&self, owner: &OwnerToken, project: ProjectId) -> PathBuf {
        self.projects_dir(owner).join(format!("{}.json", project))
    }
}

/// Encode an arbitrary key as a file name.
///
/// ASCII letters, digits and `-` pass through; every other byte becomes
/// `_XX`. Distinct keys always map to distinct names.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02x}", byte));
        }
    }
    out
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Io(format!("Failed to {} {}: {}", action, path.display(), e))
}

impl ProjectStorage for FileStorage {
    fn save(
        &self,
        owner: &OwnerToken,
        record: &ProjectRecord,
    ) -> BoxFuture<'_, StorageResult<()>> {
        let dir = self.projects_dir(owner);
        let path = self.project_path(owner, record.id());
        let json = record.to_json();

        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            fs::create_dir_all(&dir).map_err(|e| io_error("create", &dir, e))?;

            // Write through a temp file so a crash never leaves half a record.
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json).map_err(|e| io_error("write", &tmp, e))?;
            fs::rename(&tmp, &path).map_err(|e| io_error("replace", &path, e))
        })
    }

    fn load_projects(
        &self,
        owner: &OwnerToken,
    ) -> BoxFuture<'_, StorageResult<Vec<ProjectRecord>>> {
        let dir = self.projects_dir(owner);

        Box::pin(async move {
            if !dir.exists() {
                return Ok(Vec::new());
            }

            let entries = fs::read_dir(&dir).map_err(|e| io_error("read", &dir, e))?;

            let mut records = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    let json = fs::read_to_string(&path).map_err(|e| io_error("read", &path, e))?;
                    let record = ProjectRecord::from_json(&json).map_err(|e| {
                        StorageError::Serialization(format!(
                            "Failed to parse {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                    records.push(record);
                }
            }
            Ok(records)
        })
    }

    fn delete(&self, owner: &OwnerToken, project: ProjectId) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.project_path(owner, project);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| io_error("delete", &path, e))?;
            }
            Ok(())
        })
    }
}

impl DocumentStorage for FileStorage {
    fn put(&self, key: &str, bytes: &[u8]) -> BoxFuture<'_, StorageResult<DocumentRef>> {
        let document = DocumentRef::new(key);
        let path = self.document_path(&document);
        let bytes = bytes.to_vec();

        Box::pin(async move {
            let tmp = path.with_extension("doc.tmp");
            if let Err(e) = fs::write(&tmp, bytes) {
                let _ = fs::remove_file(&tmp);
                return Err(io_error("write", &tmp, e));
            }
            if let Err(e) = fs::rename(&tmp, &path) {
                let _ = fs::remove_file(&tmp);
                return Err(io_error("replace", &path, e));
            }
            Ok(document)
        })
    }

    fn read(&self, document: &DocumentRef) -> BoxFuture<'_, StorageResult<Vec<u8>>> {
        let path = self.document_path(document);
        let key = document.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            fs::read(&path).map_err(|e| io_error("read", &path, e))
        })
    }

    fn remove(&self, document: &DocumentRef) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(document);
        let key = document.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            fs::remove_file(&path).map_err(|e| io_error("delete", &path, e))
        })
    }
}
