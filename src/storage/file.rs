//! JSON file storage.
//!
//! Every live object is kept in memory and written as one JSON document,
//! keyed by `"<Class>.<id>"`, on [`Storage::save`].

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::debug;

use super::engine::{Objects, Storage, filter_class};
use super::{StorageError, StorageResult};
use crate::models::{ClassName, Entity, object_key};

/// File-backed object storage.
pub struct FileStorage {
    path: PathBuf,
    objects: Objects,
}

impl FileStorage {
    /// Storage backed by `path`. Nothing is read until [`Storage::reload`].
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            objects: Objects::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }

    fn corrupt(&self, message: impl Into<String>) -> StorageError {
        StorageError::Corrupt {
            path: self.path.display().to_string(),
            message: message.into(),
        }
    }

    /// Serialize every object into the snapshot document.
    fn snapshot(&self) -> StorageResult<Map<String, Value>> {
        let mut snapshot = Map::new();
        for (key, entity) in &self.objects {
            snapshot.insert(key.clone(), Value::Object(entity.to_dict()?));
        }
        Ok(snapshot)
    }

    /// Rebuild the object map from a snapshot document.
    fn restore(&self, raw: &str) -> StorageResult<Objects> {
        if raw.trim().is_empty() {
            return Ok(Objects::new());
        }

        let snapshot: Map<String, Value> =
            serde_json::from_str(raw).map_err(|e| self.corrupt(e.to_string()))?;

        let mut objects = Objects::new();
        for (key, value) in snapshot {
            let entity =
                Entity::from_value(value).map_err(|e| self.corrupt(format!("{}: {}", key, e)))?;
            if entity.key() != key {
                return Err(self.corrupt(format!(
                    "entry '{}' holds {}",
                    key,
                    entity.key()
                )));
            }
            objects.insert(key, entity);
        }
        Ok(objects)
    }
}

/// Replace `path` with `contents` atomically: write a temporary file in the
/// same directory, fsync it, then rename it over the target.
fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl Storage for FileStorage {
    async fn all(&self, class: Option<ClassName>) -> StorageResult<Objects> {
        Ok(filter_class(&self.objects, class))
    }

    async fn get(&self, class: ClassName, id: &str) -> StorageResult<Option<Entity>> {
        Ok(self.objects.get(&object_key(class, id)).cloned())
    }

    async fn new(&mut self, entity: Entity) -> StorageResult<()> {
        self.objects.insert(entity.key(), entity);
        Ok(())
    }

    async fn save(&mut self) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(&self.snapshot()?).map_err(|e| {
            StorageError::InvalidData {
                message: e.to_string(),
                help: "Objects must serialize to JSON".to_string(),
            }
        })?;
        write_atomically(&self.path, json.as_bytes()).map_err(|e| self.io_error(e))?;
        debug!(
            path = %self.path.display(),
            objects = self.objects.len(),
            "Saved file storage"
        );
        Ok(())
    }

    async fn delete(&mut self, entity: &Entity) -> StorageResult<()> {
        self.objects.remove(&entity.key());
        // Links to a deleted amenity go with it.
        if entity.class() == ClassName::Amenity {
            for object in self.objects.values_mut() {
                if let Entity::Place(place) = object {
                    place.remove_amenity(entity.id());
                }
            }
        }
        Ok(())
    }

    async fn reload(&mut self) -> StorageResult<()> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No storage file yet");
                return Ok(());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        self.objects = self.restore(&raw)?;
        debug!(
            path = %self.path.display(),
            objects = self.objects.len(),
            "Reloaded file storage"
        );
        Ok(())
    }

    async fn close(self) -> StorageResult<()> {
        Ok(())
    }
}
