//! The penalty document as a YAML file.
//!
//! Every write goes to a temporary file next to the target, is synced and
//! then renamed over it, so a crash leaves either the old or the new file
//! and never a torn one. The replacement keeps the permissions of the
//! file it replaces.
//!
//! [`save_pending`](PersistentStore::save_pending) edits the parsed YAML
//! tree instead of re-serializing a [`PenaltyDocument`]. Keys the engine
//! does not know about survive, and operator edits made since the last
//! reload are not overwritten by a registry flush.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use penance_core::{PENDING_KEY, PenaltyDocument, PersistentStore, StoreError};
use penance_types::ParticipantId;
use serde_yml::{Mapping, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// A penalty document stored as a YAML file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the document at `path`, creating it with the defaults if it
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the default document cannot be
    /// written.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        if !store.path.exists() {
            store.save(&PenaltyDocument::default())?;
            info!(path = %store.path.display(), "created default penalty document");
        }
        Ok(store)
    }

    /// Open an existing document without creating it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] with [`io::ErrorKind::NotFound`] if the
    /// file does not exist.
    pub fn open_existing(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )
            .into());
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, StoreError> {
        Ok(fs::read_to_string(&self.path)?)
    }

    fn write(&self, contents: &str) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(contents.as_bytes())?;
        match fs::metadata(&self.path) {
            Ok(existing) => fs::set_permissions(tmp.path(), existing.permissions())?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl PersistentStore for FileStore {
    fn load(&self) -> Result<PenaltyDocument, StoreError> {
        PenaltyDocument::parse(&self.read()?)
    }

    fn save(&self, document: &PenaltyDocument) -> Result<(), StoreError> {
        let yaml = document.to_yaml()?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.write(&yaml)
    }

    fn save_pending(&self, pending: &[ParticipantId]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut root = match serde_yml::from_str::<Value>(&self.read()?)? {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            other => {
                return Err(StoreError::Malformed(format!(
                    "expected a mapping at the top level, found {}",
                    kind(&other)
                )));
            }
        };
        root.insert(
            Value::String(PENDING_KEY.to_owned()),
            serde_yml::to_value(pending)?,
        );

        self.write(&serde_yml::to_string(&root)?)?;
        debug!(path = %self.path.display(), pending = pending.len(), "pending deaths flushed");
        Ok(())
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
