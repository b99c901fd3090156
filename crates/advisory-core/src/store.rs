//! Where persisted application records come from.
//!
//! The hosted backend is outside this crate; [`RecordStore`] is the seam it
//! plugs into. Two local implementations ship for the CLI and tests.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::{AdvisoryError, AdvisoryResult};

pub trait RecordStore {
    /// Fetch the raw record for `id`. A missing record is `Ok(None)`.
    fn fetch(&self, id: &str) -> AdvisoryResult<Option<Value>>;
}

/// In-memory records keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, record: Value) {
        self.records.insert(id.into(), record);
    }
}

impl RecordStore for MemoryStore {
    fn fetch(&self, id: &str) -> AdvisoryResult<Option<Value>> {
        Ok(self.records.get(id).cloned())
    }
}

/// A directory holding one `<id>.json` file per record.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonDirStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> AdvisoryResult<PathBuf> {
        validate_id(id)?;
        Ok(self.root.join(format!("{id}.json")))
    }
}

impl RecordStore for JsonDirStore {
    fn fetch(&self, id: &str) -> AdvisoryResult<Option<Value>> {
        let path = self.path_for(id)?;
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no record file");
                return Ok(None);
            }
            Err(e) => {
                return Err(AdvisoryError::Store(format!(
                    "Failed to read '{}': {e}",
                    path.display()
                )))
            }
        };
        let value = serde_json::from_str(&contents).map_err(|e| {
            AdvisoryError::SerializationError(format!("Failed to parse '{}': {e}", path.display()))
        })?;
        Ok(Some(value))
    }
}

/// Ids become file names; reject anything that could leave the store root.
fn validate_id(id: &str) -> AdvisoryResult<()> {
    let bad = id.is_empty()
        || id == "."
        || id.contains("..")
        || id.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if bad {
        return Err(AdvisoryError::InvalidInput {
            field: "id".into(),
            reason: format!("'{id}' is not a valid record id."),
        });
    }
    Ok(())
}
