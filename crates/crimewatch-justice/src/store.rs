//! Structured persistence for service state.
//!
//! Services serialise themselves into a [`serde_json::Value`] document
//! keyed by stable field names and hand it to a [`StructuredStore`].
//! Loading is fail-open: a missing, unreadable or malformed document
//! degrades to empty state. Saving is fail-safe: a failed save leaves the
//! in-memory state untouched.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StoreError;

/// A backend able to load and save one structured document.
pub trait StructuredStore {
    /// Load the stored document. `Ok(None)` means nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend could not be read or decoded.
    fn load(&self) -> Result<Option<Value>, StoreError>;

    /// Replace the stored document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend could not be written.
    fn save(&mut self, document: &Value) -> Result<(), StoreError>;
}

/// A store that keeps the document in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    document: Option<Value>,
}

impl MemoryStore {
    /// An empty store.
    pub const fn new() -> Self {
        Self { document: None }
    }

    /// A store pre-loaded with `document`.
    pub const fn with_document(document: Value) -> Self {
        Self {
            document: Some(document),
        }
    }

    /// The currently stored document.
    pub const fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }
}

impl StructuredStore for MemoryStore {
    fn load(&self) -> Result<Option<Value>, StoreError> {
        Ok(self.document.clone())
    }

    fn save(&mut self, document: &Value) -> Result<(), StoreError> {
        self.document = Some(document.clone());
        Ok(())
    }
}

/// A store backed by a pretty-printed JSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// A store writing to `path`. Nothing is touched until the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StructuredStore for JsonFileStore {
    fn load(&self) -> Result<Option<Value>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, document: &Value) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(document)?;
        std::fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "Saved document");
        Ok(())
    }
}

/// Load and decode a document, degrading every failure to `None`.
pub(crate) fn load_document<T, S>(store: &S, what: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: StructuredStore + ?Sized,
{
    let value = match store.load() {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!(what, "No saved document, starting empty");
            return None;
        }
        Err(err) => {
            warn!(what, error = %err, "Failed to load saved document, starting empty");
            return None;
        }
    };
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(what, error = %err, "Saved document is malformed, starting empty");
            None
        }
    }
}
