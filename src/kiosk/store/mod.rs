//! # Storage Layer
//!
//! This module defines the raw storage abstraction. The [`StorageBackend`]
//! trait handles the "how" of persistence (file system vs. browser-style
//! local storage), while [`crate::storage::Storage`] handles the "what"
//! (defaults, blob normalization, the ledger, logging).
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: native file system. Documents are
//!   `<name>.json` files written with a `.backup` sibling and an atomic
//!   temp-file rename; blobs live under `files/`.
//! - [`web_backend::WebBackend`]: a capacity-limited key-value string store
//!   modelled on browser local storage. Documents are `pds_<name>` entries,
//!   blobs are `pds_file_<name>` entries holding raw base64.
//! - [`mem_backend::MemBackend`]: in-memory, for tests, with fault injection.
//!
//! ## Storage Layout (native)
//!
//! ```text
//! data/
//! ├── yayinda.json            # Publish ledger
//! ├── yayinda.json.backup     # Previous version, kept by every overwrite
//! ├── faq_data.json           # ... one file per document
//! └── files/
//!     └── training_1700000000000.pdf
//! ```

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

pub mod fs_backend;
pub mod local_storage;
pub mod mem_backend;
pub mod web_backend;

/// Which kind of host the active backend models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Native,
    Web,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Native => f.write_str("native"),
            Platform::Web => f.write_str("web"),
        }
    }
}

/// The full contents of a store: every document and every blob.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: BTreeMap<String, Value>,
    pub blobs: BTreeMap<String, Vec<u8>>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.blobs.is_empty()
    }
}

/// Abstract interface for raw storage I/O.
///
/// Read methods distinguish "absent" (`Ok(None)`) from "broken" (`Err`);
/// turning both into a caller default is the facade's job.
pub trait StorageBackend: Send + Sync {
    fn platform(&self) -> Platform;

    /// Human readable location of the data (a path, a profile file, memory).
    fn location(&self) -> String;

    /// Create whatever on-medium layout the backend needs before first use.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    // --- Documents ---

    fn read_document(&self, name: &str) -> Result<Option<Value>>;

    /// Persist the whole document. On error the previously stored value
    /// must still be readable.
    fn write_document(&self, name: &str, value: &Value) -> Result<()>;

    fn list_documents(&self) -> Result<Vec<String>>;

    // --- Blobs ---

    fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>>;

    fn write_blob(&self, name: &str, data: &[u8]) -> Result<()>;

    fn blob_exists(&self, name: &str) -> Result<bool>;

    fn list_blobs(&self) -> Result<Vec<String>>;

    // --- Whole-store operations ---

    /// Read everything into memory.
    fn snapshot(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::default();
        for name in self.list_documents()? {
            if let Some(value) = self.read_document(&name)? {
                snapshot.documents.insert(name, value);
            }
        }
        for name in self.list_blobs()? {
            if let Some(bytes) = self.read_blob(&name)? {
                snapshot.blobs.insert(name, bytes);
            }
        }
        Ok(snapshot)
    }

    /// Replace all stored state with `snapshot`. Either the new state is
    /// fully applied or the previous state is restored before returning
    /// the error.
    fn replace_all(&self, snapshot: &Snapshot) -> Result<()>;
}
