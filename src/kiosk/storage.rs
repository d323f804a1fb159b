//! The storage capability object.
//!
//! [`Storage`] wraps exactly one [`StorageBackend`], chosen once at startup,
//! and is passed by reference to every component that persists anything.
//! It owns the caller-facing policies that sit above raw I/O:
//!
//! - Reads never fail: a missing document yields the caller's default, a
//!   corrupt one yields the default plus a `warn` log line.
//! - Writes return typed errors, so callers can tell the capacity
//!   conditions (`FileTooLarge`, `QuotaExceeded`) from plain I/O failures.
//! - Blob payloads are normalized at this boundary: a data-URI prefix is
//!   stripped on the way in and only added back on explicit request.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::blob::{self, BlobEncoding};
use crate::catalog::DocumentName;
use crate::config::{BackendChoice, KioskConfig};
use crate::error::{KioskError, Result};
use crate::ledger::PublishLedger;
use crate::store::fs_backend::FsBackend;
use crate::store::local_storage::LocalStorage;
use crate::store::web_backend::WebBackend;
use crate::store::{Platform, StorageBackend};

/// Where each backend keeps its data.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    /// Root of the native backend.
    pub data_dir: PathBuf,
    /// Profile file of the web backend.
    pub web_profile: PathBuf,
}

/// What `initialize_defaults` created.
#[derive(Debug, Default, Clone)]
pub struct InitReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

pub struct Storage {
    backend: Box<dyn StorageBackend>,
    pub(crate) ledger_lock: Mutex<()>,
}

impl Storage {
    pub fn with_backend<B: StorageBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
            ledger_lock: Mutex::new(()),
        }
    }

    /// Pick the backend for this process.
    ///
    /// `Auto` uses the native backend when the data directory can be created
    /// and written, and falls back to the web backend otherwise. An explicit
    /// `Native` choice fails instead of falling back. The web backend fails
    /// when its profile cannot be loaded; it never runs memory-only, since
    /// its writes would be acknowledged without being durable.
    pub fn select(config: &KioskConfig, paths: &StoragePaths) -> Result<Self> {
        let data_dir = config.data_dir.clone().unwrap_or_else(|| paths.data_dir.clone());

        match config.backend {
            BackendChoice::Native => {
                probe_writable(&data_dir)?;
                Ok(Self::native(data_dir))
            }
            BackendChoice::Web => Self::web(config, &paths.web_profile),
            BackendChoice::Auto => match probe_writable(&data_dir) {
                Ok(()) => Ok(Self::native(data_dir)),
                Err(e) => {
                    warn!(dir = %data_dir.display(), error = %e, "data directory not writable, using web storage");
                    Self::web(config, &paths.web_profile)
                }
            },
        }
    }

    fn native(data_dir: PathBuf) -> Self {
        info!(dir = %data_dir.display(), "using native storage");
        Self::with_backend(FsBackend::new(data_dir))
    }

    /// An unreadable profile is left untouched for the operator to repair.
    fn web(config: &KioskConfig, profile: &Path) -> Result<Self> {
        let store = LocalStorage::open(profile, config.web_quota_bytes).map_err(|e| {
            error!(profile = %profile.display(), error = %e, "web profile unusable");
            KioskError::Store(format!(
                "web storage profile {} cannot be loaded: {}",
                profile.display(),
                e
            ))
        })?;
        info!(profile = %profile.display(), "using web storage");
        Ok(Self::with_backend(
            WebBackend::new(store).with_max_file_bytes(config.web_max_file_bytes),
        ))
    }

    pub fn platform(&self) -> Platform {
        self.backend.platform()
    }

    pub fn location(&self) -> String {
        self.backend.location()
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    pub fn ledger(&self) -> PublishLedger<'_> {
        PublishLedger::new(self)
    }

    // --- Documents ---

    /// Read a document, falling back to `default` when it is missing or
    /// unreadable.
    pub fn read_document(&self, name: &str, default: Value) -> Value {
        match self.backend.read_document(name) {
            Ok(Some(value)) => value,
            Ok(None) => {
                debug!(document = name, "not found, using default");
                default
            }
            Err(e) => {
                warn!(document = name, error = %e, "unreadable document, using default");
                default
            }
        }
    }

    /// Read a catalog document with its catalog default.
    pub fn read_catalog(&self, doc: DocumentName) -> Value {
        self.read_document(doc.as_str(), doc.default_value())
    }

    /// Read a document into a typed value, falling back to `default` when
    /// it is missing, unreadable, or has the wrong shape.
    pub fn read_as<T: DeserializeOwned>(&self, name: &str, default: T) -> T {
        match self.backend.read_document(name) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(typed) => typed,
                Err(e) => {
                    warn!(document = name, error = %e, "document has unexpected shape, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                warn!(document = name, error = %e, "unreadable document, using default");
                default
            }
        }
    }

    pub fn write_document(&self, name: &str, value: &Value) -> Result<()> {
        self.backend.write_document(name, value).map_err(|e| {
            error!(document = name, error = %e, "document write failed");
            e
        })?;
        debug!(document = name, "document written");
        Ok(())
    }

    pub fn write_as<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(KioskError::Serialization)?;
        self.write_document(name, &value)
    }

    // --- Blobs ---

    /// Persist a caller payload. Base64 payloads may carry a data-URI prefix;
    /// it is stripped here and never stored.
    pub fn save_blob(&self, name: &str, data: &str, encoding: BlobEncoding) -> Result<()> {
        let bytes = blob::decode_payload(data, encoding)?;
        self.save_blob_bytes(name, &bytes)
    }

    pub fn save_blob_bytes(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.backend.write_blob(name, bytes).map_err(|e| {
            if e.is_capacity() {
                warn!(blob = name, error = %e, "blob rejected");
            } else {
                error!(blob = name, error = %e, "blob write failed");
            }
            e
        })?;
        debug!(blob = name, bytes = bytes.len(), "blob written");
        Ok(())
    }

    /// Stored content in the requested encoding, without any prefix.
    pub fn read_blob(&self, name: &str, encoding: BlobEncoding) -> Option<String> {
        let bytes = self.read_blob_bytes(name)?;
        match blob::encode_payload(&bytes, encoding) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(blob = name, error = %e, "blob cannot be rendered");
                None
            }
        }
    }

    pub fn read_blob_bytes(&self, name: &str) -> Option<Vec<u8>> {
        match self.backend.read_blob(name) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(blob = name, error = %e, "unreadable blob");
                None
            }
        }
    }

    /// Stored content as a displayable `data:` URI.
    pub fn read_blob_data_uri(&self, name: &str) -> Option<String> {
        self.read_blob_bytes(name)
            .map(|bytes| blob::to_data_uri(name, &bytes))
    }

    pub fn blob_exists(&self, name: &str) -> bool {
        self.backend.blob_exists(name).unwrap_or_else(|e| {
            warn!(blob = name, error = %e, "blob existence check failed");
            false
        })
    }

    // --- Setup ---

    /// Write the catalog default of every document that does not exist yet.
    /// Existing documents, including corrupt ones, are left alone.
    pub fn initialize_defaults(&self) -> Result<InitReport> {
        self.backend.prepare()?;
        let mut report = InitReport::default();
        for doc in DocumentName::ALL {
            let name = doc.as_str();
            let exists = match self.backend.read_document(name) {
                Ok(found) => found.is_some(),
                Err(KioskError::Serialization(_)) => true,
                Err(e) => return Err(e),
            };
            if exists {
                report.existing.push(name.to_string());
            } else {
                self.write_document(name, &doc.default_value())?;
                report.created.push(name.to_string());
            }
        }
        info!(created = report.created.len(), "defaults initialized");
        Ok(report)
    }
}

/// Create `dir` if needed and prove a file can be written in it.
fn probe_writable(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(KioskError::Io)?;
    let probe = dir.join(format!(".kiosk-probe-{}", Uuid::new_v4()));
    fs::write(&probe, b"ok").map_err(KioskError::Io)?;
    fs::remove_file(&probe).map_err(KioskError::Io)?;
    Ok(())
}
