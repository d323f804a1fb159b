use super::{Platform, Snapshot, StorageBackend};
use crate::catalog::{validate_document_name, validate_name};
use crate::error::{KioskError, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct State {
    documents: BTreeMap<String, Value>,
    blobs: BTreeMap<String, Vec<u8>>,
}

/// In-memory storage backend for testing.
///
/// Two fault modes are available: failing every write, and silently
/// dropping writes while still reporting success (what a flaky store that
/// loses acknowledged writes looks like to the caller).
pub struct MemBackend {
    state: Mutex<State>,
    platform: Platform,
    simulate_write_error: AtomicBool,
    drop_writes: AtomicBool,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self::with_platform(Platform::Native)
    }
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A memory backend reporting the given platform, so platform dependent
    /// behavior (export format) can be tested without touching disk.
    pub fn with_platform(platform: Platform) -> Self {
        Self {
            state: Mutex::new(State::default()),
            platform,
            simulate_write_error: AtomicBool::new(false),
            drop_writes: AtomicBool::new(false),
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Acknowledge writes without storing them.
    pub fn set_drop_writes(&self, drop: bool) {
        self.drop_writes.store(drop, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<bool> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(KioskError::Store("Simulated write error".to_string()));
        }
        Ok(!self.drop_writes.load(Ordering::SeqCst))
    }
}

impl StorageBackend for MemBackend {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn location(&self) -> String {
        "memory".to_string()
    }

    fn read_document(&self, name: &str) -> Result<Option<Value>> {
        validate_document_name(name)?;
        Ok(self.state.lock().documents.get(name).cloned())
    }

    fn write_document(&self, name: &str, value: &Value) -> Result<()> {
        validate_document_name(name)?;
        if self.check_write()? {
            self.state
                .lock()
                .documents
                .insert(name.to_string(), value.clone());
        }
        Ok(())
    }

    fn list_documents(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().documents.keys().cloned().collect())
    }

    fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>> {
        validate_name(name)?;
        Ok(self.state.lock().blobs.get(name).cloned())
    }

    fn write_blob(&self, name: &str, data: &[u8]) -> Result<()> {
        validate_name(name)?;
        if self.check_write()? {
            self.state.lock().blobs.insert(name.to_string(), data.to_vec());
        }
        Ok(())
    }

    fn blob_exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.state.lock().blobs.contains_key(name))
    }

    fn list_blobs(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().blobs.keys().cloned().collect())
    }

    fn replace_all(&self, snapshot: &Snapshot) -> Result<()> {
        for name in snapshot.documents.keys() {
            validate_document_name(name)?;
        }
        for name in snapshot.blobs.keys() {
            validate_name(name)?;
        }
        if self.check_write()? {
            let mut state = self.state.lock();
            state.documents = snapshot.documents.clone();
            state.blobs = snapshot.blobs.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simulated_error_keeps_previous_value() {
        let backend = MemBackend::new();
        backend.write_document("faq_data", &json!([1])).unwrap();
        backend.set_simulate_write_error(true);
        assert!(backend.write_document("faq_data", &json!([2])).is_err());
        assert_eq!(backend.read_document("faq_data").unwrap(), Some(json!([1])));
    }

    #[test]
    fn test_dropped_write_reports_success() {
        let backend = MemBackend::new();
        backend.set_drop_writes(true);
        backend.write_document("yayinda", &json!({"x": true})).unwrap();
        assert_eq!(backend.read_document("yayinda").unwrap(), None);
    }
}
