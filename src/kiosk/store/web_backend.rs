use super::local_storage::LocalStorage;
use super::{Platform, Snapshot, StorageBackend};
use crate::catalog::{validate_document_name, validate_name, BLOB_KEY_SPACE};
use crate::error::{KioskError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, warn};

/// Prefix of every entry this application owns.
pub const KEY_PREFIX: &str = "pds_";
/// Prefix of blob entries; only these are evicted to make room.
pub const FILE_PREFIX: &str = "pds_file_";

pub const DEFAULT_QUOTA_BYTES: usize = 2_621_440;
pub const DEFAULT_MAX_FILE_BYTES: usize = 2_097_152;

/// Browser-storage backend over a [`LocalStorage`] key-value store.
pub struct WebBackend {
    store: Mutex<LocalStorage>,
    max_file_bytes: usize,
}

impl WebBackend {
    pub fn new(store: LocalStorage) -> Self {
        Self {
            store: Mutex::new(store),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(LocalStorage::in_memory(DEFAULT_QUOTA_BYTES))
    }

    pub fn with_max_file_bytes(mut self, max: usize) -> Self {
        self.max_file_bytes = max;
        self
    }

    pub fn max_file_bytes(&self) -> usize {
        self.max_file_bytes
    }

    fn document_key(name: &str) -> String {
        format!("{}{}", KEY_PREFIX, name)
    }

    fn file_key(name: &str) -> String {
        format!("{}{}", FILE_PREFIX, name)
    }

    /// Set `key`, and on a quota failure evict the oldest blob entries
    /// (never `key` itself, never documents) until the new value would fit,
    /// then retry exactly once.
    fn set_with_eviction(&self, key: &str, value: String) -> Result<()> {
        let mut store = self.store.lock();
        let needed = key.len() + value.len();

        match store.set(key, value.clone()) {
            Err(KioskError::QuotaExceeded { .. }) => {}
            other => return other,
        }

        let released = store.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
        let overflow = (store.usage() + needed).saturating_sub(released + store.capacity());
        warn!(key, bytes = needed, overflow, "storage quota exceeded, evicting old files");
        let mut freed = 0;
        for victim in store.keys_with_prefix(FILE_PREFIX) {
            if freed >= overflow {
                break;
            }
            if victim == key {
                continue;
            }
            let size = victim.len() + store.get(&victim).map(str::len).unwrap_or(0);
            store.remove(&victim)?;
            freed += size;
            debug!(key = %victim, bytes = size, "evicted");
        }

        store.set(key, value).map_err(|e| {
            error!(key, error = %e, "write failed after eviction");
            e
        })
    }
}

impl StorageBackend for WebBackend {
    fn platform(&self) -> Platform {
        Platform::Web
    }

    fn location(&self) -> String {
        match self.store.lock().profile() {
            Some(path) => format!("local storage ({})", path.display()),
            None => "local storage (memory)".to_string(),
        }
    }

    fn read_document(&self, name: &str) -> Result<Option<Value>> {
        validate_document_name(name)?;
        let store = self.store.lock();
        match store.get(&Self::document_key(name)) {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(KioskError::Serialization),
        }
    }

    fn write_document(&self, name: &str, value: &Value) -> Result<()> {
        validate_document_name(name)?;
        let raw = serde_json::to_string(value).map_err(KioskError::Serialization)?;
        self.set_with_eviction(&Self::document_key(name), raw)
    }

    fn list_documents(&self) -> Result<Vec<String>> {
        let store = self.store.lock();
        let mut names: Vec<String> = store
            .keys_with_prefix(KEY_PREFIX)
            .into_iter()
            .filter(|k| !k.starts_with(FILE_PREFIX))
            .filter_map(|k| k.strip_prefix(KEY_PREFIX).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>> {
        validate_name(name)?;
        let store = self.store.lock();
        match store.get(&Self::file_key(name)) {
            None => Ok(None),
            Some(encoded) => STANDARD
                .decode(encoded)
                .map(Some)
                .map_err(|e| KioskError::Store(format!("corrupt blob {}: {}", name, e))),
        }
    }

    fn write_blob(&self, name: &str, data: &[u8]) -> Result<()> {
        validate_name(name)?;
        let encoded = STANDARD.encode(data);
        if encoded.len() > self.max_file_bytes {
            warn!(blob = name, size = encoded.len(), limit = self.max_file_bytes, "file too large");
            return Err(KioskError::FileTooLarge {
                size: encoded.len(),
                limit: self.max_file_bytes,
            });
        }
        let size = encoded.len();
        self.set_with_eviction(&Self::file_key(name), encoded)
            .map_err(|e| match e {
                KioskError::QuotaExceeded { .. } => KioskError::QuotaExceeded { size },
                KioskError::Io(_) | KioskError::Serialization(_) => {
                    KioskError::StorageFailed { size }
                }
                other => other,
            })
    }

    fn blob_exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.store.lock().contains(&Self::file_key(name)))
    }

    fn list_blobs(&self) -> Result<Vec<String>> {
        let store = self.store.lock();
        let mut names: Vec<String> = store
            .keys_with_prefix(FILE_PREFIX)
            .into_iter()
            .filter_map(|k| k.strip_prefix(FILE_PREFIX).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    fn replace_all(&self, snapshot: &Snapshot) -> Result<()> {
        let mut entries = Vec::with_capacity(snapshot.documents.len() + snapshot.blobs.len());
        for (name, value) in &snapshot.documents {
            validate_document_name(name)?;
            let raw = serde_json::to_string(value).map_err(KioskError::Serialization)?;
            entries.push((Self::document_key(name), raw));
        }
        for (name, bytes) in &snapshot.blobs {
            validate_name(name)?;
            let encoded = STANDARD.encode(bytes);
            if encoded.len() > self.max_file_bytes {
                return Err(KioskError::FileTooLarge {
                    size: encoded.len(),
                    limit: self.max_file_bytes,
                });
            }
            entries.push((Self::file_key(name), encoded));
        }
        // LocalStorage restores its previous content itself when this fails.
        self.store.lock().replace_prefixed(KEY_PREFIX, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_round_trip() {
        let backend = WebBackend::in_memory();
        backend.write_document("faq_data", &json!([{"id": "1"}])).unwrap();
        assert_eq!(
            backend.read_document("faq_data").unwrap(),
            Some(json!([{"id": "1"}]))
        );
        assert_eq!(backend.list_documents().unwrap(), vec!["faq_data"]);
    }

    #[test]
    fn test_blob_key_space_matches_catalog() {
        assert_eq!(FILE_PREFIX, format!("{}{}", KEY_PREFIX, BLOB_KEY_SPACE));
    }

    #[test]
    fn test_documents_and_blobs_keep_separate_key_spaces() {
        let backend = WebBackend::in_memory();
        assert!(matches!(
            backend.write_document("file_notes", &json!({"a": 1})),
            Err(KioskError::InvalidName(_))
        ));
        assert!(backend.list_blobs().unwrap().is_empty());

        backend.write_document("notes", &json!({"a": 1})).unwrap();
        backend.write_blob("notes", b"{raw}").unwrap();
        assert_eq!(backend.list_documents().unwrap(), vec!["notes"]);
        assert_eq!(backend.list_blobs().unwrap(), vec!["notes"]);

        let snapshot = backend.snapshot().unwrap();
        assert_eq!(snapshot.documents["notes"], json!({"a": 1}));
        assert_eq!(snapshot.blobs["notes"], b"{raw}".to_vec());

        let copy = WebBackend::in_memory();
        copy.replace_all(&snapshot).unwrap();
        assert_eq!(copy.snapshot().unwrap(), snapshot);
    }

    #[test]
    fn test_blob_larger_than_ceiling_is_too_large() {
        let backend = WebBackend::in_memory().with_max_file_bytes(16);
        let err = backend.write_blob("big.png", &[7u8; 64]).unwrap_err();
        assert!(matches!(err, KioskError::FileTooLarge { limit: 16, .. }));
        assert!(!backend.blob_exists("big.png").unwrap());
    }

    #[test]
    fn test_quota_evicts_oldest_blob_then_retries() {
        let backend = WebBackend::new(LocalStorage::in_memory(250));
        backend.write_document("yayinda", &json!({})).unwrap();
        backend.write_blob("old.bin", &[1u8; 60]).unwrap();
        backend.write_blob("new.bin", &[2u8; 60]).unwrap();

        // Needs room: only old.bin goes, the document stays.
        backend.write_blob("third.bin", &[3u8; 60]).unwrap();
        assert!(!backend.blob_exists("old.bin").unwrap());
        assert!(backend.blob_exists("new.bin").unwrap());
        assert!(backend.blob_exists("third.bin").unwrap());
        assert_eq!(backend.read_document("yayinda").unwrap(), Some(json!({})));
    }

    #[test]
    fn test_quota_exceeded_when_eviction_is_not_enough() {
        let backend = WebBackend::new(LocalStorage::in_memory(100)).with_max_file_bytes(1000);
        backend.write_document("faq_data", &json!(["x".repeat(40)])).unwrap();
        let err = backend.write_blob("huge.bin", &[1u8; 80]).unwrap_err();
        assert!(matches!(err, KioskError::QuotaExceeded { .. }));
        assert!(backend.read_document("faq_data").unwrap().is_some());
    }

    #[test]
    fn test_documents_never_evicted_for_documents() {
        let backend = WebBackend::new(LocalStorage::in_memory(60));
        backend.write_document("a", &json!("x".repeat(20))).unwrap();
        assert!(backend.write_document("b", &json!("y".repeat(40))).is_err());
        assert!(backend.read_document("a").unwrap().is_some());
    }

    #[test]
    fn test_corrupt_entry_is_serialization_error() {
        let mut store = LocalStorage::in_memory(1000);
        store.set("pds_faq_data", "{oops".into()).unwrap();
        let backend = WebBackend::new(store);
        assert!(matches!(
            backend.read_document("faq_data"),
            Err(KioskError::Serialization(_))
        ));
    }
}
