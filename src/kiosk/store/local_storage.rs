//! A capacity-limited key-value string store with browser local-storage
//! semantics: whole-string values, a total byte budget, and insertion order
//! that lets the caller evict the oldest entries.
//!
//! When opened with a profile path, every mutation is flushed to that file
//! before it is acknowledged. A failed flush reverts the in-memory change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::error::{KioskError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    value: String,
    seq: u64,
}

#[derive(Debug)]
pub struct LocalStorage {
    entries: BTreeMap<String, Entry>,
    next_seq: u64,
    capacity: usize,
    profile: Option<PathBuf>,
}

impl LocalStorage {
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
            capacity,
            profile: None,
        }
    }

    /// Open (or create) a store persisted to a single profile file.
    pub fn open(profile: &Path, capacity: usize) -> Result<Self> {
        let entries: BTreeMap<String, Entry> = if profile.exists() {
            let content = fs::read_to_string(profile).map_err(KioskError::Io)?;
            serde_json::from_str(&content).map_err(KioskError::Serialization)?
        } else {
            BTreeMap::new()
        };
        let next_seq = entries.values().map(|e| e.seq + 1).max().unwrap_or(0);
        Ok(Self {
            entries,
            next_seq,
            capacity,
            profile: Some(profile.to_path_buf()),
        })
    }

    pub fn profile(&self) -> Option<&Path> {
        self.profile.as_deref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes used, counting keys and values.
    pub fn usage(&self) -> usize {
        self.entries
            .iter()
            .map(|(k, e)| k.len() + e.value.len())
            .sum()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store `value` under `key`. Fails with `QuotaExceeded` without
    /// modifying anything when the budget would be exceeded.
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        let current = self
            .entries
            .get(key)
            .map(|e| key.len() + e.value.len())
            .unwrap_or(0);
        let projected = self.usage() - current + key.len() + value.len();
        if projected > self.capacity {
            return Err(KioskError::QuotaExceeded { size: value.len() });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let previous = self.entries.insert(key.to_string(), Entry { value, seq });

        if let Err(e) = self.flush() {
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush() {
            self.entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    /// Keys starting with `prefix`, oldest write first.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<(&String, u64)> = self
            .entries
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, e)| (k, e.seq))
            .collect();
        keys.sort_by_key(|(_, seq)| *seq);
        keys.into_iter().map(|(k, _)| k.clone()).collect()
    }

    /// Swap the whole content for `entries` in one flush. Used by import.
    pub fn replace_prefixed(&mut self, prefix: &str, entries: Vec<(String, String)>) -> Result<()> {
        let before = self.entries.clone();
        let before_seq = self.next_seq;

        self.entries.retain(|k, _| !k.starts_with(prefix));
        for (key, value) in entries {
            let seq = self.next_seq;
            self.next_seq += 1;
            self.entries.insert(key, Entry { value, seq });
        }

        let projected = self.usage();
        let result = if projected > self.capacity {
            Err(KioskError::QuotaExceeded { size: projected })
        } else {
            self.flush()
        };
        if result.is_err() {
            self.entries = before;
            self.next_seq = before_seq;
        }
        result
    }

    fn flush(&self) -> Result<()> {
        let Some(profile) = &self.profile else {
            return Ok(());
        };
        let content = serde_json::to_vec(&self.entries).map_err(KioskError::Serialization)?;
        let dir = profile.parent().unwrap_or(Path::new("."));
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(KioskError::Io)?;
        }
        let tmp = dir.join(format!(".profile-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, &content).map_err(KioskError::Io)?;
        fs::rename(&tmp, profile).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            KioskError::Io(e)
        })?;
        debug!(profile = %profile.display(), bytes = content.len(), "profile flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_quota_rejects_without_mutation() {
        let mut store = LocalStorage::in_memory(20);
        store.set("a", "12345".into()).unwrap();
        let err = store.set("b", "x".repeat(30)).unwrap_err();
        assert!(matches!(err, KioskError::QuotaExceeded { size: 30 }));
        assert_eq!(store.get("b"), None);
        assert_eq!(store.get("a"), Some("12345"));
    }

    #[test]
    fn test_overwrite_accounts_for_replaced_value() {
        let mut store = LocalStorage::in_memory(12);
        store.set("k", "x".repeat(10)).unwrap();
        // 1 + 11 = 12 fits because the old value is released.
        store.set("k", "y".repeat(11)).unwrap();
        assert_eq!(store.usage(), 12);
    }

    #[test]
    fn test_prefix_keys_are_oldest_first() {
        let mut store = LocalStorage::in_memory(1000);
        store.set("pds_file_b", "1".into()).unwrap();
        store.set("pds_faq", "[]".into()).unwrap();
        store.set("pds_file_a", "2".into()).unwrap();
        assert_eq!(
            store.keys_with_prefix("pds_file_"),
            vec!["pds_file_b".to_string(), "pds_file_a".to_string()]
        );
    }

    #[test]
    fn test_profile_persists_between_opens() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("profile.json");
        {
            let mut store = LocalStorage::open(&profile, 1000).unwrap();
            store.set("pds_yayinda", "{}".into()).unwrap();
            store.set("pds_file_x", "QUJD".into()).unwrap();
        }
        let store = LocalStorage::open(&profile, 1000).unwrap();
        assert_eq!(store.get("pds_yayinda"), Some("{}"));
        assert_eq!(store.keys_with_prefix("pds_file_"), vec!["pds_file_x"]);
    }

    #[test]
    fn test_replace_prefixed_is_all_or_nothing() {
        let mut store = LocalStorage::in_memory(40);
        store.set("pds_a", "1".into()).unwrap();
        let result = store.replace_prefixed("pds_", vec![("pds_b".into(), "x".repeat(100))]);
        assert!(result.is_err());
        assert_eq!(store.get("pds_a"), Some("1"));
        assert_eq!(store.get("pds_b"), None);
    }
}
