//! The publish ledger: one `yayinda` document mapping module key to a
//! published flag.
//!
//! Every update is a read-modify-write of the whole document, serialized by
//! the storage's ledger lock and followed by a read back. A write the
//! backend acknowledged but did not keep is reported as
//! [`KioskError::VerificationFailed`], never as success.
//!
//! Keys the ledger does not know about are carried through untouched.

use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::catalog::LEDGER;
use crate::error::{KioskError, Result};
use crate::model::ModuleKey;
use crate::storage::Storage;
use crate::store::StorageBackend;

pub struct PublishLedger<'a> {
    storage: &'a Storage,
}

impl<'a> PublishLedger<'a> {
    pub(crate) fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Current ledger with every known key present.
    fn load(&self) -> Map<String, Value> {
        let mut entries = match self.storage.read_document(LEDGER, Value::Null) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for key in ModuleKey::all() {
            entries
                .entry(key.as_str())
                .or_insert(Value::Bool(false));
        }
        entries
    }

    pub fn is_published(&self, key: ModuleKey) -> bool {
        self.load()
            .get(key.as_str())
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// State of every known key, in ledger order.
    pub fn snapshot(&self) -> Vec<(ModuleKey, bool)> {
        let entries = self.load();
        ModuleKey::all()
            .into_iter()
            .map(|key| {
                let published = entries
                    .get(key.as_str())
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                (key, published)
            })
            .collect()
    }

    /// Set one key and verify it by reading the ledger back.
    pub fn set_module_published(&self, key: ModuleKey, published: bool) -> Result<()> {
        self.update(&[key], published)?;
        info!(module = %key, published, "ledger updated");
        Ok(())
    }

    /// Administrative reset of the given keys back to unpublished.
    pub fn reset(&self, keys: &[ModuleKey]) -> Result<()> {
        self.update(keys, false)?;
        info!(count = keys.len(), "ledger keys reset");
        Ok(())
    }

    pub fn reset_all(&self) -> Result<()> {
        self.reset(&ModuleKey::all())
    }

    fn update(&self, keys: &[ModuleKey], published: bool) -> Result<()> {
        let _guard = self.storage.ledger_lock.lock();

        let mut entries = self.load();
        for key in keys {
            entries.insert(key.as_str().to_string(), Value::Bool(published));
        }
        self.storage
            .write_document(LEDGER, &Value::Object(entries))?;

        let stored = match self.storage.backend().read_document(LEDGER) {
            Ok(Some(Value::Object(map))) => Some(map),
            Ok(_) => None,
            Err(e) => {
                error!(error = %e, "ledger read back failed");
                None
            }
        };
        for key in keys {
            let found = stored
                .as_ref()
                .and_then(|map| map.get(key.as_str()))
                .and_then(Value::as_bool);
            if found != Some(published) {
                error!(module = %key, expected = published, ?found, "ledger verification failed");
                return Err(KioskError::VerificationFailed {
                    key: key.as_str().to_string(),
                    expected: published,
                    found,
                });
            }
        }
        debug!(count = keys.len(), "ledger write verified");
        Ok(())
    }
}
