//! The content behind each publishable module.
//!
//! List modules keep an array document of records. Records are read and
//! rewritten as raw JSON so an entry this crate cannot parse is carried
//! through instead of being dropped by the next write. Org group modules
//! are one entry, keyed by group id, inside `organization_modules`.

use serde_json::{Map, Value};
use std::marker::PhantomData;
use tracing::warn;

use crate::catalog::DocumentName;
use crate::error::{KioskError, Result};
use crate::model::{ModuleKey, OrgGroup, OrgModuleData, Record};
use crate::storage::Storage;

/// Storage operations a publishable module needs.
pub trait Collection {
    type Item;

    fn module(&self) -> ModuleKey;

    fn items(&self, storage: &Storage) -> Vec<Self::Item>;

    fn len(&self, storage: &Storage) -> usize;

    fn is_empty(&self, storage: &Storage) -> bool {
        self.len(storage) == 0
    }

    fn add(&self, storage: &Storage, item: Self::Item) -> Result<()>;

    /// Remove by id. Returns `RecordNotFound` when nothing matched.
    fn delete(&self, storage: &Storage, id: &str) -> Result<()>;

    fn clear(&self, storage: &Storage) -> Result<()>;
}

pub struct ListCollection<R> {
    module: ModuleKey,
    document: DocumentName,
    _record: PhantomData<R>,
}

impl<R: Record> ListCollection<R> {
    pub fn new(module: ModuleKey) -> Self {
        Self {
            module,
            document: DocumentName::for_module(module),
            _record: PhantomData,
        }
    }

    fn raw(&self, storage: &Storage) -> Vec<Value> {
        match storage.read_catalog(self.document) {
            Value::Array(items) => items,
            other => {
                warn!(document = self.document.as_str(), kind = ?other, "collection is not a list, treating as empty");
                Vec::new()
            }
        }
    }

    fn save(&self, storage: &Storage, items: Vec<Value>) -> Result<()> {
        storage.write_document(self.document.as_str(), &Value::Array(items))
    }
}

fn raw_id(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

impl<R: Record> Collection for ListCollection<R> {
    type Item = R;

    fn module(&self) -> ModuleKey {
        self.module
    }

    fn items(&self, storage: &Storage) -> Vec<R> {
        self.raw(storage)
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(document = self.document.as_str(), error = %e, "skipping unreadable record");
                    None
                }
            })
            .collect()
    }

    fn len(&self, storage: &Storage) -> usize {
        self.raw(storage).len()
    }

    fn add(&self, storage: &Storage, record: R) -> Result<()> {
        let mut items = self.raw(storage);
        if items.iter().any(|item| raw_id(item) == Some(record.id())) {
            return Err(KioskError::Api(format!("Duplicate record id: {}", record.id())));
        }
        items.push(serde_json::to_value(&record).map_err(KioskError::Serialization)?);
        self.save(storage, items)
    }

    fn delete(&self, storage: &Storage, id: &str) -> Result<()> {
        let mut items = self.raw(storage);
        let before = items.len();
        items.retain(|item| raw_id(item) != Some(id));
        if items.len() == before {
            return Err(KioskError::RecordNotFound(id.to_string()));
        }
        self.save(storage, items)
    }

    fn clear(&self, storage: &Storage) -> Result<()> {
        self.save(storage, Vec::new())
    }
}

pub struct OrgCollection {
    group: OrgGroup,
}

impl OrgCollection {
    pub fn new(group: OrgGroup) -> Self {
        Self { group }
    }

    pub fn group(&self) -> OrgGroup {
        self.group
    }

    fn modules(&self, storage: &Storage) -> Map<String, Value> {
        match storage.read_catalog(DocumentName::OrganizationModules) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn save(&self, storage: &Storage, modules: Map<String, Value>) -> Result<()> {
        storage.write_document(
            DocumentName::OrganizationModules.as_str(),
            &Value::Object(modules),
        )
    }
}

impl Collection for OrgCollection {
    type Item = OrgModuleData;

    fn module(&self) -> ModuleKey {
        ModuleKey::Org(self.group)
    }

    fn items(&self, storage: &Storage) -> Vec<OrgModuleData> {
        self.modules(storage)
            .remove(self.group.id())
            .and_then(|value| match serde_json::from_value(value) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(group = self.group.id(), error = %e, "unreadable org module");
                    None
                }
            })
            .into_iter()
            .collect()
    }

    fn len(&self, storage: &Storage) -> usize {
        usize::from(self.modules(storage).contains_key(self.group.id()))
    }

    /// An org group holds a single chart; adding replaces it.
    fn add(&self, storage: &Storage, data: OrgModuleData) -> Result<()> {
        let mut modules = self.modules(storage);
        modules.insert(
            self.group.id().to_string(),
            serde_json::to_value(&data).map_err(KioskError::Serialization)?,
        );
        self.save(storage, modules)
    }

    fn delete(&self, storage: &Storage, id: &str) -> Result<()> {
        if id != self.group.id() {
            return Err(KioskError::RecordNotFound(id.to_string()));
        }
        let mut modules = self.modules(storage);
        if modules.remove(id).is_none() {
            return Err(KioskError::RecordNotFound(id.to_string()));
        }
        self.save(storage, modules)
    }

    fn clear(&self, storage: &Storage) -> Result<()> {
        let mut modules = self.modules(storage);
        if modules.remove(self.group.id()).is_none() {
            return Ok(());
        }
        self.save(storage, modules)
    }
}
