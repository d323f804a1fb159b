//! The fixed catalog of persisted documents and their default shapes.

use serde_json::{json, Map, Value};

use crate::error::{KioskError, Result};
use crate::model::ModuleKey;

/// Name of the publish ledger document.
pub const LEDGER: &str = "yayinda";

/// Reserved top-level entry holding blobs in exported archives.
pub const FILES_ENTRY: &str = "files";

/// Document names may not start with this; web storage keys blobs under it.
pub const BLOB_KEY_SPACE: &str = "file_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentName {
    Ledger,
    TrainingMaterials,
    ProcessFlows,
    Faq,
    Procedures,
    OrganizationModules,
    UiConfig,
    HomepageNews,
    HomepageValues,
}

impl DocumentName {
    pub const ALL: [DocumentName; 9] = [
        DocumentName::Ledger,
        DocumentName::TrainingMaterials,
        DocumentName::ProcessFlows,
        DocumentName::Faq,
        DocumentName::Procedures,
        DocumentName::OrganizationModules,
        DocumentName::UiConfig,
        DocumentName::HomepageNews,
        DocumentName::HomepageValues,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentName::Ledger => LEDGER,
            DocumentName::TrainingMaterials => "training_materials",
            DocumentName::ProcessFlows => "process_flows",
            DocumentName::Faq => "faq_data",
            DocumentName::Procedures => "procedures_instructions",
            DocumentName::OrganizationModules => "organization_modules",
            DocumentName::UiConfig => "ui_config",
            DocumentName::HomepageNews => "guncel_gelismeler",
            DocumentName::HomepageValues => "kurumsal_degerler",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == name)
    }

    /// The value a fresh installation starts with.
    pub fn default_value(&self) -> Value {
        match self {
            DocumentName::Ledger => default_ledger(),
            DocumentName::OrganizationModules => Value::Object(Map::new()),
            DocumentName::UiConfig => json!({ "showTransferButtons": true }),
            DocumentName::TrainingMaterials
            | DocumentName::ProcessFlows
            | DocumentName::Faq
            | DocumentName::Procedures
            | DocumentName::HomepageNews
            | DocumentName::HomepageValues => Value::Array(Vec::new()),
        }
    }

    /// The list collection that backs a ledger-published feature module.
    pub fn for_module(key: ModuleKey) -> DocumentName {
        match key {
            ModuleKey::Org(_) => DocumentName::OrganizationModules,
            ModuleKey::Training => DocumentName::TrainingMaterials,
            ModuleKey::Faq => DocumentName::Faq,
            ModuleKey::ProcessFlows => DocumentName::ProcessFlows,
            ModuleKey::Procedures => DocumentName::Procedures,
        }
    }
}

/// Every known module key set to `false`.
pub fn default_ledger() -> Value {
    let entries: Map<String, Value> = ModuleKey::all()
        .into_iter()
        .map(|k| (k.as_str().to_string(), Value::Bool(false)))
        .collect();
    Value::Object(entries)
}

/// Default for an arbitrary name: the catalog default, or `Null` for names
/// outside the catalog.
pub fn default_for(name: &str) -> Value {
    DocumentName::from_name(name)
        .map(|d| d.default_value())
        .unwrap_or(Value::Null)
}

/// Document and blob names become file names and storage keys, so they are
/// restricted to a flat, portable character set.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 200
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(KioskError::InvalidName(name.to_string()))
    }
}

/// Document names additionally may not collide with the archive's blob
/// subtree or the web blob key space, or carry an extension.
pub fn validate_document_name(name: &str) -> Result<()> {
    validate_name(name)?;
    if name == FILES_ENTRY || name.starts_with(BLOB_KEY_SPACE) || name.contains('.') {
        return Err(KioskError::InvalidName(name.to_string()));
    }
    Ok(())
}
