use serde_json::{Map, Value};

use crate::blob;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{KioskError, Result};
use crate::model::{new_record_id, upload_date_today, ModuleKey};
use crate::storage::Storage;
use crate::workflow::{open_module, Decision, PendingConfirmation, WorkflowOutcome};

/// An uploaded file to store alongside a new record.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

fn blob_prefix(key: ModuleKey) -> Option<&'static str> {
    match key {
        ModuleKey::Training => Some("training"),
        ModuleKey::Procedures => Some("procedure"),
        _ => None,
    }
}

/// `1.5 KB`, `2.30 MB`
fn human_size(bytes: usize) -> String {
    let bytes = bytes as f64;
    if bytes < 1024.0 * 1024.0 {
        format!("{:.1} KB", bytes / 1024.0)
    } else {
        format!("{:.2} MB", bytes / (1024.0 * 1024.0))
    }
}

pub fn list(storage: &Storage, key: ModuleKey) -> Result<CmdResult> {
    let module = open_module(storage, key);
    let records = module.records()?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::info(format!(
        "{} ({}): {} record(s), {}",
        key.alias(),
        key,
        records.len(),
        if module.is_published() { "published" } else { "draft" }
    )));
    Ok(result.with_records(records))
}

/// Add one record (an object) or a bulk upload (an array of objects).
///
/// Missing `id`s are generated from the current time, with a `_<n>` suffix
/// in bulk uploads; a missing `uploadDate` becomes today. An attachment is
/// stored first and referenced from the record.
pub fn add(
    storage: &Storage,
    key: ModuleKey,
    input: Value,
    attachment: Option<Attachment>,
) -> Result<CmdResult> {
    let module = open_module(storage, key);
    if module.is_published() {
        return Err(KioskError::ModulePublished(key.to_string()));
    }

    let objects: Vec<Map<String, Value>> = match input {
        Value::Object(map) => vec![map],
        Value::Array(items) if !matches!(key, ModuleKey::Org(_)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                _ => Err(KioskError::Api("Every record must be a JSON object".to_string())),
            })
            .collect::<Result<_>>()?,
        _ => {
            return Err(KioskError::Api(format!(
                "{} expects a JSON object{}",
                key.alias(),
                if matches!(key, ModuleKey::Org(_)) { "" } else { " or an array of objects" }
            )))
        }
    };
    if objects.is_empty() {
        return Err(KioskError::Api("Nothing to add".to_string()));
    }
    if attachment.is_some() && (objects.len() != 1 || blob_prefix(key).is_none()) {
        return Err(KioskError::Api(format!(
            "{} does not take a file attachment here",
            key.alias()
        )));
    }

    let base_id = new_record_id();
    let bulk = objects.len() > 1;
    let mut result = CmdResult::default();

    for (index, mut record) in objects.into_iter().enumerate() {
        if !matches!(key, ModuleKey::Org(_)) && !record.contains_key("id") {
            let id = if bulk {
                format!("{}_{}", base_id, index)
            } else {
                base_id.clone()
            };
            record.insert("id".to_string(), Value::String(id));
        }
        record
            .entry("uploadDate")
            .or_insert_with(|| Value::String(upload_date_today()));

        if let (Some(file), Some(prefix)) = (&attachment, blob_prefix(key)) {
            let id = record.get("id").and_then(Value::as_str);
            let name = blob::generate_name(prefix, id, &file.file_name);
            storage.save_blob_bytes(&name, &file.bytes)?;
            record.insert("fileUrl".to_string(), Value::String(name.clone()));
            record.insert("fileName".to_string(), Value::String(file.file_name.clone()));
            record.insert("fileSize".to_string(), Value::String(human_size(file.bytes.len())));
            result.add_message(CmdMessage::info(format!("Stored file {}", name)));
        }

        let label = record
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| key.alias());
        module.add_value(Value::Object(record))?;
        result.add_message(CmdMessage::success(format!("Added {} to {}", label, key.alias())));
    }
    Ok(result)
}

pub fn delete(storage: &Storage, key: ModuleKey, id: &str) -> Result<CmdResult> {
    open_module(storage, key).delete(id)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Deleted {} from {}",
        id,
        key.alias()
    )));
    Ok(result)
}

pub fn request_publish(storage: &Storage, key: ModuleKey) -> Result<PendingConfirmation> {
    open_module(storage, key).request_publish()
}

pub fn request_reset(storage: &Storage, key: ModuleKey) -> Result<PendingConfirmation> {
    Ok(open_module(storage, key).request_reset())
}

pub fn resolve(
    storage: &Storage,
    key: ModuleKey,
    pending: PendingConfirmation,
    decision: Decision,
) -> Result<CmdResult> {
    let outcome = open_module(storage, key).resolve(pending, decision)?;
    let mut result = CmdResult::default();
    match &outcome {
        WorkflowOutcome::Published => result.add_message(CmdMessage::success(format!(
            "{} is now published",
            key.alias()
        ))),
        WorkflowOutcome::Reset => result.add_message(CmdMessage::success(format!(
            "{} was reset and is unpublished",
            key.alias()
        ))),
        WorkflowOutcome::ResetInconsistent { cause } => {
            result.add_message(CmdMessage::error(format!(
                "{} content was cleared but it is still marked published: {}",
                key.alias(),
                cause
            )))
        }
        WorkflowOutcome::Applied => {}
        WorkflowOutcome::Cancelled => result.add_message(CmdMessage::info("Cancelled")),
    }
    Ok(result.with_outcome(outcome))
}
