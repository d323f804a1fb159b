use serde_json::Value;

use crate::catalog::{default_for, validate_document_name, LEDGER};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{KioskError, Result};
use crate::storage::Storage;

/// Read a document; catalog names fall back to their default shape,
/// anything else to `null`.
pub fn get(storage: &Storage, name: &str) -> Result<CmdResult> {
    validate_document_name(name)?;
    Ok(CmdResult::default().with_document(storage.read_document(name, default_for(name))))
}

/// Overwrite a document. The ledger is only changed through publish,
/// reset, import and the developer tools.
pub fn set(storage: &Storage, name: &str, value: Value) -> Result<CmdResult> {
    validate_document_name(name)?;
    if name == LEDGER {
        return Err(KioskError::Api(
            "The publish ledger cannot be written directly".to_string(),
        ));
    }
    storage.write_document(name, &value)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Saved {}", name)));
    Ok(result)
}
