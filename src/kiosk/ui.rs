//! Persisted UI switches in `ui_config`.
//!
//! The only switch the core cares about is transfer visibility. Hiding the
//! transfer buttons puts the kiosk in live mode: export and import are
//! refused until transfer is shown again.

use serde_json::{Map, Value};
use tracing::info;

use crate::catalog::DocumentName;
use crate::error::{KioskError, Result};
use crate::storage::Storage;
use crate::workflow::{Decision, PendingAction, PendingConfirmation, WorkflowOutcome};

const SHOW_TRANSFER: &str = "showTransferButtons";

pub fn transfer_visible(storage: &Storage) -> bool {
    storage
        .read_catalog(DocumentName::UiConfig)
        .get(SHOW_TRANSFER)
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

/// Fails with `TransferDisabled` while the kiosk is in live mode.
pub fn ensure_transfer_enabled(storage: &Storage) -> Result<()> {
    if transfer_visible(storage) {
        Ok(())
    } else {
        Err(KioskError::TransferDisabled)
    }
}

/// Update the switch, keeping any other UI settings.
pub fn set_transfer_visible(storage: &Storage, visible: bool) -> Result<()> {
    let mut config = match storage.read_catalog(DocumentName::UiConfig) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    config.insert(SHOW_TRANSFER.to_string(), Value::Bool(visible));
    storage.write_document(DocumentName::UiConfig.as_str(), &Value::Object(config))?;
    info!(visible, "transfer visibility changed");
    Ok(())
}

pub fn request_hide_transfer() -> PendingConfirmation {
    PendingConfirmation::new(
        PendingAction::HideTransfer,
        DocumentName::UiConfig.as_str(),
        "Hide import/export? The kiosk switches to live mode and transfers stay disabled until shown again.",
    )
}

pub fn resolve_hide_transfer(
    storage: &Storage,
    pending: PendingConfirmation,
    decision: Decision,
) -> Result<WorkflowOutcome> {
    if pending.action != PendingAction::HideTransfer {
        return Err(KioskError::Confirmation(format!(
            "{} is not a transfer request",
            pending.action
        )));
    }
    if decision == Decision::Cancel {
        return Ok(WorkflowOutcome::Cancelled);
    }
    set_transfer_visible(storage, false)?;
    Ok(WorkflowOutcome::Applied)
}
