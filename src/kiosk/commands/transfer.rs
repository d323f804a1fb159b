use std::path::Path;

use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::storage::Storage;
use crate::transfer::{self, ImportOutcome};
use crate::ui;
use crate::workflow::{Decision, PendingConfirmation, WorkflowOutcome};

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

pub fn export(storage: &Storage, dest_dir: &Path) -> Result<CmdResult> {
    ui::ensure_transfer_enabled(storage)?;
    let report = transfer::export_all(storage, dest_dir)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Exported {} document(s) and {} file(s) to {} ({})",
        report.documents,
        report.blobs,
        report.path.display(),
        format_bytes(report.bytes)
    )));
    result.export = Some(report);
    Ok(result)
}

/// Replace everything with a backup. `None` means the operator picked no
/// file.
pub fn import(storage: &Storage, source: Option<&Path>) -> Result<CmdResult> {
    ui::ensure_transfer_enabled(storage)?;
    let mut result = CmdResult::default();
    match transfer::import_all(storage, source)? {
        ImportOutcome::Cancelled => {
            result.add_message(CmdMessage::info("No file chosen, nothing imported"));
        }
        ImportOutcome::Imported(report) => {
            if report.ledger_synthesized {
                result.add_message(CmdMessage::warning(
                    "Backup had no publish ledger; all modules start unpublished",
                ));
            }
            result.add_message(CmdMessage::success(format!(
                "Imported {} document(s) and {} file(s) from a .{} backup",
                report.documents,
                report.blobs,
                report.format.extension()
            )));
            let published = if report.published.is_empty() {
                "none".to_string()
            } else {
                report
                    .published
                    .iter()
                    .map(|k| k.alias())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            result.add_message(CmdMessage::info(format!("Published modules: {}", published)));
            result.import = Some(report);
        }
    }
    Ok(result)
}

pub fn request_hide() -> PendingConfirmation {
    ui::request_hide_transfer()
}

pub fn resolve_hide(
    storage: &Storage,
    pending: PendingConfirmation,
    decision: Decision,
) -> Result<CmdResult> {
    let outcome = ui::resolve_hide_transfer(storage, pending, decision)?;
    let mut result = CmdResult::default();
    match outcome {
        WorkflowOutcome::Applied => result.add_message(CmdMessage::success(
            "Import/export hidden; the kiosk is in live mode",
        )),
        WorkflowOutcome::Cancelled => result.add_message(CmdMessage::info("Cancelled")),
        _ => {}
    }
    Ok(result.with_outcome(outcome))
}

pub fn show(storage: &Storage) -> Result<CmdResult> {
    ui::set_transfer_visible(storage, true)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success("Import/export enabled"));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KioskError;
    use crate::store::mem_backend::MemBackend;
    use tempfile::TempDir;

    #[test]
    fn test_live_mode_blocks_transfer() {
        let storage = Storage::with_backend(MemBackend::new());
        let dir = TempDir::new().unwrap();
        resolve_hide(&storage, request_hide(), Decision::Confirm).unwrap();

        assert!(matches!(
            export(&storage, dir.path()),
            Err(KioskError::TransferDisabled)
        ));
        assert!(matches!(
            import(&storage, None),
            Err(KioskError::TransferDisabled)
        ));

        show(&storage).unwrap();
        let result = export(&storage, dir.path()).unwrap();
        assert!(result.export.unwrap().path.exists());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }
}
