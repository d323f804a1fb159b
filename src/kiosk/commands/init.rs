use tracing::{info, warn};

use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::storage::Storage;

/// First-run setup done before any data command: create whatever catalog
/// document is missing. A failure is logged and the command still runs on
/// read defaults.
pub fn ensure_defaults(storage: &Storage) {
    match storage.initialize_defaults() {
        Ok(report) if !report.created.is_empty() => {
            info!(created = ?report.created, "created missing documents");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not create missing documents"),
    }
}

pub fn run(storage: &Storage) -> Result<CmdResult> {
    let report = storage.initialize_defaults()?;
    let mut result = CmdResult::default();
    for name in &report.created {
        result.add_message(CmdMessage::info(format!("Created {}", name)));
    }
    result.add_message(CmdMessage::success(format!(
        "Initialized {} store at {} ({} created, {} existing)",
        storage.platform(),
        storage.location(),
        report.created.len(),
        report.existing.len()
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use crate::store::StorageBackend;

    #[test]
    fn test_second_run_creates_nothing() {
        let storage = Storage::with_backend(MemBackend::new());
        let first = run(&storage).unwrap();
        assert_eq!(first.messages.len(), 10);
        let second = run(&storage).unwrap();
        assert_eq!(second.messages.len(), 1);
        assert!(second.messages[0].content.contains("0 created, 9 existing"));
    }

    #[test]
    fn test_ensure_defaults_creates_ledger() {
        let storage = Storage::with_backend(MemBackend::new());
        ensure_defaults(&storage);
        assert_eq!(
            storage.backend().read_document("yayinda").unwrap(),
            Some(crate::catalog::default_ledger())
        );
        ensure_defaults(&storage);
        assert!(run(&storage).unwrap().messages[0]
            .content
            .contains("0 created, 9 existing"));
    }
}
