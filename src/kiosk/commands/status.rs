use crate::commands::{CmdMessage, CmdResult, ModuleStatus};
use crate::error::Result;
use crate::storage::Storage;
use crate::ui;
use crate::workflow::open_module;

pub fn modules(storage: &Storage) -> Vec<ModuleStatus> {
    storage
        .ledger()
        .snapshot()
        .into_iter()
        .map(|(key, published)| ModuleStatus {
            key,
            published,
            records: open_module(storage, key).len(),
        })
        .collect()
}

/// Application info plus the state of every module.
pub fn run(storage: &Storage, version: &str) -> Result<CmdResult> {
    let statuses = modules(storage);
    let published = statuses.iter().filter(|m| m.published).count();

    let mut result = CmdResult::default().with_modules(statuses);
    result.add_message(CmdMessage::info(format!("kiosk {}", version)));
    result.add_message(CmdMessage::info(format!(
        "Storage: {} ({})",
        storage.platform(),
        storage.location()
    )));
    if !ui::transfer_visible(storage) {
        result.add_message(CmdMessage::warning(
            "Live mode: import/export is disabled",
        ));
    }
    result.add_message(CmdMessage::info(format!(
        "{} of {} modules published",
        published,
        result.modules.len()
    )));
    Ok(result)
}
