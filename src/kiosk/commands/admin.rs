use crate::admin::AdminSession;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::storage::Storage;

/// Unlock the developer tools and clear all publish state.
pub fn clear(storage: &Storage, secret: &str) -> Result<CmdResult> {
    let report = AdminSession::unlock(storage, secret)?.clear_publish_status()?;
    let mut result = CmdResult::default();
    if report.modules_reset.is_empty() {
        result.add_message(CmdMessage::info("No module was published"));
    } else {
        let names: Vec<String> = report.modules_reset.iter().map(|k| k.alias()).collect();
        result.add_message(CmdMessage::info(format!("Unpublished: {}", names.join(", "))));
    }
    if report.homepage_items_unpublished > 0 {
        result.add_message(CmdMessage::info(format!(
            "{} homepage item(s) unpublished",
            report.homepage_items_unpublished
        )));
    }
    if report.transfer_restored {
        result.add_message(CmdMessage::info("Import/export shown again"));
    }
    result.add_message(CmdMessage::success("Publish status cleared"));
    Ok(result)
}
