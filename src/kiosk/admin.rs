//! Developer tools, unlocked with a shared secret.

use tracing::{info, warn};

use crate::error::{KioskError, Result};
use crate::homepage::Homepage;
use crate::model::ModuleKey;
use crate::storage::Storage;
use crate::ui;

const DEVELOPER_SECRETS: [&str; 2] = ["admin123", "dev2024"];

/// What a clear changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    pub modules_reset: Vec<ModuleKey>,
    pub homepage_items_unpublished: usize,
    pub transfer_restored: bool,
}

pub struct AdminSession<'a> {
    storage: &'a Storage,
}

impl<'a> AdminSession<'a> {
    pub fn unlock(storage: &'a Storage, secret: &str) -> Result<Self> {
        if !DEVELOPER_SECRETS.contains(&secret) {
            warn!("developer tools unlock refused");
            return Err(KioskError::Unauthorized);
        }
        Ok(Self { storage })
    }

    /// Return the kiosk to authoring mode: every module unpublished, every
    /// homepage item unpublished, transfer shown again. Content is kept.
    pub fn clear_publish_status(&self) -> Result<ClearReport> {
        let modules_reset = self
            .storage
            .ledger()
            .snapshot()
            .into_iter()
            .filter_map(|(key, published)| published.then_some(key))
            .collect();
        self.storage.ledger().reset_all()?;

        let homepage_items_unpublished = Homepage::new(self.storage).set_all_published(false)?;

        let transfer_restored = !ui::transfer_visible(self.storage);
        ui::set_transfer_visible(self.storage, true)?;

        info!("publish status cleared");
        Ok(ClearReport {
            modules_reset,
            homepage_items_unpublished,
            transfer_restored,
        })
    }
}
