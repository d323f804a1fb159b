//! # API Facade
//!
//! A thin dispatcher over the command layer and the single entry point for
//! every kiosk operation, whatever front end drives it.
//!
//! The facade:
//! - **Dispatches** to the matching `commands::*` function
//! - **Resolves inputs** such as the export destination
//! - **Returns structured types** (`Result<CmdResult>`, [`PendingConfirmation`])
//!
//! It never prints, never prompts, and holds no business rules.
//!
//! ## Two-step operations
//!
//! Publish, reset, homepage publish and hiding transfer are split in two:
//! a `request_*` call validates and returns a [`PendingConfirmation`] for
//! the front end to show; the matching `resolve_*` call applies or cancels
//! it. A front end without a human in the loop can resolve immediately with
//! [`Decision::Confirm`].

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::blob::BlobEncoding;
use crate::commands;
use crate::config::KioskConfig;
use crate::error::Result;
use crate::homepage::Board;
use crate::model::ModuleKey;
use crate::storage::Storage;
use crate::workflow::{Decision, PendingConfirmation};

pub use crate::commands::config::ConfigAction;
pub use crate::commands::module::Attachment;
pub use commands::{CmdMessage, CmdResult, KioskPaths, MessageLevel, ModuleStatus};

pub struct KioskApi {
    storage: Storage,
    paths: KioskPaths,
}

impl KioskApi {
    pub fn new(storage: Storage, paths: KioskPaths) -> Self {
        Self { storage, paths }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Create missing catalog documents; failures are only logged.
    pub fn ensure_defaults(&self) {
        commands::init::ensure_defaults(&self.storage)
    }

    pub fn init(&self) -> Result<CmdResult> {
        commands::init::run(&self.storage)
    }

    pub fn status(&self, version: &str) -> Result<CmdResult> {
        commands::status::run(&self.storage, version)
    }

    pub fn get_document(&self, name: &str) -> Result<CmdResult> {
        commands::document::get(&self.storage, name)
    }

    pub fn set_document(&self, name: &str, value: Value) -> Result<CmdResult> {
        commands::document::set(&self.storage, name, value)
    }

    pub fn save_blob(&self, name: &str, data: &str, encoding: BlobEncoding) -> Result<CmdResult> {
        commands::blob::save(&self.storage, name, data, encoding)
    }

    pub fn read_blob(
        &self,
        name: &str,
        encoding: BlobEncoding,
        data_uri: bool,
    ) -> Result<CmdResult> {
        commands::blob::read(&self.storage, name, encoding, data_uri)
    }

    pub fn blob_exists(&self, name: &str) -> Result<CmdResult> {
        commands::blob::exists(&self.storage, name)
    }

    pub fn list_records(&self, key: ModuleKey) -> Result<CmdResult> {
        commands::module::list(&self.storage, key)
    }

    pub fn add_records(
        &self,
        key: ModuleKey,
        input: Value,
        attachment: Option<Attachment>,
    ) -> Result<CmdResult> {
        commands::module::add(&self.storage, key, input, attachment)
    }

    pub fn delete_record(&self, key: ModuleKey, id: &str) -> Result<CmdResult> {
        commands::module::delete(&self.storage, key, id)
    }

    pub fn request_publish(&self, key: ModuleKey) -> Result<PendingConfirmation> {
        commands::module::request_publish(&self.storage, key)
    }

    pub fn request_reset(&self, key: ModuleKey) -> Result<PendingConfirmation> {
        commands::module::request_reset(&self.storage, key)
    }

    pub fn resolve_module(
        &self,
        key: ModuleKey,
        pending: PendingConfirmation,
        decision: Decision,
    ) -> Result<CmdResult> {
        commands::module::resolve(&self.storage, key, pending, decision)
    }

    pub fn list_homepage(&self, board: Board) -> Result<CmdResult> {
        commands::homepage::list(&self.storage, board)
    }

    pub fn add_homepage_item(
        &self,
        board: Board,
        title: &str,
        date: &str,
        extra: Map<String, Value>,
        image: Option<Attachment>,
    ) -> Result<CmdResult> {
        commands::homepage::add(&self.storage, board, title, date, extra, image)
    }

    pub fn delete_homepage_item(&self, board: Board, id: &str) -> Result<CmdResult> {
        commands::homepage::delete(&self.storage, board, id)
    }

    pub fn request_homepage_publish(&self) -> Result<PendingConfirmation> {
        commands::homepage::request_publish_all(&self.storage)
    }

    pub fn resolve_homepage_publish(
        &self,
        pending: PendingConfirmation,
        decision: Decision,
    ) -> Result<CmdResult> {
        commands::homepage::resolve(&self.storage, pending, decision)
    }

    /// Export into `dest`, else the configured export directory, else the
    /// default one.
    pub fn export(&self, dest: Option<&Path>) -> Result<CmdResult> {
        let dir = self.export_dir(dest);
        commands::transfer::export(&self.storage, &dir)
    }

    pub fn import(&self, source: Option<&Path>) -> Result<CmdResult> {
        commands::transfer::import(&self.storage, source)
    }

    pub fn request_hide_transfer(&self) -> PendingConfirmation {
        commands::transfer::request_hide()
    }

    pub fn resolve_hide_transfer(
        &self,
        pending: PendingConfirmation,
        decision: Decision,
    ) -> Result<CmdResult> {
        commands::transfer::resolve_hide(&self.storage, pending, decision)
    }

    pub fn show_transfer(&self) -> Result<CmdResult> {
        commands::transfer::show(&self.storage)
    }

    pub fn clear_publish_status(&self, secret: &str) -> Result<CmdResult> {
        commands::admin::clear(&self.storage, secret)
    }

    pub fn config(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&self.paths, action)
    }

    fn export_dir(&self, dest: Option<&Path>) -> PathBuf {
        if let Some(dest) = dest {
            return dest.to_path_buf();
        }
        KioskConfig::load(&self.paths.config_dir)
            .ok()
            .and_then(|c| c.export_dir)
            .unwrap_or_else(|| self.paths.default_export_dir.clone())
    }
}
