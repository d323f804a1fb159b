use serde_json::Value;
use std::path::PathBuf;

use crate::config::KioskConfig;
use crate::model::ModuleKey;
use crate::transfer::{ExportReport, ImportReport};
use crate::workflow::WorkflowOutcome;

pub mod admin;
pub mod blob;
pub mod config;
pub mod document;
pub mod homepage;
pub mod init;
pub mod module;
pub mod status;
pub mod transfer;

/// Directories the commands need besides the store itself.
#[derive(Debug, Clone)]
pub struct KioskPaths {
    pub config_dir: PathBuf,
    /// Export destination when neither the caller nor the config names one.
    pub default_export_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// One row of the module status listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleStatus {
    pub key: ModuleKey,
    pub published: bool,
    pub records: usize,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub document: Option<Value>,
    pub records: Vec<Value>,
    pub modules: Vec<ModuleStatus>,
    pub blob: Option<String>,
    pub config: Option<KioskConfig>,
    pub outcome: Option<WorkflowOutcome>,
    pub export: Option<ExportReport>,
    pub import: Option<ImportReport>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_document(mut self, document: Value) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_records(mut self, records: Vec<Value>) -> Self {
        self.records = records;
        self
    }

    pub fn with_modules(mut self, modules: Vec<ModuleStatus>) -> Self {
        self.modules = modules;
        self
    }

    pub fn with_blob(mut self, blob: String) -> Self {
        self.blob = Some(blob);
        self
    }

    pub fn with_config(mut self, config: KioskConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_outcome(mut self, outcome: WorkflowOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }
}
