use thiserror::Error;

#[derive(Error, Debug)]
pub enum KioskError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// The payload exceeds the per-file ceiling of the active backend.
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: usize, limit: usize },

    /// The backend ran out of space even after evicting old files.
    #[error("Storage quota exceeded while writing {size} bytes")]
    QuotaExceeded { size: usize },

    #[error("Storage write failed for {size} bytes")]
    StorageFailed { size: usize },

    /// The write was acknowledged but reading it back showed a different value.
    #[error("Verification failed for {key}: expected {expected}, found {found:?}")]
    VerificationFailed {
        key: String,
        expected: bool,
        found: Option<bool>,
    },

    #[error("Module {0} is published and can no longer be modified")]
    ModulePublished(String),

    #[error("Module {0} has no content to publish")]
    EmptyCollection(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Confirmation error: {0}")]
    Confirmation(String),

    #[error("Access denied: invalid developer secret")]
    Unauthorized,

    #[error("Import/export is disabled while the kiosk is in live mode")]
    TransferDisabled,

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl KioskError {
    /// True for the two capacity conditions of the browser backend.
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            KioskError::FileTooLarge { .. } | KioskError::QuotaExceeded { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, KioskError>;
