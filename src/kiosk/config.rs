use crate::error::{KioskError, Result};
use crate::store::web_backend::{DEFAULT_MAX_FILE_BYTES, DEFAULT_QUOTA_BYTES};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILENAME: &str = "config.json";

/// Which storage backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Native if the data directory is writable, web otherwise.
    #[default]
    Auto,
    Native,
    Web,
}

impl FromStr for BackendChoice {
    type Err = KioskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendChoice::Auto),
            "native" | "fs" => Ok(BackendChoice::Native),
            "web" | "browser" => Ok(BackendChoice::Web),
            other => Err(KioskError::Api(format!("Unknown backend: {}", other))),
        }
    }
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendChoice::Auto => f.write_str("auto"),
            BackendChoice::Native => f.write_str("native"),
            BackendChoice::Web => f.write_str("web"),
        }
    }
}

/// Configuration for the kiosk store, stored in `config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KioskConfig {
    #[serde(default)]
    pub backend: BackendChoice,

    /// Overrides the platform data directory for the native backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Where exports are written when no destination is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,

    #[serde(default = "default_quota")]
    pub web_quota_bytes: usize,

    #[serde(default = "default_max_file")]
    pub web_max_file_bytes: usize,
}

fn default_quota() -> usize {
    DEFAULT_QUOTA_BYTES
}

fn default_max_file() -> usize {
    DEFAULT_MAX_FILE_BYTES
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::Auto,
            data_dir: None,
            export_dir: None,
            web_quota_bytes: DEFAULT_QUOTA_BYTES,
            web_max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl KioskConfig {
    pub const KEYS: [&'static str; 5] = [
        "backend",
        "data_dir",
        "export_dir",
        "web_quota_bytes",
        "web_max_file_bytes",
    ];

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(KioskError::Io)?;
        let config: KioskConfig =
            serde_json::from_str(&content).map_err(KioskError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(KioskError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(KioskError::Serialization)?;
        fs::write(config_path, content).map_err(KioskError::Io)?;
        Ok(())
    }

    /// Display value of a key, `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<String> {
        let unset = || "(unset)".to_string();
        match key {
            "backend" => Some(self.backend.to_string()),
            "data_dir" => Some(
                self.data_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(unset),
            ),
            "export_dir" => Some(
                self.export_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(unset),
            ),
            "web_quota_bytes" => Some(self.web_quota_bytes.to_string()),
            "web_max_file_bytes" => Some(self.web_max_file_bytes.to_string()),
            _ => None,
        }
    }

    /// Set a key from its string form. An empty value unsets path keys.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        let path = |v: &str| {
            if v.is_empty() {
                None
            } else {
                Some(PathBuf::from(v))
            }
        };
        let bytes = |v: &str| {
            v.parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("{} must be a positive number of bytes", key))
        };
        match key {
            "backend" => self.backend = value.parse().map_err(|e: KioskError| e.to_string())?,
            "data_dir" => self.data_dir = path(value),
            "export_dir" => self.export_dir = path(value),
            "web_quota_bytes" => self.web_quota_bytes = bytes(value)?,
            "web_max_file_bytes" => self.web_max_file_bytes = bytes(value)?,
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}
