use crate::commands::{CmdMessage, CmdResult, KioskPaths};
use crate::config::KioskConfig;
use crate::error::Result;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(paths: &KioskPaths, action: ConfigAction) -> Result<CmdResult> {
    let dir = &paths.config_dir;
    match action {
        ConfigAction::ShowAll => {
            let config = KioskConfig::load(dir)?;
            Ok(CmdResult::default().with_config(config))
        }
        ConfigAction::ShowKey(key) => {
            let config = KioskConfig::load(dir)?;
            let mut result = CmdResult::default();
            match config.get(&key) {
                Some(val) => result.add_message(CmdMessage::info(val)),
                None => {
                    result.add_message(CmdMessage::error(format!("Unknown config key: {}", key)))
                }
            }
            Ok(result)
        }
        ConfigAction::Set(key, value) => {
            let mut config = KioskConfig::load(dir)?;
            if let Err(e) = config.set(&key, &value) {
                let mut res = CmdResult::default();
                res.add_message(CmdMessage::error(e));
                return Ok(res);
            }
            config.save(dir)?;
            let display_val = config.get(&key).unwrap_or_else(|| value.clone());
            let mut result = CmdResult::default().with_config(config);
            result.add_message(CmdMessage::success(format!(
                "{} set to {}",
                key, display_val
            )));
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendChoice;
    use tempfile::tempdir;

    fn make_paths(dir: &std::path::Path) -> KioskPaths {
        KioskPaths {
            config_dir: dir.to_path_buf(),
            default_export_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn show_all_returns_default_config_when_no_file() {
        let temp = tempdir().unwrap();
        let result = run(&make_paths(temp.path()), ConfigAction::ShowAll).unwrap();
        assert_eq!(result.config.unwrap().backend, BackendChoice::Auto);
    }

    #[test]
    fn set_persists_and_reports() {
        let temp = tempdir().unwrap();
        let paths = make_paths(temp.path());
        let result = run(
            &paths,
            ConfigAction::Set("backend".to_string(), "native".to_string()),
        )
        .unwrap();
        assert_eq!(result.messages[0].content, "backend set to native");

        let result = run(&paths, ConfigAction::ShowKey("backend".to_string())).unwrap();
        assert_eq!(result.messages[0].content, "native");
    }

    #[test]
    fn invalid_value_is_reported_not_saved() {
        let temp = tempdir().unwrap();
        let paths = make_paths(temp.path());
        let result = run(
            &paths,
            ConfigAction::Set("web_quota_bytes".to_string(), "0".to_string()),
        )
        .unwrap();
        assert!(matches!(result.messages[0].level, crate::commands::MessageLevel::Error));
        assert!(!temp.path().join("config.json").exists());
    }
}
