use super::{Platform, Snapshot, StorageBackend};
use crate::catalog::{validate_document_name, validate_name};
use crate::error::{KioskError, Result};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const FILES_DIR: &str = "files";
const BACKUP_SUFFIX: &str = ".backup";

/// Native file-system backend.
pub struct FsBackend {
    root: PathBuf,
    simulate_torn_write: AtomicBool,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            simulate_torn_write: AtomicBool::new(false),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Make the next document write fail halfway through, leaving a
    /// truncated primary file behind, to exercise the backup restore.
    pub fn set_simulate_torn_write(&self, simulate: bool) {
        self.simulate_torn_write.store(simulate, Ordering::SeqCst);
    }

    fn files_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }

    fn document_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name))
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut os = path.as_os_str().to_owned();
        os.push(BACKUP_SUFFIX);
        PathBuf::from(os)
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(KioskError::Io)?;
        }
        Ok(())
    }

    /// Write to a temp sibling, fsync, then rename over the target.
    fn write_atomic(&self, target: &Path, content: &[u8]) -> io::Result<()> {
        let dir = target.parent().unwrap_or(&self.root);
        let tmp = dir.join(format!(".kiosk-{}.tmp", Uuid::new_v4()));

        let written = (|| {
            let mut file = File::create(&tmp)?;
            file.write_all(content)?;
            file.sync_all()?;
            fs::rename(&tmp, target)
        })();

        if written.is_err() && tmp.exists() {
            let _ = fs::remove_file(&tmp);
        }
        written
    }

    fn write_primary(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        if self.simulate_torn_write.swap(false, Ordering::SeqCst) {
            fs::write(path, &content[..content.len() / 2])?;
            return Err(io::Error::other("simulated torn write"));
        }
        self.write_atomic(path, content)
    }

    fn restore_from_backup(&self, path: &Path) {
        let backup = Self::backup_path(path);
        if !backup.exists() {
            return;
        }
        match fs::copy(&backup, path) {
            Ok(_) => info!(path = %path.display(), "restored document from backup"),
            Err(e) => error!(path = %path.display(), error = %e, "backup restore failed"),
        }
    }

    fn apply(&self, snapshot: &Snapshot) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(KioskError::Io)?;
        }
        fs::create_dir_all(self.files_dir()).map_err(KioskError::Io)?;

        for (name, value) in &snapshot.documents {
            self.write_document(name, value)?;
        }
        for (name, bytes) in &snapshot.blobs {
            self.write_blob(name, bytes)?;
        }
        Ok(())
    }

    fn roll_back(&self, staging: &Path, had_data: bool) -> io::Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        if had_data {
            copy_dir_recursive(staging, &self.root)
        } else {
            fs::create_dir_all(&self.root)
        }
    }
}

impl StorageBackend for FsBackend {
    fn platform(&self) -> Platform {
        Platform::Native
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn prepare(&self) -> Result<()> {
        self.ensure_dir(&self.files_dir())
    }

    fn read_document(&self, name: &str) -> Result<Option<Value>> {
        validate_document_name(name)?;
        let path = self.document_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(KioskError::Io)?;
        let value = serde_json::from_str(&content).map_err(KioskError::Serialization)?;
        Ok(Some(value))
    }

    fn write_document(&self, name: &str, value: &Value) -> Result<()> {
        validate_document_name(name)?;
        self.ensure_dir(&self.root)?;

        let path = self.document_path(name);
        let content = serde_json::to_vec_pretty(value).map_err(KioskError::Serialization)?;

        if path.exists() {
            fs::copy(&path, Self::backup_path(&path)).map_err(KioskError::Io)?;
        }

        match self.write_primary(&path, &content) {
            Ok(()) => {
                debug!(document = name, bytes = content.len(), "document written");
                Ok(())
            }
            Err(e) => {
                error!(document = name, error = %e, "document write failed");
                self.restore_from_backup(&path);
                Err(KioskError::Io(e))
            }
        }
    }

    fn list_documents(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(KioskError::Io)? {
            let path = entry.map_err(KioskError::Io)?.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(stem) = file_name.strip_suffix(".json") {
                if validate_document_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_blob(&self, name: &str) -> Result<Option<Vec<u8>>> {
        validate_name(name)?;
        let path = self.files_dir().join(name);
        if !path.exists() {
            return Ok(None);
        }
        fs::read(path).map(Some).map_err(KioskError::Io)
    }

    fn write_blob(&self, name: &str, data: &[u8]) -> Result<()> {
        validate_name(name)?;
        let dir = self.files_dir();
        self.ensure_dir(&dir)?;
        self.write_atomic(&dir.join(name), data)
            .map_err(KioskError::Io)?;
        debug!(blob = name, bytes = data.len(), "blob written");
        Ok(())
    }

    fn blob_exists(&self, name: &str) -> Result<bool> {
        validate_name(name)?;
        Ok(self.files_dir().join(name).is_file())
    }

    fn list_blobs(&self) -> Result<Vec<String>> {
        let dir = self.files_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(KioskError::Io)? {
            let path = entry.map_err(KioskError::Io)?.path();
            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                if path.is_file() && validate_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn replace_all(&self, snapshot: &Snapshot) -> Result<()> {
        let staging = std::env::temp_dir().join(format!("kiosk_backup_{}", Uuid::new_v4()));
        let had_data = self.root.exists();

        if had_data {
            copy_dir_recursive(&self.root, &staging).map_err(|e| {
                error!(error = %e, "could not snapshot current data, import aborted");
                let _ = fs::remove_dir_all(&staging);
                KioskError::Io(e)
            })?;
            debug!(staging = %staging.display(), "current data snapshotted");
        }

        let result = self.apply(snapshot);

        if let Err(e) = &result {
            error!(error = %e, "import failed, rolling back");
            if let Err(restore) = self.roll_back(&staging, had_data) {
                error!(error = %restore, "rollback failed");
            }
        }

        if staging.exists() {
            if let Err(e) = fs::remove_dir_all(&staging) {
                warn!(staging = %staging.display(), error = %e, "could not remove import snapshot");
            }
        }

        result
    }
}

fn copy_dir_recursive(source: &Path, target: &Path) -> io::Result<()> {
    fs::create_dir_all(target)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let from = entry.path();
        let to = target.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FsBackend) {
        let dir = TempDir::new().unwrap();
        let backend = FsBackend::new(dir.path().join("data"));
        (dir, backend)
    }

    #[test]
    fn test_missing_document_reads_none() {
        let (_dir, backend) = setup();
        assert_eq!(backend.read_document("faq_data").unwrap(), None);
    }

    #[test]
    fn test_overwrite_keeps_backup_sibling() {
        let (_dir, backend) = setup();
        backend.write_document("faq_data", &json!([1])).unwrap();
        backend.write_document("faq_data", &json!([1, 2])).unwrap();

        let backup = backend.root().join("faq_data.json.backup");
        let previous: Value = serde_json::from_str(&fs::read_to_string(backup).unwrap()).unwrap();
        assert_eq!(previous, json!([1]));
        assert_eq!(backend.read_document("faq_data").unwrap(), Some(json!([1, 2])));
    }

    #[test]
    fn test_torn_write_restores_previous_value() {
        let (_dir, backend) = setup();
        backend.write_document("ui_config", &json!({"showTransferButtons": true})).unwrap();

        backend.set_simulate_torn_write(true);
        let result = backend.write_document("ui_config", &json!({"showTransferButtons": false}));
        assert!(result.is_err());

        assert_eq!(
            backend.read_document("ui_config").unwrap(),
            Some(json!({"showTransferButtons": true}))
        );
    }

    #[test]
    fn test_corrupt_document_is_an_error_not_a_panic() {
        let (_dir, backend) = setup();
        backend.write_document("faq_data", &json!([])).unwrap();
        fs::write(backend.root().join("faq_data.json"), "{ not json").unwrap();
        assert!(matches!(
            backend.read_document("faq_data"),
            Err(KioskError::Serialization(_))
        ));
    }

    #[test]
    fn test_no_tmp_files_left_behind() {
        let (_dir, backend) = setup();
        backend.write_document("faq_data", &json!([])).unwrap();
        backend.write_blob("a.txt", b"x").unwrap();
        for dir in [backend.root().to_path_buf(), backend.root().join(FILES_DIR)] {
            for entry in fs::read_dir(dir).unwrap() {
                let name = entry.unwrap().file_name().to_string_lossy().to_string();
                assert!(!name.ends_with(".tmp"), "leftover tmp file: {}", name);
            }
        }
    }

    #[test]
    fn test_listing_skips_backups_and_foreign_files() {
        let (_dir, backend) = setup();
        backend.write_document("faq_data", &json!([])).unwrap();
        backend.write_document("faq_data", &json!([1])).unwrap();
        backend.write_document("yayinda", &json!({})).unwrap();
        fs::write(backend.root().join("notes.txt"), "x").unwrap();

        assert_eq!(backend.list_documents().unwrap(), vec!["faq_data", "yayinda"]);
    }

    #[test]
    fn test_blob_round_trip_and_existence() {
        let (_dir, backend) = setup();
        assert!(!backend.blob_exists("img_1.png").unwrap());
        backend.write_blob("img_1.png", &[0, 159, 146, 150]).unwrap();
        assert!(backend.blob_exists("img_1.png").unwrap());
        assert_eq!(
            backend.read_blob("img_1.png").unwrap(),
            Some(vec![0, 159, 146, 150])
        );
        assert!(backend.write_blob("../escape.png", b"x").is_err());
    }

    #[test]
    fn test_replace_all_rolls_back_on_failure() {
        let (_dir, backend) = setup();
        backend.write_document("faq_data", &json!([{"id": "1"}])).unwrap();
        backend.write_blob("keep.pdf", b"pdf").unwrap();

        let mut incoming = Snapshot::default();
        incoming.documents.insert("faq_data".into(), json!([]));
        incoming.blobs.insert("ok.png".into(), b"png".to_vec());
        incoming.blobs.insert("bad/name.png".into(), b"png".to_vec());

        assert!(backend.replace_all(&incoming).is_err());
        assert_eq!(
            backend.read_document("faq_data").unwrap(),
            Some(json!([{"id": "1"}]))
        );
        assert_eq!(backend.list_blobs().unwrap(), vec!["keep.pdf"]);
    }

    #[test]
    fn test_replace_all_replaces_everything() {
        let (_dir, backend) = setup();
        backend.write_document("faq_data", &json!([{"id": "1"}])).unwrap();
        backend.write_blob("old.pdf", b"old").unwrap();

        let mut incoming = Snapshot::default();
        incoming.documents.insert("process_flows".into(), json!([]));
        incoming.blobs.insert("new.png".into(), b"new".to_vec());
        backend.replace_all(&incoming).unwrap();

        assert_eq!(backend.list_documents().unwrap(), vec!["process_flows"]);
        assert_eq!(backend.list_blobs().unwrap(), vec!["new.png"]);
    }
}
