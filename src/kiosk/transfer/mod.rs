//! # Backup and Restore
//!
//! Export serializes every document and every blob of the active backend
//! into one portable file: a gzip-compressed tar on the native backend, a
//! JSON envelope on the web backend. Both formats carry the publish ledger
//! unchanged and both backends can import either format; the format is
//! detected from the file's leading bytes.
//!
//! Import is all-or-nothing. The archive is parsed completely into memory
//! first, so a malformed file never touches local state. The parsed state is
//! then handed to [`StorageBackend::replace_all`], which snapshots the current
//! state, clears it, applies the archive, and restores the snapshot if any
//! step fails.
//!
//! [`StorageBackend::replace_all`]: crate::store::StorageBackend::replace_all

use chrono::{DateTime, Local};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::{default_ledger, LEDGER};
use crate::error::{KioskError, Result};
use crate::model::ModuleKey;
use crate::storage::Storage;
use crate::store::{Platform, Snapshot};

pub mod archive;
pub mod envelope;

const EXPORT_PREFIX: &str = "personel_destek_yedek";
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    JsonEnvelope,
}

impl ArchiveFormat {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Native => ArchiveFormat::TarGz,
            Platform::Web => ArchiveFormat::JsonEnvelope,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::JsonEnvelope => "json",
        }
    }

    /// Gzip magic means a tar archive; anything else is tried as JSON.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            ArchiveFormat::TarGz
        } else {
            ArchiveFormat::JsonEnvelope
        }
    }
}

/// `personel_destek_yedek_YYYYMMDD_HHMMSS.<ext>`
pub fn export_file_name(format: ArchiveFormat, at: DateTime<Local>) -> String {
    format!(
        "{}_{}.{}",
        EXPORT_PREFIX,
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub format: ArchiveFormat,
    pub documents: usize,
    pub blobs: usize,
    pub bytes: u64,
}

/// Write a backup of everything into `dest_dir`.
///
/// The archive is written to a temporary sibling and renamed into place, so
/// a failed export leaves neither a partial file nor any change to the data.
pub fn export_all(storage: &Storage, dest_dir: &Path) -> Result<ExportReport> {
    let snapshot = storage.backend().snapshot()?;
    let format = ArchiveFormat::for_platform(storage.platform());
    let path = dest_dir.join(export_file_name(format, Local::now()));

    if !dest_dir.exists() {
        fs::create_dir_all(dest_dir).map_err(KioskError::Io)?;
    }
    let tmp = dest_dir.join(format!(".{}-{}.tmp", EXPORT_PREFIX, Uuid::new_v4()));

    let written = write_snapshot(&tmp, format, &snapshot).and_then(|()| {
        fs::rename(&tmp, &path).map_err(KioskError::Io)
    });
    if let Err(e) = written {
        error!(dest = %dest_dir.display(), error = %e, "export failed");
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    let bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    info!(path = %path.display(), bytes, "export written");
    Ok(ExportReport {
        path,
        format,
        documents: snapshot.documents.len(),
        blobs: snapshot.blobs.len(),
        bytes,
    })
}

fn write_snapshot(path: &Path, format: ArchiveFormat, snapshot: &Snapshot) -> Result<()> {
    let file = File::create(path).map_err(KioskError::Io)?;
    let mut writer = BufWriter::new(file);
    match format {
        ArchiveFormat::TarGz => archive::write(&mut writer, snapshot)?,
        ArchiveFormat::JsonEnvelope => envelope::write(&mut writer, snapshot)?,
    }
    writer.flush().map_err(KioskError::Io)?;
    writer
        .into_inner()
        .map_err(|e| KioskError::Io(e.into_error()))?
        .sync_all()
        .map_err(KioskError::Io)
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub format: ArchiveFormat,
    pub documents: usize,
    pub blobs: usize,
    /// The archive had no ledger and an all-unpublished one was written.
    pub ledger_synthesized: bool,
    /// Modules published after the import.
    pub published: Vec<ModuleKey>,
}

#[derive(Debug, Clone)]
pub enum ImportOutcome {
    /// No archive was chosen.
    Cancelled,
    Imported(ImportReport),
}

/// Parse a backup from its raw bytes.
pub fn parse_archive(bytes: &[u8]) -> Result<(ArchiveFormat, Snapshot)> {
    let format = ArchiveFormat::detect(bytes);
    let snapshot = match format {
        ArchiveFormat::TarGz => archive::read(bytes)?,
        ArchiveFormat::JsonEnvelope => envelope::read(bytes)?,
    };
    Ok((format, snapshot))
}

/// Replace all local state with the backup at `source`.
pub fn import_all(storage: &Storage, source: Option<&Path>) -> Result<ImportOutcome> {
    let Some(source) = source else {
        info!("import cancelled, no file chosen");
        return Ok(ImportOutcome::Cancelled);
    };

    let mut bytes = Vec::new();
    BufReader::new(File::open(source).map_err(KioskError::Io)?)
        .read_to_end(&mut bytes)
        .map_err(KioskError::Io)?;
    let (format, snapshot) = parse_archive(&bytes)?;
    import_snapshot(storage, format, snapshot).map(ImportOutcome::Imported)
}

/// Apply an already parsed snapshot.
pub fn import_snapshot(
    storage: &Storage,
    format: ArchiveFormat,
    mut snapshot: Snapshot,
) -> Result<ImportReport> {
    let ledger_synthesized = !snapshot.documents.contains_key(LEDGER);
    if ledger_synthesized {
        warn!("backup has no publish ledger, starting all modules unpublished");
        snapshot
            .documents
            .insert(LEDGER.to_string(), default_ledger());
    }

    storage.backend().replace_all(&snapshot).map_err(|e| {
        error!(error = %e, "import failed, previous data restored");
        e
    })?;

    let published = storage
        .ledger()
        .snapshot()
        .into_iter()
        .filter_map(|(key, published)| published.then_some(key))
        .collect();
    info!(
        documents = snapshot.documents.len(),
        blobs = snapshot.blobs.len(),
        "import applied"
    );
    Ok(ImportReport {
        format,
        documents: snapshot.documents.len(),
        blobs: snapshot.blobs.len(),
        ledger_synthesized,
        published,
    })
}
