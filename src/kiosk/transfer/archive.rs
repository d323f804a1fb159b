//! Gzip-compressed tar archives.
//!
//! ```text
//! yayinda.json
//! faq_data.json
//! ...
//! files/training_1700000000000.pdf
//! ```

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tracing::warn;

use crate::catalog::{validate_document_name, validate_name, FILES_ENTRY};
use crate::error::{KioskError, Result};
use crate::store::Snapshot;

pub fn write<W: Write>(writer: W, snapshot: &Snapshot) -> Result<()> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = tar::Builder::new(enc);

    for (name, value) in &snapshot.documents {
        let content = serde_json::to_vec_pretty(value).map_err(KioskError::Serialization)?;
        append(&mut tar, &format!("{}.json", name), &content)?;
    }
    for (name, bytes) in &snapshot.blobs {
        append(&mut tar, &format!("{}/{}", FILES_ENTRY, name), bytes)?;
    }

    let enc = tar.into_inner().map_err(KioskError::Io)?;
    enc.finish().map_err(KioskError::Io)?;
    Ok(())
}

fn append<W: Write>(tar: &mut tar::Builder<W>, path: &str, content: &[u8]) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    tar.append_data(&mut header, path, content)
        .map_err(KioskError::Io)
}

/// Parse a whole archive into memory. Nothing is applied here, so a bad
/// archive is rejected before any local state is touched.
pub fn read<R: Read>(reader: R) -> Result<Snapshot> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut snapshot = Snapshot::default();

    let entries = archive
        .entries()
        .map_err(|e| KioskError::Archive(format!("unreadable archive: {}", e)))?;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| KioskError::Archive(format!("corrupt entry: {}", e)))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry
            .path()
            .map_err(|e| KioskError::Archive(format!("bad entry path: {}", e)))?
            .to_string_lossy()
            .trim_start_matches("./")
            .to_string();

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| KioskError::Archive(format!("{}: {}", path, e)))?;

        if let Some(blob) = path.strip_prefix(&format!("{}/", FILES_ENTRY)) {
            validate_name(blob).map_err(|_| KioskError::Archive(format!("bad blob name: {}", blob)))?;
            snapshot.blobs.insert(blob.to_string(), content);
        } else if let Some(doc) = path.strip_suffix(".json") {
            validate_document_name(doc)
                .map_err(|_| KioskError::Archive(format!("bad document name: {}", doc)))?;
            let value = serde_json::from_slice(&content)
                .map_err(|e| KioskError::Archive(format!("{}: {}", path, e)))?;
            snapshot.documents.insert(doc.to_string(), value);
        } else {
            warn!(entry = %path, "skipping unknown archive entry");
        }
    }
    Ok(snapshot)
}
