//! Single-document JSON backups: every document under its own name, blobs
//! as raw base64 under `files`.
//!
//! ```json
//! { "yayinda": {...}, "faq_data": [...], "files": { "a.png": "iVBORw0..." } }
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};
use std::io::{Read, Write};

use crate::blob::strip_data_uri;
use crate::catalog::{validate_document_name, validate_name, FILES_ENTRY};
use crate::error::{KioskError, Result};
use crate::store::Snapshot;

pub fn write<W: Write>(writer: W, snapshot: &Snapshot) -> Result<()> {
    let mut envelope: Map<String, Value> = snapshot
        .documents
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    let files: Map<String, Value> = snapshot
        .blobs
        .iter()
        .map(|(name, bytes)| (name.clone(), Value::String(STANDARD.encode(bytes))))
        .collect();
    envelope.insert(FILES_ENTRY.to_string(), Value::Object(files));

    serde_json::to_writer(writer, &Value::Object(envelope)).map_err(KioskError::Serialization)
}

pub fn read<R: Read>(reader: R) -> Result<Snapshot> {
    let root: Value = serde_json::from_reader(reader)
        .map_err(|e| KioskError::Archive(format!("not a backup file: {}", e)))?;
    let Value::Object(mut root) = root else {
        return Err(KioskError::Archive("backup root must be an object".to_string()));
    };

    let mut snapshot = Snapshot::default();
    match root.remove(FILES_ENTRY) {
        None | Some(Value::Null) => {}
        Some(Value::Object(files)) => {
            for (name, encoded) in files {
                validate_name(&name)
                    .map_err(|_| KioskError::Archive(format!("bad blob name: {}", name)))?;
                let Value::String(encoded) = encoded else {
                    return Err(KioskError::Archive(format!("blob {} is not a string", name)));
                };
                // Older backups stored displayable data URIs.
                let bytes = STANDARD
                    .decode(strip_data_uri(&encoded))
                    .map_err(|e| KioskError::Archive(format!("blob {}: {}", name, e)))?;
                snapshot.blobs.insert(name, bytes);
            }
        }
        Some(_) => {
            return Err(KioskError::Archive(format!("{} must be an object", FILES_ENTRY)));
        }
    }

    for (name, value) in root {
        validate_document_name(&name)
            .map_err(|_| KioskError::Archive(format!("bad document name: {}", name)))?;
        snapshot.documents.insert(name, value);
    }
    Ok(snapshot)
}
