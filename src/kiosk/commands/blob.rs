use crate::blob::BlobEncoding;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::storage::Storage;

pub fn save(storage: &Storage, name: &str, data: &str, encoding: BlobEncoding) -> Result<CmdResult> {
    storage.save_blob(name, data, encoding)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Saved file {}", name)));
    Ok(result)
}

/// Read a blob in `encoding`, or as a `data:` URI when `data_uri` is set.
pub fn read(
    storage: &Storage,
    name: &str,
    encoding: BlobEncoding,
    data_uri: bool,
) -> Result<CmdResult> {
    let content = if data_uri {
        storage.read_blob_data_uri(name)
    } else {
        storage.read_blob(name, encoding)
    };
    match content {
        Some(content) => Ok(CmdResult::default().with_blob(content)),
        None => {
            let mut result = CmdResult::default();
            result.add_message(CmdMessage::warning(format!("File not found: {}", name)));
            Ok(result)
        }
    }
}

pub fn exists(storage: &Storage, name: &str) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    if storage.blob_exists(name) {
        result.add_message(CmdMessage::info(format!("{} exists", name)));
    } else {
        result.add_message(CmdMessage::warning(format!("{} does not exist", name)));
    }
    Ok(result)
}
