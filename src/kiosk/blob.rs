//! The blob boundary: payload encodings and data-URI handling.
//!
//! Blobs are always persisted as raw bytes (or, in the browser backend, as
//! raw base64 text). A `data:<mime>;base64,` prefix arriving from a caller is
//! stripped here, once, and a prefix is only ever added again by
//! [`to_data_uri`] on the way out.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use std::fmt;
use std::str::FromStr;

use crate::error::{KioskError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlobEncoding {
    #[default]
    Utf8,
    Base64,
}

impl FromStr for BlobEncoding {
    type Err = KioskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" | "text" => Ok(BlobEncoding::Utf8),
            "base64" => Ok(BlobEncoding::Base64),
            other => Err(KioskError::Api(format!("Unknown encoding: {}", other))),
        }
    }
}

impl fmt::Display for BlobEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobEncoding::Utf8 => f.write_str("utf8"),
            BlobEncoding::Base64 => f.write_str("base64"),
        }
    }
}

/// Remove a leading `data:...,` prefix, if present.
pub fn strip_data_uri(data: &str) -> &str {
    if data.starts_with("data:") {
        if let Some(idx) = data.find(',') {
            return &data[idx + 1..];
        }
    }
    data
}

/// Turn a caller payload into the bytes to persist.
pub fn decode_payload(data: &str, encoding: BlobEncoding) -> Result<Vec<u8>> {
    match encoding {
        BlobEncoding::Utf8 => Ok(data.as_bytes().to_vec()),
        BlobEncoding::Base64 => {
            let body: String = strip_data_uri(data)
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(body.as_bytes())
                .map_err(|e| KioskError::Api(format!("Invalid base64 payload: {}", e)))
        }
    }
}

/// Render stored bytes in the requested encoding, without any prefix.
pub fn encode_payload(bytes: &[u8], encoding: BlobEncoding) -> Result<String> {
    match encoding {
        BlobEncoding::Base64 => Ok(STANDARD.encode(bytes)),
        BlobEncoding::Utf8 => String::from_utf8(bytes.to_vec())
            .map_err(|_| KioskError::Api("Blob is not valid UTF-8 text".to_string())),
    }
}

/// MIME type guessed from the file extension.
pub fn mime_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Displayable `data:` URI for a stored blob.
pub fn to_data_uri(name: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_for(name), STANDARD.encode(bytes))
}

/// Blob name for an upload: `<prefix>_<id>.<ext>`, where `id` is the owning
/// record's id, or a fresh timestamp when there is none. The extension is
/// taken from the uploaded file name.
pub fn generate_name(prefix: &str, id: Option<&str>, file_name: &str) -> String {
    let stamp = id
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().timestamp_millis().to_string());
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => {
            format!("{}_{}.{}", prefix, stamp, ext.to_ascii_lowercase())
        }
        _ => format!("{}_{}", prefix, stamp),
    }
}

/// Blob name that keeps the uploaded file name: `<prefix>_<id>_<file name>`.
/// Characters outside the portable name set become `_`.
pub fn keep_name(prefix: &str, id: &str, file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}_{}", prefix, id, cleaned)
}
