use serde_json::{Map, Value};

use crate::blob;
use crate::commands::module::Attachment;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{KioskError, Result};
use crate::homepage::{Board, Homepage};
use crate::model::{new_record_id, HomepageItem};
use crate::storage::Storage;
use crate::workflow::{Decision, PendingConfirmation, WorkflowOutcome};

pub fn list(storage: &Storage, board: Board) -> Result<CmdResult> {
    let items = Homepage::new(storage).items(board);
    let records = items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(KioskError::Serialization))
        .collect::<Result<Vec<_>>>()?;
    let published = items.iter().filter(|i| i.is_published).count();
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::info(format!(
        "{}: {} item(s), {} published",
        board,
        items.len(),
        published
    )));
    Ok(result.with_records(records))
}

/// Field of a news item naming its image blob.
const NEWS_IMAGE_FIELD: &str = "haberGorseli";

/// Add an unpublished item. A news item may carry an image, which is stored
/// as `news_<id>_<file name>` before the item is saved.
pub fn add(
    storage: &Storage,
    board: Board,
    title: &str,
    date: &str,
    mut extra: Map<String, Value>,
    image: Option<Attachment>,
) -> Result<CmdResult> {
    let id = new_record_id();
    let mut result = CmdResult::default();

    if let Some(file) = image {
        if board != Board::News {
            return Err(KioskError::Api(format!("{} items do not take an image", board)));
        }
        let name = blob::keep_name("news", &id, &file.file_name);
        storage.save_blob_bytes(&name, &file.bytes)?;
        extra.insert(NEWS_IMAGE_FIELD.to_string(), Value::String(name.clone()));
        result.add_message(CmdMessage::info(format!("Stored image {}", name)));
    }

    let item = HomepageItem {
        id: id.clone(),
        title: title.to_string(),
        date: date.to_string(),
        is_published: false,
        extra,
    };
    Homepage::new(storage).add(board, item)?;
    result.add_message(CmdMessage::success(format!(
        "Added {} to {} (unpublished)",
        id, board
    )));
    Ok(result)
}

pub fn delete(storage: &Storage, board: Board, id: &str) -> Result<CmdResult> {
    Homepage::new(storage).delete(board, id)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Deleted {} from {}", id, board)));
    Ok(result)
}

pub fn request_publish_all(storage: &Storage) -> Result<PendingConfirmation> {
    Homepage::new(storage).request_publish_all()
}

pub fn resolve(
    storage: &Storage,
    pending: PendingConfirmation,
    decision: Decision,
) -> Result<CmdResult> {
    let outcome = Homepage::new(storage).resolve_publish_all(pending, decision)?;
    let mut result = CmdResult::default();
    match outcome {
        WorkflowOutcome::Published => {
            result.add_message(CmdMessage::success("Homepage content published"))
        }
        WorkflowOutcome::Cancelled => result.add_message(CmdMessage::info("Cancelled")),
        _ => {}
    }
    Ok(result.with_outcome(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use crate::store::StorageBackend;

    #[test]
    fn test_publish_all_covers_both_boards() {
        let storage = Storage::with_backend(MemBackend::new());
        add(&storage, Board::News, "Açılış", "2024-05-01", Map::new(), None).unwrap();
        add(&storage, Board::Values, "Güven", "2024-05-02", Map::new(), None).unwrap();

        let pending = request_publish_all(&storage).unwrap();
        resolve(&storage, pending, Decision::Confirm).unwrap();

        for board in Board::ALL {
            let records = list(&storage, board).unwrap().records;
            assert!(records.iter().all(|r| r["isPublished"] == Value::Bool(true)));
        }
        assert!(matches!(
            request_publish_all(&storage),
            Err(KioskError::EmptyCollection(_))
        ));
    }

    #[test]
    fn test_news_image_is_stored_and_referenced() {
        let storage = Storage::with_backend(MemBackend::new());
        let image = Attachment {
            file_name: "kapak.png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        add(&storage, Board::News, "Yeni servis", "2024-06-01", Map::new(), Some(image)).unwrap();

        let records = list(&storage, Board::News).unwrap().records;
        let name = records[0][NEWS_IMAGE_FIELD].as_str().unwrap();
        assert_eq!(name, format!("news_{}_kapak.png", records[0]["id"].as_str().unwrap()));
        assert_eq!(storage.read_blob_bytes(name), Some(vec![0x89, b'P', b'N', b'G']));
        assert_eq!(records[0]["isPublished"], Value::Bool(false));
    }

    #[test]
    fn test_values_item_rejects_image() {
        let storage = Storage::with_backend(MemBackend::new());
        let image = Attachment {
            file_name: "logo.png".to_string(),
            bytes: vec![1],
        };
        assert!(add(&storage, Board::Values, "Güven", "2024-06-01", Map::new(), Some(image)).is_err());
        assert!(storage.backend().list_blobs().unwrap().is_empty());
        assert!(list(&storage, Board::Values).unwrap().records.is_empty());
    }
}
