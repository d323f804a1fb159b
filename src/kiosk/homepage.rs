//! Homepage boards: news and corporate values.
//!
//! Unlike the ledger modules, homepage items carry their own `isPublished`
//! flag and are published together by one confirmed "publish all".
//! Items stay deletable after publishing.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::catalog::DocumentName;
use crate::error::{KioskError, Result};
use crate::model::HomepageItem;
use crate::storage::Storage;
use crate::workflow::{Decision, PendingAction, PendingConfirmation, WorkflowOutcome};

const PUBLISHED_FIELD: &str = "isPublished";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Board {
    News,
    Values,
}

impl Board {
    pub const ALL: [Board; 2] = [Board::News, Board::Values];

    pub fn document(&self) -> DocumentName {
        match self {
            Board::News => DocumentName::HomepageNews,
            Board::Values => DocumentName::HomepageValues,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Board::News => f.write_str("news"),
            Board::Values => f.write_str("values"),
        }
    }
}

impl FromStr for Board {
    type Err = KioskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "news" | "guncel_gelismeler" => Ok(Board::News),
            "values" | "kurumsal_degerler" => Ok(Board::Values),
            other => Err(KioskError::Api(format!("Unknown homepage board: {}", other))),
        }
    }
}

pub struct Homepage<'a> {
    storage: &'a Storage,
}

impl<'a> Homepage<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn raw(&self, board: Board) -> Vec<Value> {
        match self.storage.read_catalog(board.document()) {
            Value::Array(items) => items,
            _ => Vec::new(),
        }
    }

    fn save(&self, board: Board, items: Vec<Value>) -> Result<()> {
        self.storage
            .write_document(board.document().as_str(), &Value::Array(items))
    }

    pub fn items(&self, board: Board) -> Vec<HomepageItem> {
        self.raw(board)
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(board = %board, error = %e, "skipping unreadable homepage item");
                    None
                }
            })
            .collect()
    }

    /// New items always start unpublished.
    pub fn add(&self, board: Board, mut item: HomepageItem) -> Result<()> {
        item.is_published = false;
        let mut items = self.raw(board);
        if items.iter().any(|v| v.get("id").and_then(Value::as_str) == Some(&item.id)) {
            return Err(KioskError::Api(format!("Duplicate record id: {}", item.id)));
        }
        items.push(serde_json::to_value(&item).map_err(KioskError::Serialization)?);
        self.save(board, items)?;
        info!(board = %board, id = %item.id, "homepage item added");
        Ok(())
    }

    pub fn delete(&self, board: Board, id: &str) -> Result<()> {
        let mut items = self.raw(board);
        let before = items.len();
        items.retain(|v| v.get("id").and_then(Value::as_str) != Some(id));
        if items.len() == before {
            return Err(KioskError::RecordNotFound(id.to_string()));
        }
        self.save(board, items)?;
        info!(board = %board, id, "homepage item deleted");
        Ok(())
    }

    /// Items on both boards still waiting to be published.
    pub fn unpublished_count(&self) -> usize {
        Board::ALL
            .into_iter()
            .flat_map(|board| self.raw(board))
            .filter(|v| !is_published(v))
            .count()
    }

    pub fn request_publish_all(&self) -> Result<PendingConfirmation> {
        let pending = self.unpublished_count();
        if pending == 0 {
            return Err(KioskError::EmptyCollection("homepage".to_string()));
        }
        Ok(PendingConfirmation::new(
            PendingAction::PublishHomepage,
            "homepage",
            format!("Publish all homepage content ({} pending item(s))?", pending),
        ))
    }

    pub fn resolve_publish_all(
        &self,
        pending: PendingConfirmation,
        decision: Decision,
    ) -> Result<WorkflowOutcome> {
        if pending.action != PendingAction::PublishHomepage {
            return Err(KioskError::Confirmation(format!(
                "{} is not a homepage request",
                pending.action
            )));
        }
        if decision == Decision::Cancel {
            return Ok(WorkflowOutcome::Cancelled);
        }
        let count = self.set_all_published(true)?;
        info!(count, "homepage published");
        Ok(WorkflowOutcome::Published)
    }

    /// Set the flag on every item of both boards. Returns how many items
    /// changed.
    pub(crate) fn set_all_published(&self, published: bool) -> Result<usize> {
        let mut changed = 0;
        for board in Board::ALL {
            let mut items = self.raw(board);
            let mut board_changed = false;
            for item in items.iter_mut() {
                if is_published(item) == published {
                    continue;
                }
                if let Value::Object(map) = item {
                    map.insert(PUBLISHED_FIELD.to_string(), Value::Bool(published));
                    changed += 1;
                    board_changed = true;
                }
            }
            if board_changed {
                self.save(board, items)?;
            }
        }
        Ok(changed)
    }
}

fn is_published(item: &Value) -> bool {
    item.get(PUBLISHED_FIELD)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use serde_json::{json, Map};

    fn news(id: &str) -> HomepageItem {
        HomepageItem {
            id: id.to_string(),
            title: "Yeni hat".to_string(),
            date: "2024-05-01".to_string(),
            is_published: true,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_added_items_start_unpublished() {
        let storage = Storage::with_backend(MemBackend::new());
        let home = Homepage::new(&storage);
        home.add(Board::News, news("1")).unwrap();
        assert!(!home.items(Board::News)[0].is_published);
        assert_eq!(home.unpublished_count(), 1);
    }

    #[test]
    fn test_publish_all_requires_pending_items() {
        let storage = Storage::with_backend(MemBackend::new());
        let home = Homepage::new(&storage);
        assert!(matches!(
            home.request_publish_all(),
            Err(KioskError::EmptyCollection(_))
        ));
    }

    #[test]
    fn test_publish_all_covers_both_boards_and_keeps_fields() {
        let storage = Storage::with_backend(MemBackend::new());
        storage
            .write_document(
                "kurumsal_degerler",
                &json!([{"id": "v", "baslik": "Güven", "tarih": "2024-01-01", "soz": "..."}]),
            )
            .unwrap();
        let home = Homepage::new(&storage);
        home.add(Board::News, news("n")).unwrap();

        let pending = home.request_publish_all().unwrap();
        assert_eq!(
            home.resolve_publish_all(pending, Decision::Confirm).unwrap(),
            WorkflowOutcome::Published
        );
        assert_eq!(home.unpublished_count(), 0);
        let values = storage.read_document("kurumsal_degerler", json!([]));
        assert_eq!(values[0]["soz"], json!("..."));
        assert_eq!(values[0]["isPublished"], json!(true));
    }

    #[test]
    fn test_published_items_can_still_be_deleted() {
        let storage = Storage::with_backend(MemBackend::new());
        let home = Homepage::new(&storage);
        home.add(Board::News, news("1")).unwrap();
        home.set_all_published(true).unwrap();
        home.delete(Board::News, "1").unwrap();
        assert!(home.items(Board::News).is_empty());
    }
}
