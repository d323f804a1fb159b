//! # Module Publish Workflow
//!
//! One controller per publishable module. While a module is unpublished its
//! collection can be edited freely; publishing locks it.
//!
//! ```text
//! Unpublished --publish (non-empty, confirmed, ledger verified)--> Published
//! Published   --reset (confirmed): clear collection, then ledger--> Unpublished
//! ```
//!
//! Publish and reset are two-step: `request_*` validates and returns a
//! [`PendingConfirmation`]; nothing changes until [`ModuleWorkflow::resolve`]
//! receives the operator's [`Decision`]. The controller's own published state
//! only flips after the ledger write has been verified.
//!
//! There is no unpublish operation. Reset is the only way back, and it
//! discards the module's content.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::error::{KioskError, Result};
use crate::model::{FaqEntry, ModuleKey, Procedure, ProcessFlow, TrainingMaterial};
use crate::storage::Storage;

pub mod collection;
pub mod confirm;

pub use collection::{Collection, ListCollection, OrgCollection};
pub use confirm::{Decision, PendingAction, PendingConfirmation};

/// Result of a confirmed (or declined) two-step operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Published,
    Reset,
    /// The content was cleared but the ledger still says published.
    ResetInconsistent { cause: String },
    /// A confirmed setting change.
    Applied,
    Cancelled,
}

pub struct ModuleWorkflow<'a, C: Collection> {
    storage: &'a Storage,
    collection: C,
    published: bool,
}

impl<'a, C: Collection> ModuleWorkflow<'a, C> {
    pub fn open(storage: &'a Storage, collection: C) -> Self {
        let published = storage.ledger().is_published(collection.module());
        Self {
            storage,
            collection,
            published,
        }
    }

    pub fn module(&self) -> ModuleKey {
        self.collection.module()
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    pub fn items(&self) -> Vec<C::Item> {
        self.collection.items(self.storage)
    }

    pub fn len(&self) -> usize {
        self.collection.len(self.storage)
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty(self.storage)
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.published {
            return Err(KioskError::ModulePublished(self.module().to_string()));
        }
        Ok(())
    }

    pub fn add(&self, item: C::Item) -> Result<()> {
        self.ensure_editable()?;
        self.collection.add(self.storage, item)?;
        info!(module = %self.module(), "record added");
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.ensure_editable()?;
        self.collection.delete(self.storage, id)?;
        info!(module = %self.module(), id, "record deleted");
        Ok(())
    }

    pub fn request_publish(&self) -> Result<PendingConfirmation> {
        self.ensure_editable()?;
        let count = self.len();
        if count == 0 {
            return Err(KioskError::EmptyCollection(self.module().to_string()));
        }
        Ok(PendingConfirmation::new(
            PendingAction::Publish,
            self.module().as_str(),
            format!(
                "Publish {} ({} item(s))? Published content can no longer be edited.",
                self.module().alias(),
                count
            ),
        ))
    }

    pub fn request_reset(&self) -> PendingConfirmation {
        PendingConfirmation::new(
            PendingAction::Reset,
            self.module().as_str(),
            format!(
                "Reset {}? All of its content is deleted and it becomes unpublished.",
                self.module().alias()
            ),
        )
    }

    /// Carry out (or drop) a request issued by this workflow.
    pub fn resolve(
        &mut self,
        pending: PendingConfirmation,
        decision: Decision,
    ) -> Result<WorkflowOutcome> {
        if pending.target != self.module().as_str()
            || !matches!(pending.action, PendingAction::Publish | PendingAction::Reset)
        {
            return Err(KioskError::Confirmation(format!(
                "{} for {} does not belong to module {}",
                pending.action,
                pending.target,
                self.module()
            )));
        }
        if decision == Decision::Cancel {
            info!(module = %self.module(), action = %pending.action, "cancelled");
            return Ok(WorkflowOutcome::Cancelled);
        }
        match pending.action {
            PendingAction::Reset => self.reset(),
            _ => self.publish(),
        }
    }

    fn publish(&mut self) -> Result<WorkflowOutcome> {
        // Re-check: the collection may have changed since the request.
        self.ensure_editable()?;
        if self.is_empty() {
            return Err(KioskError::EmptyCollection(self.module().to_string()));
        }
        self.storage
            .ledger()
            .set_module_published(self.module(), true)?;
        self.published = true;
        info!(module = %self.module(), "module published");
        Ok(WorkflowOutcome::Published)
    }

    fn reset(&mut self) -> Result<WorkflowOutcome> {
        self.collection.clear(self.storage)?;
        match self.storage.ledger().reset(&[self.module()]) {
            Ok(()) => {
                self.published = false;
                info!(module = %self.module(), "module reset");
                Ok(WorkflowOutcome::Reset)
            }
            Err(e) => {
                error!(module = %self.module(), error = %e, "content cleared but ledger reset failed");
                Ok(WorkflowOutcome::ResetInconsistent {
                    cause: e.to_string(),
                })
            }
        }
    }
}

/// A workflow with its record type erased, so callers holding only a
/// [`ModuleKey`] can drive any module.
pub trait ModuleController {
    fn module(&self) -> ModuleKey;
    fn is_published(&self) -> bool;
    fn len(&self) -> usize;
    fn records(&self) -> Result<Vec<Value>>;
    /// Add one record given as JSON in the collection's stored shape.
    fn add_value(&self, record: Value) -> Result<()>;
    fn delete(&self, id: &str) -> Result<()>;
    fn request_publish(&self) -> Result<PendingConfirmation>;
    fn request_reset(&self) -> PendingConfirmation;
    fn resolve(&mut self, pending: PendingConfirmation, decision: Decision)
        -> Result<WorkflowOutcome>;
}

impl<C> ModuleController for ModuleWorkflow<'_, C>
where
    C: Collection,
    C::Item: Serialize + DeserializeOwned,
{
    fn module(&self) -> ModuleKey {
        ModuleWorkflow::module(self)
    }

    fn is_published(&self) -> bool {
        ModuleWorkflow::is_published(self)
    }

    fn len(&self) -> usize {
        ModuleWorkflow::len(self)
    }

    fn records(&self) -> Result<Vec<Value>> {
        self.items()
            .iter()
            .map(|item| serde_json::to_value(item).map_err(KioskError::Serialization))
            .collect()
    }

    fn add_value(&self, record: Value) -> Result<()> {
        let item: C::Item = serde_json::from_value(record).map_err(|e| {
            KioskError::Api(format!("Invalid record for {}: {}", self.module().alias(), e))
        })?;
        self.add(item)
    }

    fn delete(&self, id: &str) -> Result<()> {
        ModuleWorkflow::delete(self, id)
    }

    fn request_publish(&self) -> Result<PendingConfirmation> {
        ModuleWorkflow::request_publish(self)
    }

    fn request_reset(&self) -> PendingConfirmation {
        ModuleWorkflow::request_reset(self)
    }

    fn resolve(
        &mut self,
        pending: PendingConfirmation,
        decision: Decision,
    ) -> Result<WorkflowOutcome> {
        ModuleWorkflow::resolve(self, pending, decision)
    }
}

/// Open the workflow behind a ledger key.
pub fn open_module(storage: &Storage, key: ModuleKey) -> Box<dyn ModuleController + '_> {
    match key {
        ModuleKey::Org(group) => Box::new(ModuleWorkflow::open(storage, OrgCollection::new(group))),
        ModuleKey::Training => Box::new(ModuleWorkflow::open(
            storage,
            ListCollection::<TrainingMaterial>::new(key),
        )),
        ModuleKey::Faq => Box::new(ModuleWorkflow::open(
            storage,
            ListCollection::<FaqEntry>::new(key),
        )),
        ModuleKey::ProcessFlows => Box::new(ModuleWorkflow::open(
            storage,
            ListCollection::<ProcessFlow>::new(key),
        )),
        ModuleKey::Procedures => Box::new(ModuleWorkflow::open(
            storage,
            ListCollection::<Procedure>::new(key),
        )),
    }
}
