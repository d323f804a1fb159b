use std::fmt;

/// What a pending confirmation will do once confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Publish,
    Reset,
    PublishHomepage,
    HideTransfer,
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingAction::Publish => f.write_str("publish"),
            PendingAction::Reset => f.write_str("reset"),
            PendingAction::PublishHomepage => f.write_str("publish homepage"),
            PendingAction::HideTransfer => f.write_str("hide transfer"),
        }
    }
}

/// The operator's answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Cancel,
}

impl Decision {
    pub fn from_bool(confirmed: bool) -> Self {
        if confirmed {
            Decision::Confirm
        } else {
            Decision::Cancel
        }
    }
}

/// First half of a two-step operation. Nothing has changed yet; the holder
/// shows `prompt` to the operator and hands the decision back to the
/// component that issued it.
///
/// It carries no identity. The resolving component checks `action` and
/// `target` and re-validates its own state before applying anything.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PendingConfirmation {
    pub action: PendingAction,
    /// Ledger key or document the action applies to.
    pub target: String,
    pub prompt: String,
}

impl PendingConfirmation {
    pub fn new(action: PendingAction, target: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
            prompt: prompt.into(),
        }
    }
}
