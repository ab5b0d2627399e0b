//! Confirmation-dialog state machine.
//!
//! Dialog visibility is modeled as `Idle -> Pending(action) -> Idle` rather
//! than ad hoc booleans; `confirm` and `cancel` are the only two transitions
//! out of `Pending`.

use serde::{Deserialize, Serialize};

/// An action awaiting user confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    Quit,
}

/// Current confirmation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConfirmState {
    #[default]
    Idle,
    Pending {
        action: PendingAction,
    },
}

impl ConfirmState {
    /// Requests confirmation of `action`. Ignored while another request is
    /// already pending.
    pub fn request(&mut self, action: PendingAction) -> bool {
        match self {
            Self::Idle => {
                *self = Self::Pending { action };
                true
            }
            Self::Pending { .. } => false,
        }
    }

    /// Confirms the pending action, returning it.
    pub fn confirm(&mut self) -> Option<PendingAction> {
        match *self {
            Self::Pending { action } => {
                *self = Self::Idle;
                Some(action)
            }
            Self::Idle => None,
        }
    }

    /// Cancels any pending request.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}
