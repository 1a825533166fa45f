//! Transition errors.

use crate::core::{ActionName, StateName};
use crate::engine::store::StoreError;
use thiserror::Error;

/// Errors raised when a status change or action is refused.
///
/// The engine's state is unchanged whenever one of these is returned.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("illegal status change from {} to '{to}'", describe(.from))]
    Illegal {
        from: Option<StateName>,
        to: StateName,
    },

    #[error("unknown status '{0}'")]
    UnknownState(String),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("action '{action}' is not available from {}", describe(.from))]
    ActionNotAvailable {
        action: ActionName,
        from: Option<StateName>,
    },

    #[error("action '{action}' returns to the previous status, but '{from}' has none recorded")]
    NoPreviousStatus { action: ActionName, from: StateName },

    #[error("action '{action}' cannot return from '{from}' to previous status '{previous}'")]
    PreviousNotAllowed {
        action: ActionName,
        from: StateName,
        previous: StateName,
    },

    #[error("failed to persist status: {0}")]
    Persist(#[from] StoreError),
}

impl TransitionError {
    /// The status the change was attempted from, when known.
    pub fn from_status(&self) -> Option<&StateName> {
        match self {
            Self::Illegal { from, .. } | Self::ActionNotAvailable { from, .. } => from.as_ref(),
            Self::NoPreviousStatus { from, .. } | Self::PreviousNotAllowed { from, .. } => {
                Some(from)
            }
            Self::UnknownState(_) | Self::UnknownAction(_) | Self::Persist(_) => None,
        }
    }

    /// The status the change was attempting to reach, when known.
    pub fn to_status(&self) -> Option<&StateName> {
        match self {
            Self::Illegal { to, .. } => Some(to),
            Self::PreviousNotAllowed { previous, .. } => Some(previous),
            _ => None,
        }
    }

    /// The action involved, for action-driven failures.
    pub fn action(&self) -> Option<&ActionName> {
        match self {
            Self::ActionNotAvailable { action, .. }
            | Self::NoPreviousStatus { action, .. }
            | Self::PreviousNotAllowed { action, .. } => Some(action),
            _ => None,
        }
    }
}

fn describe(state: &Option<StateName>) -> String {
    match state {
        Some(state) => format!("'{}'", state),
        None => "an unset status".to_string(),
    }
}
