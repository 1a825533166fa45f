//! Status change history tracking.
//!
//! Provides immutable tracking of committed status changes over time.

use super::status::{ActionName, StateName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single committed status change.
///
/// # Example
///
/// ```rust
/// use modelstatus::core::{StateName, StatusChange};
/// use chrono::Utc;
///
/// let change = StatusChange {
///     from: Some(StateName::new("offline")),
///     to: StateName::new("online"),
///     action: None,
///     timestamp: Utc::now(),
/// };
/// assert_eq!(change.to, "online");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    /// The status being left, absent for the first assignment
    pub from: Option<StateName>,
    /// The status being entered
    pub to: StateName,
    /// The action that caused the change, if any
    pub action: Option<ActionName>,
    /// When the change was committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of status changes.
///
/// History is immutable - the `record` method returns a new history
/// with the change added. It grows without bound unless trimmed with
/// [`retain_last`](Self::retain_last).
///
/// # Example
///
/// ```rust
/// use modelstatus::core::{StateName, StatusChange, StatusHistory};
/// use chrono::Utc;
///
/// let history = StatusHistory::new().record(StatusChange {
///     from: Some(StateName::new("offline")),
///     to: StateName::new("online"),
///     action: None,
///     timestamp: Utc::now(),
/// });
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 2); // offline -> online
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusHistory {
    changes: Vec<StatusChange>,
}

impl StatusHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Record a change, returning a new history.
    ///
    /// The existing history is left untouched.
    pub fn record(&self, change: StatusChange) -> Self {
        let mut changes = self.changes.clone();
        changes.push(change);
        Self { changes }
    }

    /// Get the path of statuses traversed.
    ///
    /// Starts with the `from` status of the first change when one was set,
    /// followed by the `to` status of every change.
    pub fn get_path(&self) -> Vec<&StateName> {
        let mut path = Vec::new();
        if let Some(from) = self.changes.first().and_then(|c| c.from.as_ref()) {
            path.push(from);
        }
        for change in &self.changes {
            path.push(&change.to);
        }
        path
    }

    /// Calculate total duration from first to last change.
    ///
    /// Returns `None` if there are no changes.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.changes.first(), self.changes.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Append a change in place.
    pub(crate) fn push(&mut self, change: StatusChange) {
        self.changes.push(change);
    }

    /// Drop the oldest changes so that at most `keep` remain.
    pub fn retain_last(&mut self, keep: usize) {
        let excess = self.changes.len().saturating_sub(keep);
        if excess > 0 {
            self.changes.drain(..excess);
        }
    }

    /// The most recent change.
    pub fn last(&self) -> Option<&StatusChange> {
        self.changes.last()
    }

    /// Get all changes in order.
    pub fn changes(&self) -> &[StatusChange] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
