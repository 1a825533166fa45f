//! Per-instance status engine.

use crate::core::{ActionName, StateName, Status, StatusChange, StatusHistory};
use crate::engine::error::TransitionError;
use crate::engine::store::{MemoryStore, StatusStore};
use crate::table::StatusDefinition;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Status field of one record.
///
/// Holds the current and previous status, gates every change through the
/// shared [`StatusDefinition`], and writes accepted changes through to its
/// [`StatusStore`] before updating itself.
///
/// # Example
///
/// ```rust
/// use modelstatus::engine::StatusEngine;
/// use modelstatus::table::StatusDefinition;
/// use std::sync::Arc;
///
/// let definition = Arc::new(
///     StatusDefinition::builder()
///         .state("offline", ["online"])
///         .state("online", ["offline"])
///         .default_state("offline")
///         .build()
///         .unwrap(),
/// );
///
/// let mut engine = StatusEngine::new(definition);
/// assert!(engine.is_state("offline"));
///
/// engine.set_status("online").unwrap();
/// assert!(engine.is_state("online"));
/// assert_eq!(engine.previous_status().unwrap(), "offline");
///
/// assert!(engine.set_status("online").is_err());
/// ```
#[derive(Debug)]
pub struct StatusEngine<St: StatusStore = MemoryStore> {
    pub(crate) definition: Arc<StatusDefinition>,
    pub(crate) store: St,
    pub(crate) current: Option<StateName>,
    pub(crate) previous: Option<StateName>,
    pub(crate) history: StatusHistory,
    pub(crate) history_limit: Option<usize>,
}

impl StatusEngine<MemoryStore> {
    /// Create an engine backed by an in-memory store, starting in the
    /// definition's default state.
    pub fn new(definition: Arc<StatusDefinition>) -> Self {
        let current = definition.default_state().cloned();
        let store = match &current {
            Some(state) => MemoryStore::with_status(state.clone()),
            None => MemoryStore::new(),
        };
        Self {
            definition,
            store,
            current,
            previous: None,
            history: StatusHistory::new(),
            history_limit: None,
        }
    }
}

impl<St: StatusStore> StatusEngine<St> {
    /// Attach an engine to an existing store.
    ///
    /// A persisted status is adopted as the current one and must be declared.
    /// An empty store receives the definition's default state, if any.
    pub fn attach(
        definition: Arc<StatusDefinition>,
        mut store: St,
    ) -> Result<Self, TransitionError> {
        let current = match store.read_status() {
            Some(persisted) => {
                if !definition.contains(persisted.as_str()) {
                    return Err(TransitionError::UnknownState(persisted.to_string()));
                }
                Some(persisted)
            }
            None => {
                let default = definition.default_state().cloned();
                if let Some(default) = &default {
                    store.write_status(default)?;
                }
                default
            }
        };

        Ok(Self {
            definition,
            store,
            current,
            previous: None,
            history: StatusHistory::new(),
            history_limit: None,
        })
    }

    /// Keep at most `limit` changes in the history, dropping the oldest.
    ///
    /// Without a limit the history grows with every committed change.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self.history.retain_last(limit);
        self
    }

    pub fn definition(&self) -> &StatusDefinition {
        &self.definition
    }

    /// The current status, unset only when the definition has no default
    /// and nothing has been assigned yet.
    pub fn status(&self) -> Option<&StateName> {
        self.current.as_ref()
    }

    /// The status held before the most recent change.
    pub fn previous_status(&self) -> Option<&StateName> {
        self.previous.as_ref()
    }

    pub fn history(&self) -> &StatusHistory {
        &self.history
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub fn into_store(self) -> St {
        self.store
    }

    /// Whether the current status is `status`.
    pub fn is_state<S: Status + ?Sized>(&self, status: &S) -> bool {
        self.current.as_ref().is_some_and(|c| c == status.name())
    }

    /// Whether the current status belongs to `group`.
    ///
    /// An undeclared group has no members, so this answers `false`.
    pub fn is_in_group(&self, group: &str) -> bool {
        match self.definition.group(group) {
            Some(members) => self.current.as_ref().is_some_and(|c| members.contains(c)),
            None => {
                tracing::debug!(group, "membership asked for undeclared status group");
                false
            }
        }
    }

    /// Change the status to `status` if the definition allows it.
    ///
    /// The first assignment of an unset status is accepted unconditionally.
    pub fn set_status<S: Status + ?Sized>(&mut self, status: &S) -> Result<(), TransitionError> {
        let target = status.name();
        if !self.definition.contains(target) {
            tracing::debug!(to = target, "rejected unknown status");
            return Err(TransitionError::UnknownState(target.to_string()));
        }

        if let Some(current) = &self.current {
            if !self
                .definition
                .permits(current.as_str(), self.previous_str(), target)
            {
                tracing::debug!(from = %current, to = target, "rejected status change");
                return Err(TransitionError::Illegal {
                    from: Some(current.clone()),
                    to: StateName::from(target),
                });
            }
        }

        self.commit(StateName::from(target), None)
    }

    /// Perform `action`, moving to the state it leads to from the current one.
    ///
    /// Returns the new status.
    pub fn perform(&mut self, action: &str) -> Result<StateName, TransitionError> {
        let Some(current) = &self.current else {
            if !self.definition.has_action(action) {
                return Err(TransitionError::UnknownAction(action.to_string()));
            }
            return Err(TransitionError::ActionNotAvailable {
                action: ActionName::from(action),
                from: None,
            });
        };

        let target = self
            .definition
            .resolve_target(action, current.as_str(), self.previous_str())
            .inspect_err(|err| tracing::debug!(action, error = %err, "rejected action"))?;

        self.commit(target.clone(), Some(ActionName::from(action)))?;
        Ok(target)
    }

    /// Whether [`perform`](Self::perform) would accept `action` right now.
    pub fn can_perform(&self, action: &str) -> bool {
        self.current.as_ref().is_some_and(|current| {
            self.definition
                .resolve_target(action, current.as_str(), self.previous_str())
                .is_ok()
        })
    }

    /// Statuses [`set_status`](Self::set_status) would accept right now.
    pub fn allowed_targets(&self) -> BTreeSet<StateName> {
        let Some(current) = &self.current else {
            return self.definition.states().clone();
        };

        let mut targets: BTreeSet<StateName> = self
            .definition
            .allowed_targets(current.as_str())
            .into_iter()
            .cloned()
            .collect();
        if let Some(previous) = self.previous_str() {
            if self.definition.permits(current.as_str(), Some(previous), previous) {
                targets.insert(StateName::from(previous));
            }
        }
        targets
    }

    /// Actions with a rule for the current status.
    pub fn available_actions(&self) -> Vec<&ActionName> {
        match &self.current {
            Some(current) => self.definition.available_actions(current.as_str()),
            None => Vec::new(),
        }
    }

    fn previous_str(&self) -> Option<&str> {
        self.previous.as_ref().map(StateName::as_str)
    }

    /// Persist `target`, then move to it. Nothing changes if the store fails.
    fn commit(
        &mut self,
        target: StateName,
        action: Option<ActionName>,
    ) -> Result<(), TransitionError> {
        if let Err(err) = self.store.write_status(&target) {
            tracing::warn!(to = %target, error = %err, "failed to persist status");
            return Err(err.into());
        }

        tracing::debug!(
            from = self.current.as_ref().map(StateName::as_str),
            to = %target,
            action = action.as_ref().map(ActionName::as_str),
            "status changed"
        );

        self.history.push(StatusChange {
            from: self.current.clone(),
            to: target.clone(),
            action,
            timestamp: Utc::now(),
        });
        if let Some(limit) = self.history_limit {
            self.history.retain_last(limit);
        }
        self.previous = self.current.replace(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::StoreError;
    use crate::table::{Source, Target};

    fn basic() -> Arc<StatusDefinition> {
        Arc::new(
            StatusDefinition::builder()
                .state("access_pending", ["tc_pending"])
                .state("tc_pending", ["access_denied", "offline"])
                .state("access_denied", ["offline", "locked", "tc_pending"])
                .state("offline", ["access_denied", "online", "locked"])
                .state("online", ["offline"])
                .state("locked", ["offline"])
                .default_state("access_pending")
                .group("active", ["online", "offline", "locked"])
                .build()
                .unwrap(),
        )
    }

    fn accounts() -> Arc<StatusDefinition> {
        Arc::new(
            StatusDefinition::builder()
                .action(
                    "grant_access",
                    Source::state("access_pending"),
                    Target::state("tc_pending"),
                )
                .action(
                    "grant_access",
                    Source::state("access_denied"),
                    Target::previous_among(["offline", "locked", "tc_pending"]),
                )
                .action("deny_access", Source::Any, Target::state("access_denied"))
                .action("accept_tc", Source::state("tc_pending"), Target::state("offline"))
                .action("log_in", Source::state("offline"), Target::state("online"))
                .action("log_out", Source::state("online"), Target::state("offline"))
                .action("lock", Source::state("offline"), Target::state("locked"))
                .action("reset_password", Source::state("locked"), Target::state("offline"))
                .default_state("access_pending")
                .group("active", ["online", "offline", "locked"])
                .build()
                .unwrap(),
        )
    }

    /// Store that refuses every write.
    struct FailingStore;

    impl StatusStore for FailingStore {
        fn read_status(&self) -> Option<StateName> {
            Some(StateName::new("offline"))
        }

        fn write_status(&mut self, _status: &StateName) -> Result<(), StoreError> {
            Err(StoreError::new("disk full"))
        }
    }

    #[test]
    fn new_engine_starts_in_default_state() {
        let engine = StatusEngine::new(basic());

        assert_eq!(engine.status().unwrap(), "access_pending");
        assert!(engine.previous_status().is_none());
        assert!(engine.history().is_empty());
        assert_eq!(engine.store().read_status().unwrap(), "access_pending");
    }

    #[test]
    fn legal_change_updates_current_and_previous() {
        let mut engine = StatusEngine::new(basic());

        engine.set_status("tc_pending").unwrap();

        assert!(engine.is_state("tc_pending"));
        assert_eq!(engine.previous_status().unwrap(), "access_pending");
        assert_eq!(engine.store().read_status().unwrap(), "tc_pending");
        assert_eq!(engine.store().writes(), 1);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn illegal_change_is_rejected_without_side_effects() {
        let mut engine = StatusEngine::new(basic());

        for _ in 0..3 {
            let err = engine.set_status("locked").unwrap_err();
            assert!(matches!(err, TransitionError::Illegal { .. }));
            assert_eq!(err.from_status().unwrap(), "access_pending");
            assert_eq!(err.to_status().unwrap(), "locked");
        }

        assert!(engine.is_state("access_pending"));
        assert!(engine.previous_status().is_none());
        assert_eq!(engine.store().writes(), 0);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut engine = StatusEngine::new(basic());
        assert!(matches!(
            engine.set_status("archived"),
            Err(TransitionError::UnknownState(_))
        ));
    }

    #[test]
    fn first_assignment_is_unconditional() {
        let definition = Arc::new(
            StatusDefinition::builder()
                .state("open", ["closed"])
                .declare("closed")
                .build()
                .unwrap(),
        );
        let mut engine = StatusEngine::new(definition);
        assert!(engine.status().is_none());
        assert_eq!(engine.allowed_targets().len(), 2);

        engine.set_status("closed").unwrap();
        assert!(engine.is_state("closed"));
        assert!(engine.previous_status().is_none());
        assert!(engine.set_status("open").is_err());
    }

    #[test]
    fn groups_follow_current_status() {
        let mut engine = StatusEngine::new(basic());
        assert!(!engine.is_in_group("active"));

        engine.set_status("tc_pending").unwrap();
        engine.set_status("offline").unwrap();
        assert!(engine.is_in_group("active"));

        assert!(!engine.is_in_group("undeclared"));
    }

    #[test]
    fn perform_moves_through_actions() {
        let mut engine = StatusEngine::new(accounts());

        assert_eq!(engine.perform("grant_access").unwrap(), "tc_pending");
        assert_eq!(engine.perform("accept_tc").unwrap(), "offline");
        assert_eq!(engine.history().last().unwrap().action.as_ref().unwrap(), "accept_tc");

        let err = engine.perform("accept_tc").unwrap_err();
        assert!(matches!(err, TransitionError::ActionNotAvailable { .. }));
        assert!(engine.is_state("offline"));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let mut engine = StatusEngine::new(accounts());
        assert!(matches!(
            engine.perform("teleport"),
            Err(TransitionError::UnknownAction(_))
        ));
        assert!(!engine.can_perform("teleport"));
    }

    #[test]
    fn previous_status_is_restored_by_action() {
        let mut engine = StatusEngine::new(accounts());
        engine.perform("grant_access").unwrap();
        engine.perform("accept_tc").unwrap();
        engine.perform("deny_access").unwrap();

        assert!(engine.can_perform("grant_access"));
        assert_eq!(engine.perform("grant_access").unwrap(), "offline");
        assert_eq!(engine.previous_status().unwrap(), "access_denied");
    }

    #[test]
    fn previous_status_is_required() {
        let definition = Arc::new(
            StatusDefinition::builder()
                .action("undo", Source::Any, Target::previous())
                .action("edit", Source::state("draft"), Target::state("edited"))
                .default_state("draft")
                .build()
                .unwrap(),
        );
        let mut engine = StatusEngine::new(definition);

        let err = engine.perform("undo").unwrap_err();
        assert!(matches!(err, TransitionError::NoPreviousStatus { .. }));
        assert!(engine.is_state("draft"));

        engine.perform("edit").unwrap();
        assert_eq!(engine.perform("undo").unwrap(), "draft");
    }

    #[test]
    fn previous_outside_restriction_is_refused() {
        let mut engine = StatusEngine::new(accounts());
        engine.perform("deny_access").unwrap();
        engine.perform("deny_access").unwrap();

        let err = engine.perform("grant_access").unwrap_err();
        assert!(matches!(err, TransitionError::PreviousNotAllowed { .. }));
        assert!(engine.is_state("access_denied"));
    }

    #[test]
    fn set_status_honours_previous_rules() {
        let mut engine = StatusEngine::new(accounts());
        engine.perform("grant_access").unwrap();
        engine.perform("deny_access").unwrap();

        assert!(engine.allowed_targets().contains("tc_pending"));
        engine.set_status("tc_pending").unwrap();
        assert!(engine.is_state("tc_pending"));
    }

    #[test]
    fn available_actions_reflect_current_status() {
        let engine = StatusEngine::new(accounts());
        let actions: Vec<&str> = engine
            .available_actions()
            .into_iter()
            .map(ActionName::as_str)
            .collect();
        assert_eq!(actions, vec!["deny_access", "grant_access"]);
    }

    #[test]
    fn attach_adopts_persisted_status() {
        let engine = StatusEngine::attach(basic(), MemoryStore::with_status("online")).unwrap();
        assert!(engine.is_state("online"));
        assert_eq!(engine.store().writes(), 0);
    }

    #[test]
    fn attach_writes_default_to_empty_store() {
        let engine = StatusEngine::attach(basic(), MemoryStore::new()).unwrap();
        assert!(engine.is_state("access_pending"));
        assert_eq!(engine.store().writes(), 1);
    }

    #[test]
    fn attach_rejects_undeclared_persisted_status() {
        let result = StatusEngine::attach(basic(), MemoryStore::with_status("archived"));
        assert!(matches!(result, Err(TransitionError::UnknownState(_))));
    }

    #[test]
    fn attach_accepts_borrowed_store() {
        let mut store = MemoryStore::new();
        {
            let mut engine = StatusEngine::attach(basic(), &mut store).unwrap();
            engine.set_status("tc_pending").unwrap();
        }
        assert_eq!(store.read_status().unwrap(), "tc_pending");
    }

    #[test]
    fn failed_write_leaves_engine_unchanged() {
        let mut engine = StatusEngine::attach(basic(), FailingStore).unwrap();

        let err = engine.set_status("online").unwrap_err();
        assert!(matches!(err, TransitionError::Persist(_)));
        assert!(engine.is_state("offline"));
        assert!(engine.previous_status().is_none());
        assert!(engine.history().is_empty());
    }

    #[test]
    fn history_limit_keeps_latest_changes() {
        let mut engine = StatusEngine::new(basic()).with_history_limit(2);
        for status in ["tc_pending", "offline", "online", "offline", "locked"] {
            engine.set_status(status).unwrap();
        }

        assert_eq!(engine.history().len(), 2);
        assert_eq!(engine.history().changes()[0].to, "offline");
        assert_eq!(engine.history().last().unwrap().to, "locked");
        assert_eq!(engine.previous_status().unwrap(), "offline");
        assert_eq!(engine.store().writes(), 5);
    }

    #[test]
    fn long_running_engine_appends_each_change_once() {
        let mut engine = StatusEngine::new(basic());
        engine.set_status("tc_pending").unwrap();
        engine.set_status("offline").unwrap();
        for _ in 0..5_000 {
            engine.set_status("online").unwrap();
            engine.set_status("offline").unwrap();
        }

        assert_eq!(engine.history().len(), 10_002);
        assert_eq!(engine.history().last().unwrap().from.as_ref().unwrap(), "online");
    }
}
