//! Normalized transition rules.

use crate::core::{ActionName, StateName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The states a rule may fire from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// `ANY_STATUS`: every declared state.
    Any,
    /// One of the listed states.
    States(BTreeSet<StateName>),
}

impl Source {
    /// Source restricted to a single state.
    pub fn state(name: impl Into<StateName>) -> Self {
        Self::States(BTreeSet::from([name.into()]))
    }

    /// Source restricted to any of the listed states.
    pub fn states<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<StateName>,
    {
        Self::States(names.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, state: &str) -> bool {
        match self {
            Self::Any => true,
            Self::States(states) => states.contains(state),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

/// Where a rule leads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// A literal declared state.
    State(StateName),
    /// `PREVIOUS_STATUS`: the state held before the current one, optionally
    /// restricted to a set of states it must belong to.
    Previous { among: Option<BTreeSet<StateName>> },
}

impl Target {
    pub fn state(name: impl Into<StateName>) -> Self {
        Self::State(name.into())
    }

    /// Unrestricted `PREVIOUS_STATUS`.
    pub fn previous() -> Self {
        Self::Previous { among: None }
    }

    /// `PREVIOUS_STATUS` that only resolves when the previous state is one of `names`.
    pub fn previous_among<I, T>(names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<StateName>,
    {
        Self::Previous {
            among: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    /// The literal target, if this is not a `PREVIOUS_STATUS` target.
    pub fn literal(&self) -> Option<&StateName> {
        match self {
            Self::State(name) => Some(name),
            Self::Previous { .. } => None,
        }
    }

    /// Whether `previous` is an acceptable resolution of this target.
    pub(crate) fn admits_previous(&self, previous: &str) -> bool {
        match self {
            Self::State(_) => false,
            Self::Previous { among: None } => true,
            Self::Previous { among: Some(among) } => among.contains(previous),
        }
    }
}

/// A single normalized transition rule.
///
/// State-keyed declarations produce rules without an action; action-keyed
/// declarations and per-state action maps produce named rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub action: Option<ActionName>,
    pub source: Source,
    pub target: Target,
}

impl Rule {
    /// Every state name this rule mentions: sources first, then the target side.
    pub(crate) fn referenced_states(&self) -> Vec<&StateName> {
        let mut names: Vec<&StateName> = Vec::new();
        if let Source::States(states) = &self.source {
            names.extend(states);
        }
        match &self.target {
            Target::State(name) => names.push(name),
            Target::Previous { among: Some(among) } => names.extend(among),
            Target::Previous { among: None } => {}
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_source_matches_everything() {
        assert!(Source::Any.matches("online"));
        assert!(Source::Any.matches("locked"));
        assert!(Source::Any.is_any());
    }

    #[test]
    fn listed_sources_match_members_only() {
        let source = Source::states(["online", "offline"]);
        assert!(source.matches("online"));
        assert!(source.matches("offline"));
        assert!(!source.matches("locked"));
        assert!(!source.is_any());
    }

    #[test]
    fn previous_targets_respect_restriction() {
        assert!(Target::previous().admits_previous("anything"));

        let restricted = Target::previous_among(["offline", "locked"]);
        assert!(restricted.admits_previous("offline"));
        assert!(!restricted.admits_previous("online"));
        assert!(restricted.literal().is_none());

        let literal = Target::state("online");
        assert!(!literal.admits_previous("online"));
        assert_eq!(literal.literal().unwrap(), "online");
    }

    #[test]
    fn referenced_states_cover_source_target_and_restriction() {
        let rule = Rule {
            action: Some(ActionName::new("grant_access")),
            source: Source::state("access_denied"),
            target: Target::previous_among(["offline", "tc_pending"]),
        };

        let names: Vec<&str> = rule
            .referenced_states()
            .into_iter()
            .map(StateName::as_str)
            .collect();
        assert_eq!(names, vec!["access_denied", "offline", "tc_pending"]);
    }
}
