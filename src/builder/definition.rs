//! Fluent builder for status definitions.

use crate::core::{ActionName, StateName, ANY_STATUS, PREVIOUS_STATUS};
use crate::table::{
    DefinitionError, DefinitionProblem, Draft, DraftRule, Rule, Source, StatusDefinition, Target,
};

/// Builder for [`StatusDefinition`] with a fluent API.
///
/// The state-keyed methods ([`state`](Self::state), [`declare`](Self::declare),
/// [`state_action`](Self::state_action)) declare their key state and require
/// every target to be declared elsewhere as a key. The action-keyed method
/// ([`action`](Self::action)) declares every state it mentions.
///
/// # Example
///
/// ```rust
/// use modelstatus::builder::DefinitionBuilder;
/// use modelstatus::table::{Source, Target};
///
/// let definition = DefinitionBuilder::new()
///     .action("publish", Source::state("draft"), Target::state("published"))
///     .action("retract", Source::state("published"), Target::previous())
///     .action("archive", Source::Any, Target::state("archived"))
///     .default_state("draft")
///     .build()
///     .unwrap();
///
/// assert!(definition.has_action("publish"));
/// assert!(definition.is_legal("published", "archived"));
/// ```
#[derive(Default)]
pub struct DefinitionBuilder {
    draft: Draft,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` with its plain successor states.
    ///
    /// A successor equal to `PREVIOUS_STATUS` allows returning to the
    /// previous state.
    pub fn state<I, T>(mut self, name: impl Into<StateName>, successors: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<StateName>,
    {
        let name = name.into();
        let referrer = format!("state '{}'", name);
        for successor in successors {
            match parse_target(successor.into()) {
                Ok(target) => self.draft.rules.push(DraftRule {
                    rule: Rule {
                        action: None,
                        source: Source::state(name.clone()),
                        target,
                    },
                    declares: false,
                    referrer: referrer.clone(),
                }),
                Err(problem) => self.draft.problems.push(problem),
            }
        }
        self.draft.keys.push(name);
        self
    }

    /// Declare `name` without adding any successors.
    pub fn declare(mut self, name: impl Into<StateName>) -> Self {
        self.draft.keys.push(name.into());
        self
    }

    /// Declare that `action` moves `state` to `target`, state-keyed style.
    pub fn state_action(
        mut self,
        state: impl Into<StateName>,
        action: impl Into<ActionName>,
        target: Target,
    ) -> Self {
        let state = state.into();
        let action = action.into();
        self.draft.rules.push(DraftRule {
            referrer: format!("action '{}' of state '{}'", action, state),
            rule: Rule {
                action: Some(action),
                source: Source::state(state.clone()),
                target,
            },
            declares: false,
        });
        self.draft.keys.push(state);
        self
    }

    /// Add an action-keyed rule: `action` moves any state matching `source`
    /// to `target`.
    pub fn action(mut self, action: impl Into<ActionName>, source: Source, target: Target) -> Self {
        let action = action.into();
        self.draft.rules.push(DraftRule {
            referrer: format!("action '{}'", action),
            rule: Rule {
                action: Some(action),
                source,
                target,
            },
            declares: true,
        });
        self
    }

    /// Set the state new instances start in.
    pub fn default_state(mut self, state: impl Into<StateName>) -> Self {
        self.draft.default_state = Some(state.into());
        self
    }

    /// Declare a named group of states.
    pub fn group<I, T>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<StateName>,
    {
        self.draft
            .groups
            .entry(name.into())
            .or_default()
            .extend(members.into_iter().map(Into::into));
        self
    }

    /// Record a problem found before the builder saw the rule.
    pub(crate) fn problem(mut self, problem: DefinitionProblem) -> Self {
        self.draft.problems.push(problem);
        self
    }

    /// Validate and build the definition.
    pub fn build(self) -> Result<StatusDefinition, DefinitionError> {
        StatusDefinition::from_draft(self.draft)
    }
}

/// Interpret a declared target, recognizing the sentinels.
pub(crate) fn parse_target(name: StateName) -> Result<Target, DefinitionProblem> {
    match name.as_str() {
        PREVIOUS_STATUS => Ok(Target::previous()),
        ANY_STATUS => Err(DefinitionProblem::MisplacedSentinel {
            sentinel: ANY_STATUS,
            position: "a target",
        }),
        _ => Ok(Target::State(name)),
    }
}
