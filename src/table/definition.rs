//! The validated, immutable transition table.

use crate::builder::DefinitionBuilder;
use crate::core::{is_reserved_name, ActionName, StateName, ANY_STATUS};
use crate::engine::TransitionError;
use crate::table::error::{DefinitionError, DefinitionProblem};
use crate::table::rule::{Rule, Source, Target};
use std::collections::{BTreeMap, BTreeSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<DefinitionProblem>>;

/// Transition table for one entity type.
///
/// Built once through [`DefinitionBuilder`] or a
/// [`Declaration`](crate::builder::Declaration), then shared read-only
/// (typically behind an `Arc`) by every [`StatusEngine`](crate::engine::StatusEngine)
/// of that type.
///
/// # Example
///
/// ```rust
/// use modelstatus::table::StatusDefinition;
///
/// let definition = StatusDefinition::builder()
///     .state("draft", ["published"])
///     .state("published", ["archived", "draft"])
///     .declare("archived")
///     .default_state("draft")
///     .build()
///     .unwrap();
///
/// assert!(definition.is_legal("draft", "published"));
/// assert!(!definition.is_legal("draft", "archived"));
/// assert!(definition.is_sink("archived"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct StatusDefinition {
    states: BTreeSet<StateName>,
    rules: Vec<Rule>,
    actions: BTreeMap<ActionName, Vec<usize>>,
    default_state: Option<StateName>,
    groups: BTreeMap<String, BTreeSet<StateName>>,
}

/// A rule as declared, before validation.
pub(crate) struct DraftRule {
    pub rule: Rule,
    /// Whether the states this rule mentions count as declarations.
    pub declares: bool,
    /// Human readable origin, used in problem reports.
    pub referrer: String,
}

/// Everything a builder collected, before validation.
#[derive(Default)]
pub(crate) struct Draft {
    pub keys: Vec<StateName>,
    pub rules: Vec<DraftRule>,
    pub default_state: Option<StateName>,
    pub groups: BTreeMap<String, Vec<StateName>>,
    pub problems: Vec<DefinitionProblem>,
}

impl StatusDefinition {
    pub fn builder() -> DefinitionBuilder {
        DefinitionBuilder::new()
    }

    /// Validate a draft, reporting every problem found at once.
    pub(crate) fn from_draft(draft: Draft) -> Result<Self, DefinitionError> {
        let Draft {
            keys,
            rules,
            default_state,
            groups,
            problems,
        } = draft;

        let mut states: BTreeSet<StateName> = keys.into_iter().collect();
        for draft_rule in rules.iter().filter(|r| r.declares) {
            states.extend(draft_rule.rule.referenced_states().into_iter().cloned());
        }

        let mut checks: Vec<Check> = problems.into_iter().map(Validation::fail).collect();

        checks.push(require(!states.is_empty(), || DefinitionProblem::Empty));

        for state in states.iter().filter(|s| s.is_reserved()) {
            checks.push(Validation::fail(DefinitionProblem::ReservedName(
                state.to_string(),
            )));
        }

        for draft_rule in &rules {
            if let Some(action) = draft_rule.rule.action.as_ref().filter(|a| a.is_reserved()) {
                checks.push(Validation::fail(DefinitionProblem::ReservedName(
                    action.to_string(),
                )));
            }
            checks.extend(rule_shape(draft_rule));
            for state in draft_rule.rule.referenced_states() {
                checks.push(require(states.contains(state), || {
                    DefinitionProblem::UndeclaredState {
                        state: state.to_string(),
                        referrer: draft_rule.referrer.clone(),
                    }
                }));
            }
        }

        if let Some(default) = &default_state {
            checks.push(require(states.contains(default), || {
                DefinitionProblem::UndeclaredDefault(default.to_string())
            }));
        }

        for (group, members) in &groups {
            if is_reserved_name(group) {
                checks.push(Validation::fail(DefinitionProblem::ReservedName(
                    group.clone(),
                )));
            }
            for member in members {
                checks.push(require(states.contains(member), || {
                    DefinitionProblem::UndeclaredGroupMember {
                        group: group.clone(),
                        state: member.to_string(),
                    }
                }));
            }
        }

        let rules: Vec<Rule> = rules.into_iter().map(|r| r.rule).collect();
        let mut actions: BTreeMap<ActionName, Vec<usize>> = BTreeMap::new();
        for (index, rule) in rules.iter().enumerate() {
            if let Some(action) = &rule.action {
                actions.entry(action.clone()).or_default().push(index);
            }
        }

        let definition = Self {
            states,
            rules,
            actions,
            default_state,
            groups: groups
                .into_iter()
                .map(|(group, members)| (group, members.into_iter().collect()))
                .collect(),
        };

        for action in definition.actions.keys() {
            for state in &definition.states {
                let (specific, any) = definition.matching_rules(action.as_str(), state.as_str());
                let ambiguous = specific.len() > 1 || (specific.is_empty() && any.len() > 1);
                checks.push(require(!ambiguous, || DefinitionProblem::AmbiguousAction {
                    action: action.to_string(),
                    state: state.to_string(),
                }));
            }
        }

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(definition),
            Validation::Failure(found) => {
                let mut problems: Vec<DefinitionProblem> = Vec::new();
                for problem in found.iter() {
                    if !problems.contains(problem) {
                        problems.push(problem.clone());
                    }
                }
                tracing::warn!(problems = problems.len(), "rejected status definition");
                Err(DefinitionError::Invalid(problems))
            }
        }
    }

    /// All declared states.
    pub fn states(&self) -> &BTreeSet<StateName> {
        &self.states
    }

    pub fn contains(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    /// The state assigned to new instances, if one was declared.
    pub fn default_state(&self) -> Option<&StateName> {
        self.default_state.as_ref()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionName> {
        self.actions.keys()
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    pub fn groups(&self) -> &BTreeMap<String, BTreeSet<StateName>> {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&BTreeSet<StateName>> {
        self.groups.get(name)
    }

    /// Literal targets reachable from `state` by any rule, named or not.
    ///
    /// `PREVIOUS_STATUS` targets are not included; see [`permits`](Self::permits).
    pub fn allowed_targets(&self, state: &str) -> BTreeSet<&StateName> {
        self.rules
            .iter()
            .filter(|rule| rule.source.matches(state))
            .filter_map(|rule| rule.target.literal())
            .collect()
    }

    /// Whether `target` is a literal successor of `current`.
    pub fn is_legal(&self, current: &str, target: &str) -> bool {
        self.rules.iter().any(|rule| {
            rule.source.matches(current) && rule.target.literal().is_some_and(|t| t == target)
        })
    }

    /// Like [`is_legal`](Self::is_legal), but also honours `PREVIOUS_STATUS`
    /// rules by resolving them against `previous`.
    pub fn permits(&self, current: &str, previous: Option<&str>, target: &str) -> bool {
        if self.is_legal(current, target) {
            return true;
        }
        previous.is_some_and(|previous| {
            previous == target
                && self.rules.iter().any(|rule| {
                    rule.source.matches(current) && rule.target.admits_previous(previous)
                })
        })
    }

    /// The rule `action` fires from `current`. A rule naming `current`
    /// explicitly wins over an `ANY_STATUS` rule.
    pub fn rule_for(&self, action: &str, current: &str) -> Option<&Rule> {
        let (specific, any) = self.matching_rules(action, current);
        specific.into_iter().chain(any).next()
    }

    /// Resolve the state `action` leads to from `current`.
    pub fn resolve_target(
        &self,
        action: &str,
        current: &str,
        previous: Option<&str>,
    ) -> Result<StateName, TransitionError> {
        if !self.has_action(action) {
            return Err(TransitionError::UnknownAction(action.to_string()));
        }

        let rule = self
            .rule_for(action, current)
            .ok_or_else(|| TransitionError::ActionNotAvailable {
                action: ActionName::from(action),
                from: Some(StateName::from(current)),
            })?;

        match &rule.target {
            Target::State(target) => Ok(target.clone()),
            Target::Previous { .. } => {
                let previous = previous.ok_or_else(|| TransitionError::NoPreviousStatus {
                    action: ActionName::from(action),
                    from: StateName::from(current),
                })?;
                if rule.target.admits_previous(previous) {
                    Ok(StateName::from(previous))
                } else {
                    Err(TransitionError::PreviousNotAllowed {
                        action: ActionName::from(action),
                        from: StateName::from(current),
                        previous: StateName::from(previous),
                    })
                }
            }
        }
    }

    /// Actions that have a rule for `state`.
    pub fn available_actions(&self, state: &str) -> Vec<&ActionName> {
        self.actions
            .iter()
            .filter(|(_, indices)| indices.iter().any(|&i| self.rules[i].source.matches(state)))
            .map(|(action, _)| action)
            .collect()
    }

    /// Whether no rule leads out of `state`.
    pub fn is_sink(&self, state: &str) -> bool {
        !self.rules.iter().any(|rule| rule.source.matches(state))
    }

    fn matching_rules(&self, action: &str, state: &str) -> (Vec<&Rule>, Vec<&Rule>) {
        let mut specific = Vec::new();
        let mut any = Vec::new();
        for &index in self.actions.get(action).into_iter().flatten() {
            let rule = &self.rules[index];
            match &rule.source {
                Source::Any => any.push(rule),
                Source::States(states) if states.contains(state) => specific.push(rule),
                Source::States(_) => {}
            }
        }
        (specific, any)
    }
}

/// Source and restriction problems of a single rule.
fn rule_shape(draft_rule: &DraftRule) -> Vec<Check> {
    let referrer = || draft_rule.referrer.clone();
    let mut checks = Vec::new();
    if let Source::States(states) = &draft_rule.rule.source {
        checks.push(require(!states.is_empty(), || DefinitionProblem::EmptySource {
            referrer: referrer(),
        }));
        checks.push(require(!states.contains(ANY_STATUS), || {
            DefinitionProblem::MixedAnySource {
                referrer: referrer(),
            }
        }));
    }
    if let Target::Previous { among: Some(among) } = &draft_rule.rule.target {
        checks.push(require(!among.is_empty(), || {
            DefinitionProblem::EmptyRestriction {
                referrer: referrer(),
            }
        }));
    }
    checks
}

fn require(ok: bool, problem: impl FnOnce() -> DefinitionProblem) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(problem())
    }
}
