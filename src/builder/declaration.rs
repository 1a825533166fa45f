//! Serde form of a status declaration.
//!
//! This is the configuration surface of the crate: a declaration attached to
//! an entity type, usually kept as JSON next to the schema. The keys follow
//! the mixin convention:
//!
//! - `status`: state-keyed table. Each state maps to a successor name, a list
//!   of successor names, or a map of action name to target.
//! - `actions`: action-keyed table. Each action maps to one rule or a list of
//!   rules `{ "from": ..., "to": ..., "among": [...] }`.
//! - `default`: the state new instances start in.
//! - `groups`: named sets of states.
//!
//! `"@any"` stands for `ANY_STATUS` in sources and must appear alone.
//! `"@previous"` stands for `PREVIOUS_STATUS` in targets. `among` restricts a
//! `"@previous"` target to the listed states and cannot be empty; leave it out
//! for an unrestricted return.
//!
//! ```rust
//! use modelstatus::table::StatusDefinition;
//!
//! let definition = StatusDefinition::from_json(r#"{
//!     "status": {
//!         "draft": "published",
//!         "published": ["archived", "draft"],
//!         "archived": []
//!     },
//!     "default": "draft"
//! }"#).unwrap();
//!
//! assert!(definition.is_legal("published", "archived"));
//! ```

use crate::builder::definition::{parse_target, DefinitionBuilder};
use crate::core::{ActionName, StateName, ANY_STATUS, PREVIOUS_STATUS};
use crate::table::{DefinitionError, DefinitionProblem, Source, StatusDefinition, Target};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// A complete status declaration.
///
/// A key repeated within one table (a state, an action or a group) is a
/// parse error rather than silently replacing the earlier entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    #[serde(
        default,
        rename = "status",
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "unique_keys"
    )]
    pub states: BTreeMap<String, Successors>,

    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "unique_keys"
    )]
    pub actions: BTreeMap<String, ActionRules>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "unique_keys"
    )]
    pub groups: BTreeMap<String, Vec<String>>,
}

/// Successor specification of a state-keyed entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Successors {
    One(String),
    Many(Vec<String>),
    Actions(#[serde(deserialize_with = "unique_keys")] BTreeMap<String, ActionTarget>),
}

/// Target of an action inside a state-keyed entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionTarget {
    State(String),
    Restricted { to: String, among: Vec<String> },
}

/// Rules of an action-keyed entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionRules {
    One(RuleDeclaration),
    Many(Vec<RuleDeclaration>),
}

/// One `(source, target)` pair of an action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDeclaration {
    pub from: SourceDeclaration,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub among: Option<Vec<String>>,
}

/// The allowed source of an action rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceDeclaration {
    One(String),
    Many(Vec<String>),
}

impl Declaration {
    /// Parse a JSON declaration.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Translate the declaration into builder calls.
    pub fn into_builder(self) -> DefinitionBuilder {
        let mut builder = DefinitionBuilder::new();

        for (state, successors) in self.states {
            builder = match successors {
                Successors::One(target) => builder.state(state, [target]),
                Successors::Many(targets) => builder.state(state, targets),
                Successors::Actions(actions) => {
                    let mut builder = builder.declare(state.as_str());
                    for (action, target) in actions {
                        let referrer = format!("action '{}' of state '{}'", action, state);
                        builder = match action_target(target, &referrer) {
                            Ok(target) => builder.state_action(state.as_str(), action, target),
                            Err(problem) => builder.problem(problem),
                        };
                    }
                    builder
                }
            };
        }

        for (action, rules) in self.actions {
            let rules = match rules {
                ActionRules::One(rule) => vec![rule],
                ActionRules::Many(rules) => rules,
            };
            let action = ActionName::from(action);
            let referrer = format!("action '{}'", action);
            for rule in rules {
                builder = match rule_parts(rule, &referrer) {
                    Ok((source, target)) => builder.action(action.clone(), source, target),
                    Err(problem) => builder.problem(problem),
                };
            }
        }

        if let Some(default) = self.default {
            builder = builder.default_state(default);
        }

        for (group, members) in self.groups {
            builder = builder.group(group, members);
        }

        builder
    }

    /// Validate the declaration into a definition.
    pub fn build(self) -> Result<StatusDefinition, DefinitionError> {
        self.into_builder().build()
    }
}

impl StatusDefinition {
    pub fn from_declaration(declaration: Declaration) -> Result<Self, DefinitionError> {
        declaration.build()
    }

    /// Parse and validate a JSON declaration.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        Declaration::from_json(json)?.build()
    }
}

/// Deserialize a string-keyed map, failing on the first repeated key.
fn unique_keys<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct UniqueKeys<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeys<V> {
        type Value = BTreeMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map with unique keys")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                if map.contains_key(&key) {
                    return Err(de::Error::custom(format!("duplicate key '{}'", key)));
                }
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueKeys(PhantomData))
}

fn action_target(target: ActionTarget, referrer: &str) -> Result<Target, DefinitionProblem> {
    match target {
        ActionTarget::State(name) => parse_target(StateName::from(name)),
        ActionTarget::Restricted { to, among } => restricted_target(to, among, referrer),
    }
}

fn rule_parts(
    rule: RuleDeclaration,
    referrer: &str,
) -> Result<(Source, Target), DefinitionProblem> {
    let names = match rule.from {
        SourceDeclaration::One(name) => vec![name],
        SourceDeclaration::Many(names) => names,
    };
    if names.iter().any(|n| n == PREVIOUS_STATUS) {
        return Err(DefinitionProblem::MisplacedSentinel {
            sentinel: PREVIOUS_STATUS,
            position: "a source",
        });
    }
    let source = if !names.iter().any(|n| n == ANY_STATUS) {
        Source::states(names)
    } else if names.len() == 1 {
        Source::Any
    } else {
        return Err(DefinitionProblem::MixedAnySource {
            referrer: referrer.to_string(),
        });
    };

    let target = match rule.among {
        Some(among) => restricted_target(rule.to, among, referrer)?,
        None => parse_target(StateName::from(rule.to))?,
    };

    Ok((source, target))
}

fn restricted_target(
    to: String,
    among: Vec<String>,
    referrer: &str,
) -> Result<Target, DefinitionProblem> {
    if to != PREVIOUS_STATUS {
        return Err(DefinitionProblem::UnexpectedRestriction {
            referrer: referrer.to_string(),
        });
    }
    Ok(Target::previous_among(among))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"{
        "status": {
            "access_pending": "tc_pending",
            "tc_pending": ["access_denied", "offline"],
            "access_denied": ["offline", "locked", "tc_pending"],
            "offline": ["access_denied", "online", "locked"],
            "online": "offline",
            "locked": "offline"
        },
        "default": "access_pending"
    }"#;

    const STATUS_BASED: &str = r#"{
        "status": {
            "access_pending": { "grant_access": "tc_pending" },
            "tc_pending": { "deny_access": "access_denied", "accept_tc": "offline" },
            "access_denied": {
                "grant_access": { "to": "@previous", "among": ["offline", "locked", "tc_pending"] }
            },
            "offline": { "deny_access": "access_denied", "log_in": "online", "lock": "locked" },
            "online": { "log_out": "offline" },
            "locked": { "reset_password": "offline" }
        },
        "default": "access_pending",
        "groups": { "active": ["online", "offline", "locked"] }
    }"#;

    const ACTION_BASED: &str = r#"{
        "actions": {
            "grant_access": [
                { "from": "access_pending", "to": "tc_pending" },
                { "from": "access_denied", "to": "offline" }
            ],
            "deny_access": { "from": "@any", "to": "access_denied" },
            "accept_tc": { "from": "tc_pending", "to": "offline" },
            "log_in": { "from": "offline", "to": "online" },
            "log_out": { "from": "online", "to": "offline" },
            "lock": { "from": "offline", "to": "locked" },
            "reset_password": { "from": "locked", "to": "offline" }
        },
        "groups": { "active": ["online", "offline", "locked"] }
    }"#;

    #[test]
    fn basic_declaration_builds() {
        let definition = StatusDefinition::from_json(BASIC).unwrap();

        assert_eq!(definition.states().len(), 6);
        assert_eq!(definition.default_state().unwrap(), "access_pending");
        assert!(definition.is_legal("online", "offline"));
        assert!(!definition.is_legal("online", "locked"));
    }

    #[test]
    fn status_based_declaration_builds() {
        let definition = StatusDefinition::from_json(STATUS_BASED).unwrap();

        assert_eq!(
            definition
                .resolve_target("grant_access", "access_pending", None)
                .unwrap(),
            "tc_pending"
        );
        assert_eq!(
            definition
                .resolve_target("grant_access", "access_denied", Some("offline"))
                .unwrap(),
            "offline"
        );
        assert!(definition.group("active").unwrap().contains("locked"));
    }

    #[test]
    fn action_based_declaration_builds() {
        let definition = StatusDefinition::from_json(ACTION_BASED).unwrap();

        assert!(definition.default_state().is_none());
        for state in definition.states() {
            assert_eq!(
                definition
                    .resolve_target("deny_access", state.as_str(), None)
                    .unwrap(),
                "access_denied"
            );
        }
    }

    #[test]
    fn source_lists_are_accepted() {
        let definition = StatusDefinition::from_json(
            r#"{ "actions": { "close": { "from": ["open", "stale"], "to": "closed" } } }"#,
        )
        .unwrap();

        assert!(definition.is_legal("open", "closed"));
        assert!(definition.is_legal("stale", "closed"));
        assert!(!definition.is_legal("closed", "closed"));
    }

    #[test]
    fn dangling_state_reference_is_rejected() {
        let err = StatusDefinition::from_json(
            r#"{ "status": { "draft": "archived" }, "default": "draft" }"#,
        )
        .unwrap_err();

        assert!(matches!(err, DefinitionError::Invalid(_)));
        assert_eq!(
            err.problems(),
            &[DefinitionProblem::UndeclaredState {
                state: "archived".to_string(),
                referrer: "state 'draft'".to_string(),
            }]
        );
    }

    #[test]
    fn previous_as_source_is_rejected() {
        let err = StatusDefinition::from_json(
            r#"{ "actions": { "undo": { "from": "@previous", "to": "open" } } }"#,
        )
        .unwrap_err();

        assert!(err.problems().contains(&DefinitionProblem::MisplacedSentinel {
            sentinel: PREVIOUS_STATUS,
            position: "a source",
        }));
    }

    #[test]
    fn restriction_requires_previous_target() {
        let err = StatusDefinition::from_json(
            r#"{ "actions": { "go": { "from": "a", "to": "b", "among": ["a"] } } }"#,
        )
        .unwrap_err();

        assert!(err.problems().contains(&DefinitionProblem::UnexpectedRestriction {
            referrer: "action 'go'".to_string(),
        }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = StatusDefinition::from_json(r#"{ "status": "#).unwrap_err();
        assert!(matches!(err, DefinitionError::Parse(_)));

        let err = StatusDefinition::from_json(r#"{ "states": {} }"#).unwrap_err();
        assert!(matches!(err, DefinitionError::Parse(_)));
    }

    #[test]
    fn declaration_round_trips_through_json() {
        let declaration = Declaration::from_json(STATUS_BASED).unwrap();
        let json = serde_json::to_string(&declaration).unwrap();
        assert_eq!(Declaration::from_json(&json).unwrap(), declaration);
    }

    #[test]
    fn any_mixed_with_named_sources_is_rejected() {
        let err = StatusDefinition::from_json(
            r#"{ "actions": {
                "open": { "from": "closed", "to": "open" },
                "close": { "from": ["@any", "ghost"], "to": "closed" }
            } }"#,
        )
        .unwrap_err();

        assert_eq!(
            err.problems(),
            &[DefinitionProblem::MixedAnySource {
                referrer: "action 'close'".to_string(),
            }]
        );
    }

    #[test]
    fn empty_source_list_is_rejected() {
        let err = StatusDefinition::from_json(
            r#"{ "actions": {
                "open": { "from": "closed", "to": "open" },
                "close": { "from": [], "to": "closed" }
            } }"#,
        )
        .unwrap_err();

        assert_eq!(
            err.problems(),
            &[DefinitionProblem::EmptySource {
                referrer: "action 'close'".to_string(),
            }]
        );
    }

    #[test]
    fn empty_restriction_is_rejected_in_both_styles() {
        let state_keyed = StatusDefinition::from_json(
            r#"{ "status": {
                "a": { "go": "b" },
                "b": { "back": { "to": "@previous", "among": [] } }
            } }"#,
        )
        .unwrap_err();
        assert_eq!(
            state_keyed.problems(),
            &[DefinitionProblem::EmptyRestriction {
                referrer: "action 'back' of state 'b'".to_string(),
            }]
        );

        let action_keyed = StatusDefinition::from_json(
            r#"{ "actions": {
                "go": { "from": "a", "to": "b" },
                "back": { "from": "b", "to": "@previous", "among": [] }
            } }"#,
        )
        .unwrap_err();
        assert_eq!(
            action_keyed.problems(),
            &[DefinitionProblem::EmptyRestriction {
                referrer: "action 'back'".to_string(),
            }]
        );
    }

    #[test]
    fn missing_restriction_leaves_previous_unrestricted() {
        let definition = StatusDefinition::from_json(
            r#"{ "actions": {
                "go": { "from": "a", "to": "b" },
                "back": { "from": "b", "to": "@previous" }
            } }"#,
        )
        .unwrap();

        assert_eq!(definition.resolve_target("back", "b", Some("a")).unwrap(), "a");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let duplicate_state = r#"{ "status": { "a": "b", "a": "c", "b": [], "c": [] } }"#;
        assert!(matches!(
            StatusDefinition::from_json(duplicate_state),
            Err(DefinitionError::Parse(_))
        ));

        let duplicate_action = r#"{ "actions": {
            "go": { "from": "a", "to": "b" },
            "go": { "from": "b", "to": "a" }
        } }"#;
        assert!(Declaration::from_json(duplicate_action).is_err());

        let duplicate_group = r#"{ "status": { "a": [] }, "groups": { "g": ["a"], "g": [] } }"#;
        assert!(Declaration::from_json(duplicate_group).is_err());

        let duplicate_state_action = r#"{ "status": {
            "a": { "go": "b", "go": "a" },
            "b": []
        } }"#;
        assert!(Declaration::from_json(duplicate_state_action).is_err());
    }
}
