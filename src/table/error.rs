//! Definition errors.

use thiserror::Error;

/// A single structural problem found while validating a status definition.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionProblem {
    #[error("status table declares no states")]
    Empty,

    #[error("state '{state}' referenced by {referrer} is not declared")]
    UndeclaredState { state: String, referrer: String },

    #[error("default state '{0}' is not declared")]
    UndeclaredDefault(String),

    #[error("group '{group}' references undeclared state '{state}'")]
    UndeclaredGroupMember { group: String, state: String },

    #[error("'{0}' is reserved and cannot name a state, action or group")]
    ReservedName(String),

    #[error("'{sentinel}' cannot be used as {position}")]
    MisplacedSentinel {
        sentinel: &'static str,
        position: &'static str,
    },

    #[error("{referrer} restricts a target that is not '@previous'")]
    UnexpectedRestriction { referrer: String },

    #[error("{referrer} restricts '@previous' to an empty set of states")]
    EmptyRestriction { referrer: String },

    #[error("{referrer} has a rule with no source states")]
    EmptySource { referrer: String },

    #[error("{referrer} combines '@any' with named source states")]
    MixedAnySource { referrer: String },

    #[error("action '{action}' has more than one rule for state '{state}'")]
    AmbiguousAction { action: String, state: String },
}

/// Errors raised while constructing a status definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The declaration is structurally invalid. Every problem found is listed.
    #[error("invalid status definition: {}", join(.0))]
    Invalid(Vec<DefinitionProblem>),

    /// The declaration could not be parsed.
    #[error("failed to parse status declaration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl DefinitionError {
    /// The problems behind an `Invalid` error; empty for parse failures.
    pub fn problems(&self) -> &[DefinitionProblem] {
        match self {
            Self::Invalid(problems) => problems,
            Self::Parse(_) => &[],
        }
    }
}

fn join(problems: &[DefinitionProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_lists_every_problem() {
        let err = DefinitionError::Invalid(vec![
            DefinitionProblem::Empty,
            DefinitionProblem::UndeclaredDefault("archived".to_string()),
        ]);

        assert_eq!(
            err.to_string(),
            "invalid status definition: status table declares no states; \
             default state 'archived' is not declared"
        );
        assert_eq!(err.problems().len(), 2);
    }

    #[test]
    fn parse_errors_carry_no_problems() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DefinitionError::from(json_err);

        assert!(err.problems().is_empty());
        assert!(err.to_string().starts_with("failed to parse status declaration"));
    }
}
