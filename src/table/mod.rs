//! The transition table.
//!
//! A [`StatusDefinition`] is the validated, normalized form of a status
//! declaration: the declared states, the transition rules (optionally named
//! by an action), the optional default state and the optional groups. Both
//! declaration styles, state-keyed and action-keyed, end up as the same list
//! of [`Rule`]s.

mod definition;
mod error;
mod rule;

pub(crate) use definition::{Draft, DraftRule};
pub use definition::StatusDefinition;
pub use error::{DefinitionError, DefinitionProblem};
pub use rule::{Rule, Source, Target};
