//! Declaration surface for status definitions.
//!
//! Status tables can be declared three ways, all ending in the same validated
//! [`StatusDefinition`](crate::table::StatusDefinition):
//!
//! - [`DefinitionBuilder`]: a fluent Rust API
//! - [`Declaration`]: a serde structure, typically loaded from JSON
//! - [`status_enum!`](crate::status_enum): an enumerated status type whose
//!   variants normalize to canonical names

pub mod declaration;
pub mod definition;
pub mod macros;

pub use declaration::{
    ActionRules, ActionTarget, Declaration, RuleDeclaration, SourceDeclaration, Successors,
};
pub use definition::DefinitionBuilder;
pub use macros::UnknownStatus;
