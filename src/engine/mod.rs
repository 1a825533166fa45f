//! Runtime enforcement of a status definition.
//!
//! A [`StatusEngine`] is attached to one record. It answers status queries and
//! accepts or rejects changes against a shared
//! [`StatusDefinition`](crate::table::StatusDefinition), persisting accepted
//! changes through a [`StatusStore`].

mod error;
mod machine;
mod store;

pub use error::TransitionError;
pub use machine::StatusEngine;
pub use store::{MemoryStore, StatusStore, StoreError};
