//! Modelstatus: declarative status fields for persisted records
//!
//! A status definition declares which statuses a record may hold and which
//! changes between them are legal. A status engine attached to each record
//! enforces that definition at runtime and writes accepted changes through to
//! the record's storage.
//!
//! # Core Concepts
//!
//! - **Definition**: validated transition table shared by every record of a
//!   model, built once with [`DefinitionBuilder`](builder::DefinitionBuilder)
//!   or loaded from a JSON [`Declaration`](builder::Declaration)
//! - **Actions**: named transitions whose target depends on the current status
//! - **Sentinels**: [`ANY_STATUS`] matches every declared status as a source,
//!   [`PREVIOUS_STATUS`] resolves to the status held before the last change
//! - **Groups**: named sets of statuses for membership queries
//! - **Engine**: per-record [`StatusEngine`] with pluggable persistence
//!
//! # Example
//!
//! ```rust
//! use modelstatus::{Source, StatusDefinition, StatusEngine, Target, ANY_STATUS};
//! use std::sync::Arc;
//!
//! let definition = Arc::new(
//!     StatusDefinition::builder()
//!         .action("log_in", Source::state("offline"), Target::state("online"))
//!         .action("log_out", Source::state("online"), Target::state("offline"))
//!         .action("lock", Source::Any, Target::state("locked"))
//!         .action("unlock", Source::state("locked"), Target::previous())
//!         .default_state("offline")
//!         .build()
//!         .unwrap(),
//! );
//!
//! let mut account = StatusEngine::new(definition);
//! account.perform("log_in").unwrap();
//! account.perform("lock").unwrap();
//! assert_eq!(account.perform("unlock").unwrap(), "online");
//! assert_eq!(ANY_STATUS, "@any");
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod engine;
pub mod table;

// Re-export commonly used types
pub use self::builder::{Declaration, DefinitionBuilder};
pub use self::checkpoint::{CheckpointError, StatusCheckpoint};
pub use self::core::{
    ActionName, StateName, Status, StatusChange, StatusHistory, ANY_STATUS, PREVIOUS_STATUS,
};
pub use self::engine::{MemoryStore, StatusEngine, StatusStore, StoreError, TransitionError};
pub use self::table::{DefinitionError, DefinitionProblem, Rule, Source, Target, StatusDefinition};

#[doc(hidden)]
pub use serde as __serde;
