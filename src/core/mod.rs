//! Core status types.
//!
//! This module contains the vocabulary shared by every other module:
//! - Canonical status and action names, and the `Status` trait
//! - The `ANY_STATUS` and `PREVIOUS_STATUS` sentinels
//! - Immutable history of committed status changes

mod history;
mod status;

pub use history::{StatusChange, StatusHistory};
pub(crate) use status::is_reserved_name;
pub use status::{ActionName, StateName, Status, ANY_STATUS, PREVIOUS_STATUS};
