//! Canonical status identifiers.
//!
//! Every status value is a plain string internally. Enumerated status types
//! (see [`status_enum!`](crate::status_enum)) and string literals both
//! normalize to a [`StateName`] before any comparison or lookup.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Sentinel source meaning "legal from every declared state".
pub const ANY_STATUS: &str = "@any";

/// Sentinel target meaning "whatever state was active before the current one".
pub const PREVIOUS_STATUS: &str = "@previous";

/// Names starting with this prefix are reserved for sentinels.
const RESERVED_PREFIX: char = '@';

/// Anything that can stand in for a status name.
///
/// Implemented for `str`, `String`, [`StateName`] and for enums generated by
/// [`status_enum!`](crate::status_enum), so engine operations accept any of
/// them interchangeably.
///
/// # Example
///
/// ```rust
/// use modelstatus::core::{StateName, Status};
///
/// let name = StateName::new("online");
/// assert_eq!(name.name(), "online");
/// assert_eq!("online".name(), name.name());
/// ```
pub trait Status {
    /// The canonical status name.
    fn name(&self) -> &str;
}

impl Status for str {
    fn name(&self) -> &str {
        self
    }
}

impl Status for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}

impl<T: Status + ?Sized> Status for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Canonical name of a declared status.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateName(String);

impl StateName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name collides with a sentinel or is empty.
    pub(crate) fn is_reserved(&self) -> bool {
        is_reserved_name(&self.0)
    }
}

impl Status for StateName {
    fn name(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StateName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StateName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StateName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StateName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&StateName> for StateName {
    fn from(name: &StateName) -> Self {
        name.clone()
    }
}

impl PartialEq<str> for StateName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StateName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Name of a declared action.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionName(String);

impl ActionName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_reserved(&self) -> bool {
        is_reserved_name(&self.0)
    }
}

impl Borrow<str> for ActionName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ActionName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for ActionName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ActionName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Whether `name` is empty or collides with the sentinel namespace.
pub(crate) fn is_reserved_name(name: &str) -> bool {
    name.is_empty() || name.starts_with(RESERVED_PREFIX)
}
