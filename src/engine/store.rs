//! Persistence collaborator.

use crate::core::StateName;
use thiserror::Error;

/// Failure reported by a [`StatusStore`].
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Where the persisted status value of one record lives.
///
/// Implemented by the surrounding storage layer (an ORM column, a row in a
/// key-value store). The engine reads the value once when attached and writes
/// it before committing every change.
pub trait StatusStore {
    /// The persisted status, if one has been stored.
    fn read_status(&self) -> Option<StateName>;

    /// Persist `status` as the new value.
    fn write_status(&mut self, status: &StateName) -> Result<(), StoreError>;
}

impl<T: StatusStore + ?Sized> StatusStore for &mut T {
    fn read_status(&self) -> Option<StateName> {
        (**self).read_status()
    }

    fn write_status(&mut self, status: &StateName) -> Result<(), StoreError> {
        (**self).write_status(status)
    }
}

impl<T: StatusStore + ?Sized> StatusStore for Box<T> {
    fn read_status(&self) -> Option<StateName> {
        (**self).read_status()
    }

    fn write_status(&mut self, status: &StateName) -> Result<(), StoreError> {
        (**self).write_status(status)
    }
}

/// In-memory store, used when no external persistence is attached.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    value: Option<StateName>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `status`, as if loaded from disk.
    pub fn with_status(status: impl Into<StateName>) -> Self {
        Self {
            value: Some(status.into()),
            writes: 0,
        }
    }

    /// Number of writes performed through [`StatusStore::write_status`].
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl StatusStore for MemoryStore {
    fn read_status(&self) -> Option<StateName> {
        self.value.clone()
    }

    fn write_status(&mut self, status: &StateName) -> Result<(), StoreError> {
        self.value = Some(status.clone());
        self.writes += 1;
        Ok(())
    }
}
