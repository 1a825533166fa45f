//! Checkpoint and resume for status engines.
//!
//! A checkpoint captures the current status, the previous status and the
//! change history of one engine. The definition itself is not included: it is
//! shared configuration and must be supplied again on resume.

use crate::core::{StateName, StatusHistory};
use crate::engine::{StatusEngine, StatusStore};
use crate::table::StatusDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a [`StatusEngine`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusCheckpoint {
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    pub timestamp: DateTime<Utc>,

    pub current: Option<StateName>,

    pub previous: Option<StateName>,

    pub history: StatusHistory,
}

impl StatusCheckpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    /// Compact binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }

    fn validate(&self, definition: &StatusDefinition) -> Result<(), CheckpointError> {
        let undeclared = |state: &StateName| !definition.contains(state.as_str());

        let mut referenced = self.current.iter().chain(self.previous.iter()).chain(
            self.history
                .changes()
                .iter()
                .flat_map(|change| change.from.iter().chain(std::iter::once(&change.to))),
        );
        match referenced.find(|state| undeclared(state)) {
            Some(state) => Err(CheckpointError::ValidationFailed(format!(
                "status '{}' is not declared",
                state
            ))),
            None if self.current.is_none() && self.previous.is_some() => Err(
                CheckpointError::ValidationFailed("previous status without a current one".into()),
            ),
            None => self.check_history(),
        }
    }

    /// The last recorded change must lead from `previous` to `current`.
    fn check_history(&self) -> Result<(), CheckpointError> {
        let Some(last) = self.history.last() else {
            return Ok(());
        };
        if self.current.as_ref() != Some(&last.to) {
            return Err(CheckpointError::ValidationFailed(format!(
                "history ends in '{}' but the current status is {}",
                last.to,
                describe(self.current.as_ref())
            )));
        }
        if self.previous != last.from {
            return Err(CheckpointError::ValidationFailed(format!(
                "history leaves {} but the previous status is {}",
                describe(last.from.as_ref()),
                describe(self.previous.as_ref())
            )));
        }
        Ok(())
    }
}

impl<St: StatusStore> StatusEngine<St> {
    /// Snapshot the engine's status, previous status and history.
    pub fn checkpoint(&self) -> StatusCheckpoint {
        StatusCheckpoint {
            version: CHECKPOINT_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            current: self.current.clone(),
            previous: self.previous.clone(),
            history: self.history.clone(),
        }
    }

    /// Rebuild an engine from `checkpoint`, writing its current status to `store`.
    pub fn resume(
        definition: Arc<StatusDefinition>,
        mut store: St,
        checkpoint: StatusCheckpoint,
    ) -> Result<Self, CheckpointError> {
        checkpoint.check_version()?;
        checkpoint.validate(&definition)?;

        match (&checkpoint.current, store.read_status()) {
            (Some(current), _) => store.write_status(current)?,
            (None, Some(stale)) => {
                return Err(CheckpointError::ValidationFailed(format!(
                    "checkpoint has no status but the store holds '{}'",
                    stale
                )))
            }
            (None, None) => {}
        }
        tracing::debug!(
            checkpoint = %checkpoint.id,
            status = checkpoint.current.as_ref().map(StateName::as_str),
            "resumed status engine"
        );

        Ok(Self {
            definition,
            store,
            current: checkpoint.current,
            previous: checkpoint.previous,
            history: checkpoint.history,
            history_limit: None,
        })
    }
}

fn describe(state: Option<&StateName>) -> String {
    match state {
        Some(state) => format!("'{}'", state),
        None => "unset".to_string(),
    }
}
