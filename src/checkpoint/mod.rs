//! Checkpoint and resume for automatons.
//!
//! A checkpoint captures what an automaton needs to pick up where it left
//! off after a restart: the current simple state, how long it has rested
//! there and which rejected events have already been reported. States,
//! actions and the context are code and are not part of it.

use crate::clock::TimeMillis;
use crate::core::{EventSet, StateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of an automaton.
///
/// # Example
///
/// ```rust
/// use statelog::checkpoint::AutomatonCheckpoint;
/// use statelog::core::StateId;
///
/// let checkpoint = AutomatonCheckpoint::new(StateId::new(3), 1_500, Vec::new());
/// let json = checkpoint.to_json().unwrap();
/// let restored = AutomatonCheckpoint::from_json(&json).unwrap();
/// assert_eq!(restored.current_state, StateId::new(3));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutomatonCheckpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When checkpoint was created
    pub created_at: DateTime<Utc>,

    /// Simple state the automaton rests in
    pub current_state: StateId,

    /// Milliseconds spent in `current_state` when the checkpoint was taken
    pub time_in_state: TimeMillis,

    /// Rejected events already reported, per state
    pub rejected: Vec<(StateId, EventSet)>,
}

impl AutomatonCheckpoint {
    pub fn new(
        current_state: StateId,
        time_in_state: TimeMillis,
        rejected: Vec<(StateId, EventSet)>,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            current_state,
            time_in_state,
            rejected,
        }
    }

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

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    pub fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }
}
