//! Timer snapshot persistence over a key-value store

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::{error::StoreError, state::TimerSnapshot};

/// Persistence keys, one per snapshot field
pub mod keys {
    pub const WORKOUT_STARTED_AT: &str = "workoutStartedAt";
    pub const IS_RUNNING: &str = "isRunning";
    pub const REST_STARTED_AT: &str = "restStartedAt";
    pub const REST_DURATION_SECONDS: &str = "restDurationSeconds";
    pub const REST_SHOWING: &str = "restShowing";
}

/// Reads and writes [`TimerSnapshot`]s
#[derive(Debug, Clone)]
pub struct TimerStateStore {
    kv: Arc<dyn KeyValueStore>,
}

impl TimerStateStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Write every field of `snapshot`.
    ///
    /// Start instants are written before the flag that vouches for them and
    /// removed only after that flag is cleared, so an interrupted save never
    /// leaves a set flag pointing at a missing instant.
    pub fn save(&self, snapshot: &TimerSnapshot) -> Result<(), StoreError> {
        let snapshot = snapshot.clone().normalized();

        match snapshot.workout_started_at {
            Some(started_at) => {
                self.kv.set(keys::WORKOUT_STARTED_AT, &started_at.to_rfc3339())?;
                self.kv.set(keys::IS_RUNNING, "true")?;
            }
            None => {
                self.kv.set(keys::IS_RUNNING, "false")?;
                self.kv.remove(keys::WORKOUT_STARTED_AT)?;
            }
        }

        self.kv.set(
            keys::REST_DURATION_SECONDS,
            &snapshot.rest_duration_seconds.to_string(),
        )?;
        match snapshot.rest_started_at {
            Some(started_at) => {
                self.kv.set(keys::REST_STARTED_AT, &started_at.to_rfc3339())?;
                self.kv.set(keys::REST_SHOWING, "true")?;
            }
            None => {
                self.kv.set(keys::REST_SHOWING, "false")?;
                self.kv.remove(keys::REST_STARTED_AT)?;
            }
        }

        debug!(
            "Saved timer snapshot: running={}, rest_showing={}",
            snapshot.is_running, snapshot.rest_showing
        );
        Ok(())
    }

    /// Last saved snapshot, or defaults for anything unreadable
    pub fn load(&self) -> TimerSnapshot {
        TimerSnapshot {
            is_running: self.read_bool(keys::IS_RUNNING),
            workout_started_at: self.read_instant(keys::WORKOUT_STARTED_AT),
            rest_showing: self.read_bool(keys::REST_SHOWING),
            rest_started_at: self.read_instant(keys::REST_STARTED_AT),
            rest_duration_seconds: self.read_u32(keys::REST_DURATION_SECONDS),
        }
        .normalized()
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.kv.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read timer state key: {}", e);
                None
            }
        }
    }

    fn decode_failed(key: &str, value: &str) {
        let error = StoreError::Decode {
            key: key.to_string(),
            value: value.to_string(),
        };
        warn!("Ignoring timer state value: {}", error);
    }

    fn read_bool(&self, key: &str) -> bool {
        match self.read(key).as_deref().map(str::trim) {
            Some("true") => true,
            Some("false") | None => false,
            Some(other) => {
                Self::decode_failed(key, other);
                false
            }
        }
    }

    fn read_instant(&self, key: &str) -> Option<DateTime<Utc>> {
        let value = self.read(key)?;
        match DateTime::parse_from_rfc3339(value.trim()) {
            Ok(instant) => Some(instant.with_timezone(&Utc)),
            Err(_) => {
                Self::decode_failed(key, &value);
                None
            }
        }
    }

    fn read_u32(&self, key: &str) -> u32 {
        let Some(value) = self.read(key) else {
            return 0;
        };
        value.trim().parse().unwrap_or_else(|_| {
            Self::decode_failed(key, &value);
            0
        })
    }
}
