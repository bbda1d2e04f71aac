//! Durable timer state
//!
//! A flat key-value namespace, one entry per snapshot field, so a crash in
//! the middle of a save still leaves every other key readable.

pub mod file;
pub mod memory;
pub mod timer_store;

use std::fmt;

use crate::error::StoreError;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use timer_store::{keys, TimerStateStore};

/// Minimal string key-value storage
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
