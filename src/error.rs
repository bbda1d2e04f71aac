//! Error types for the timer's collaborators
//!
//! None of these reach the engine's callers: the engine logs them and keeps
//! counting. They exist so the persistence, notification and overlay layers
//! can say precisely what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Durable key-value store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on key '{key}' at {path}: {source}")]
    Io {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Value for '{key}' could not be decoded: {value:?}")]
    Decode { key: String, value: String },
}

/// Notification scheduling errors
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notifications are unavailable: {0}")]
    Unavailable(String),
}

/// Overlay surface errors
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Overlay surface is unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write overlay to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode overlay content: {0}")]
    Encode(#[from] serde_json::Error),
}
