//! Exercise metadata the timer reads from the workout domain

use serde::{Deserialize, Serialize};

/// The exercise currently being performed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    /// Custom rest between sets; `None` means use the default
    #[serde(default)]
    pub rest_seconds: Option<u32>,
}

impl Exercise {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rest_seconds: None,
        }
    }

    pub fn with_rest(mut self, rest_seconds: u32) -> Self {
        self.rest_seconds = Some(rest_seconds);
        self
    }

    /// Custom rest if one is set and positive, the default otherwise
    pub fn effective_rest_seconds(&self, default_seconds: u32) -> u32 {
        self.rest_seconds
            .filter(|seconds| *seconds > 0)
            .unwrap_or(default_seconds)
    }
}
