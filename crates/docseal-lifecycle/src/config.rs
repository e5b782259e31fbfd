use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the lifecycle coordinator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Longest wait for another write on the same document.
    pub lock_timeout_ms: u64,
    /// MIME type recorded when a create does not supply one.
    pub default_mime_type: String,
    /// Author recorded when a request does not name one.
    pub default_author: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5_000,
            default_mime_type: "application/octet-stream".into(),
            default_author: "anonymous".into(),
        }
    }
}

impl LifecycleConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
