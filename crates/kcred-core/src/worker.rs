//! # Worker Identity
//!
//! Every replica labels the records it writes with a [`WorkerId`]. In a
//! Kubernetes deployment this is the pod name, which is also the container
//! hostname.

use serde::{Deserialize, Serialize};

/// Environment variable that overrides every other source.
pub const WORKER_ID_ENV: &str = "WORKER_ID";

/// Value used when no host identifier can be found.
pub const UNKNOWN_WORKER: &str = "unknown-worker";

/// A label identifying which service replica performed an action.
///
/// Resolved once at startup and never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Create a worker id from an explicit label.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Resolve the worker id for this process.
    ///
    /// Sources, first non-empty wins: `WORKER_ID`, `POD_NAME`, `HOSTNAME`,
    /// the contents of `/etc/hostname`, then `unknown-worker`.
    pub fn detect() -> Self {
        Self::detect_with(
            |key| std::env::var(key).ok(),
            || std::fs::read_to_string("/etc/hostname").ok(),
        )
    }

    fn detect_with(
        env: impl Fn(&str) -> Option<String>,
        hostname_file: impl FnOnce() -> Option<String>,
    ) -> Self {
        let from_env = [WORKER_ID_ENV, "POD_NAME", "HOSTNAME"]
            .into_iter()
            .filter_map(|key| env(key))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty());

        let resolved = from_env
            .or_else(|| {
                hostname_file()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
            .unwrap_or_else(|| UNKNOWN_WORKER.to_string());

        tracing::info!(worker_id = %resolved, "resolved worker identity");
        Self(resolved)
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
