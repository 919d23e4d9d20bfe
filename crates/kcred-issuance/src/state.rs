//! # Application State & Configuration
//!
//! [`AppConfig`] is read from the environment at startup. [`AppState`] holds
//! the engine the handlers share; it is constructed once in `main` (or per
//! test) and cloned into each request via `Arc`.

use std::path::PathBuf;
use std::sync::Arc;

use kcred_core::{Credential, JsonStore, RecordStore, StoreError, WorkerId};

use crate::engine::IssuanceEngine;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3001;

/// File name of the credential store inside the data directory.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Service name reported by health and descriptor endpoints.
pub const SERVICE_NAME: &str = "issuance-service";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory holding `credentials.json`.
    pub data_dir: PathBuf,
    /// Explicit worker label; `None` means detect from the host.
    pub worker_id: Option<String>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("data_dir", &self.data_dir.display())
            .field("worker_id", &self.worker_id.as_deref().unwrap_or("<detect>"))
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from("data"),
            worker_id: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 3001)
    /// - `DATA_DIR` (default: `data`)
    /// - `WORKER_ID` (default: detected from pod / host name)
    /// - `LOG_FORMAT` (`text` or `json`, default: `text`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match env("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: "PORT",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => defaults.port,
        };

        let log_format = match env("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected `text` or `json`".to_string(),
                })
            }
        };

        Ok(Self {
            port,
            data_dir: env("DATA_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            worker_id: env("WORKER_ID").filter(|s| !s.trim().is_empty()),
            log_format,
        })
    }

    /// Resolve the worker label for this process.
    pub fn resolve_worker(&self) -> WorkerId {
        match &self.worker_id {
            Some(id) => WorkerId::new(id.trim()),
            None => WorkerId::detect(),
        }
    }

    /// Path of the credential store file.
    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join(CREDENTIALS_FILE)
    }
}

/// Shared application state accessible to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The issuance engine for this replica.
    pub engine: Arc<IssuanceEngine>,
}

impl AppState {
    /// Wrap an engine.
    pub fn new(engine: IssuanceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// State backed by an in-memory store (tests, local experiments).
    pub fn in_memory(worker: WorkerId) -> Self {
        let store: Arc<dyn RecordStore<Credential>> =
            Arc::new(JsonStore::<Credential>::in_memory("credentials"));
        Self::new(IssuanceEngine::new(store, worker))
    }

    /// State backed by `<data_dir>/credentials.json`.
    pub fn from_config(config: &AppConfig, worker: WorkerId) -> Result<Self, StoreError> {
        let store: Arc<dyn RecordStore<Credential>> =
            Arc::new(JsonStore::<Credential>::open(config.credentials_path(), "credentials")?);
        Ok(Self::new(IssuanceEngine::new(store, worker)))
    }
}
