//! # Application State & Configuration

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kcred_core::{JsonStore, RecordStore, VerificationRecord, WorkerId};
use kcred_issuance_client::config::ConfigError as ClientConfigError;
use kcred_issuance_client::{IssuanceClient, IssuanceClientConfig, IssuanceOracle};

use crate::engine::VerificationEngine;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3002;

/// File name of the verification log inside the data directory.
pub const VERIFICATIONS_FILE: &str = "verifications.json";

/// Service name reported by health and descriptor endpoints.
pub const SERVICE_NAME: &str = "verification-service";

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
    #[error(transparent)]
    Issuance(#[from] ClientConfigError),
}

/// Errors building [`AppState`].
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("verification log: {0}")]
    Store(#[from] kcred_core::StoreError),
    #[error("issuance client: {0}")]
    Client(#[from] kcred_issuance_client::IssuanceClientError),
}

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory holding `verifications.json`.
    pub data_dir: PathBuf,
    /// Explicit worker label; `None` means detect from the host.
    pub worker_id: Option<String>,
    /// Log output format.
    pub log_format: LogFormat,
    /// Where and how to reach the issuance service.
    pub issuance: IssuanceClientConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("data_dir", &self.data_dir.display())
            .field("worker_id", &self.worker_id.as_deref().unwrap_or("<detect>"))
            .field("log_format", &self.log_format)
            .field("issuance_url", &self.issuance.base_url.as_str())
            .field("issuance_timeout_secs", &self.issuance.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 3002)
    /// - `DATA_DIR` (default: `data`)
    /// - `WORKER_ID` (default: detected from pod / host name)
    /// - `LOG_FORMAT` (`text` or `json`, default: `text`)
    /// - `ISSUANCE_SERVICE_URL` (default: `http://localhost:3001`)
    /// - `ISSUANCE_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match env("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: "PORT",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => DEFAULT_PORT,
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
                .unwrap_or_else(|| PathBuf::from("data")),
            worker_id: env("WORKER_ID").filter(|s| !s.trim().is_empty()),
            log_format,
            issuance: IssuanceClientConfig::from_lookup(&env)?,
        })
    }

    /// Resolve the worker label for this process.
    pub fn resolve_worker(&self) -> WorkerId {
        match &self.worker_id {
            Some(id) => WorkerId::new(id.trim()),
            None => WorkerId::detect(),
        }
    }

    /// Path of the verification log file.
    pub fn verifications_path(&self) -> PathBuf {
        self.data_dir.join(VERIFICATIONS_FILE)
    }

    /// Upper bound on one oracle call.
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.issuance.timeout_secs)
    }
}

/// Shared application state accessible to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The verification engine for this replica.
    pub engine: Arc<VerificationEngine>,
}

impl AppState {
    /// Wrap an engine.
    pub fn new(engine: VerificationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// State with an in-memory log and the given oracle (tests).
    pub fn with_oracle(oracle: Arc<dyn IssuanceOracle>, worker: WorkerId, timeout: Duration) -> Self {
        let log: Arc<dyn RecordStore<VerificationRecord>> =
            Arc::new(JsonStore::<VerificationRecord>::in_memory("verifications"));
        Self::new(VerificationEngine::new(oracle, log, worker, timeout))
    }

    /// State backed by `<data_dir>/verifications.json` and an HTTP oracle.
    pub fn from_config(config: &AppConfig, worker: WorkerId) -> Result<Self, StartupError> {
        let log: Arc<dyn RecordStore<VerificationRecord>> = Arc::new(
            JsonStore::<VerificationRecord>::open(config.verifications_path(), "verifications")?,
        );
        let oracle: Arc<dyn IssuanceOracle> =
            Arc::new(IssuanceClient::new(config.issuance.clone())?);
        Ok(Self::new(VerificationEngine::new(
            oracle,
            log,
            worker,
            config.oracle_timeout(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3002);
        assert_eq!(config.verifications_path(), PathBuf::from("data/verifications.json"));
        assert_eq!(config.issuance.base_url.as_str(), "http://localhost:3001/");
        assert_eq!(config.oracle_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn reads_issuance_settings() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ISSUANCE_SERVICE_URL", "http://issuance-service:3001"),
            ("ISSUANCE_TIMEOUT_SECS", "3"),
            ("WORKER_ID", "verifier-2"),
        ]))
        .unwrap();
        assert_eq!(config.issuance.base_url.host_str(), Some("issuance-service"));
        assert_eq!(config.oracle_timeout(), Duration::from_secs(3));
        assert_eq!(config.resolve_worker().as_str(), "verifier-2");
    }

    #[test]
    fn bad_issuance_url_is_a_config_error() {
        let err =
            AppConfig::from_lookup(lookup(&[("ISSUANCE_SERVICE_URL", "::nope::")])).unwrap_err();
        assert!(matches!(err, ConfigError::Issuance(_)));
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "70000")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn debug_includes_issuance_url() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert!(format!("{config:?}").contains("localhost:3001"));
    }
}
