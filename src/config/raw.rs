use kg_backend::{BackendConfig, BackendKind};
use serde::{Deserialize, Serialize};

use crate::{
    config::ConfigError,
    logger::{LoggerConfig, TelemetryConfig},
};

/// Row limits applied by the command layer, plus the advisory query timeout.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct QueryConfig {
    /// Reported to callers; the backend never enforces it
    pub timeout_secs: u64,
    /// Appended as `LIMIT` when SELECT text has none
    pub default_limit: usize,
    /// Upper bound on any requested limit
    pub max_limit: usize,
}

impl QueryConfig {
    /// `requested` (or the default) capped at `max_limit`.
    pub(crate) fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|limit| *limit > 0)
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}

/// Configuration exactly as extracted from the figment layers.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigRaw {
    pub backend: BackendConfig,
    pub query: QueryConfig,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
}

/// Validated configuration passed explicitly to the command layer.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub backend: BackendConfig,
    pub query: QueryConfig,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
}

impl ConfigRaw {
    pub(crate) fn resolve(self) -> Result<Config, ConfigError> {
        if self.query.default_limit == 0 || self.query.max_limit == 0 {
            return Err(ConfigError::InvalidConfig(
                "query.default_limit and query.max_limit must be positive".to_string(),
            ));
        }
        if self.query.default_limit > self.query.max_limit {
            return Err(ConfigError::InvalidConfig(format!(
                "query.default_limit ({}) exceeds query.max_limit ({})",
                self.query.default_limit, self.query.max_limit
            )));
        }
        if self.backend.kind == BackendKind::Remote
            && self.backend.remote.server_url.trim().is_empty()
        {
            return Err(ConfigError::InvalidConfig(
                "backend.remote.server_url is required for the remote backend".to_string(),
            ));
        }

        Ok(Config {
            backend: self.backend,
            query: self.query,
            logger: self.logger,
            telemetry: self.telemetry,
        })
    }
}
