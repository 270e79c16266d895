//! Typed default configuration, the lowest figment layer.

use kg_backend::BackendConfig;

use super::{ConfigRaw, QueryConfig};
use crate::logger::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};

pub(crate) fn config() -> ConfigRaw {
    ConfigRaw {
        backend: BackendConfig::default(),
        query: query(),
        logger: logger(),
        telemetry: telemetry(),
    }
}

fn query() -> QueryConfig {
    QueryConfig {
        timeout_secs: 30,
        default_limit: 100,
        max_limit: 10_000,
    }
}

fn logger() -> LoggerConfig {
    LoggerConfig {
        level: "info".to_string(),
        format: LogFormat::Pretty,
    }
}

fn telemetry() -> TelemetryConfig {
    TelemetryConfig {
        metrics: TelemetryMetricsConfig {
            enabled: false,
            bind_address: "127.0.0.1:9464".to_string(),
        },
    }
}
