//! Diagnostics for one kg-bridge invocation.
//!
//! Command results own stdout, so every log line is written to stderr. The
//! filter comes from `--debug`, then `RUST_LOG`, then `logger.level`. Backend
//! call metrics are only exported when `telemetry.metrics.enabled` is set.

mod config;

use std::net::SocketAddr;

pub(crate) use config::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEBUG_DIRECTIVE: &str = "kg_bridge=debug,kg_backend=debug";

/// Installs the stderr subscriber and, when enabled, the Prometheus exporter.
pub(crate) fn initialize(
    logger_config: &LoggerConfig,
    telemetry_config: &TelemetryConfig,
    force_debug: bool,
) {
    let directives = filter_directives(
        force_debug,
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        &logger_config.level,
    );
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|error| {
        eprintln!("Ignoring invalid log filter '{directives}': {error}");
        EnvFilter::new("info")
    });

    install_subscriber(logger_config.format, filter);
    install_exporter(&telemetry_config.metrics);
}

/// `--debug` beats `RUST_LOG`, which beats the configured level.
fn filter_directives(force_debug: bool, env: Option<String>, configured: &str) -> String {
    if force_debug {
        return DEBUG_DIRECTIVE.to_string();
    }
    env.filter(|directives| !directives.trim().is_empty())
        .unwrap_or_else(|| configured.to_string())
}

fn install_subscriber(format: LogFormat, filter: EnvFilter) {
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    if let Err(error) = installed {
        eprintln!("Logging already initialized: {error}");
    }
}

fn install_exporter(metrics_config: &TelemetryMetricsConfig) {
    if !metrics_config.enabled {
        return;
    }

    let bind_address: SocketAddr = match metrics_config.bind_address.parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::warn!(
                bind_address = %metrics_config.bind_address,
                error = %error,
                "Invalid metrics bind address; backend metrics not exported"
            );
            return;
        }
    };

    match PrometheusBuilder::new()
        .with_http_listener(bind_address)
        .install()
    {
        Ok(()) => tracing::info!(bind_address = %bind_address, "Exporting backend metrics"),
        Err(error) => tracing::warn!(
            bind_address = %bind_address,
            error = %error,
            "Failed to start metrics exporter"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_wins() {
        assert_eq!(
            filter_directives(true, Some("warn".to_string()), "info"),
            DEBUG_DIRECTIVE
        );
    }

    #[test]
    fn env_beats_configured_level() {
        assert_eq!(
            filter_directives(false, Some("kg_backend=trace".to_string()), "info"),
            "kg_backend=trace"
        );
        assert_eq!(filter_directives(false, Some("  ".to_string()), "warn"), "warn");
        assert_eq!(filter_directives(false, None, "error"), "error");
    }
}
