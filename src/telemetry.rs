use std::env;

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}' in {var}")]
    EnvFilter {
        var: &'static str,
        value: String,
        source: ParseError,
    },
    #[error("failed to install subscriber: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

/// `RUST_LOG` wins; otherwise `RISK_LOG_LEVEL`, defaulting to `info`.
/// Logs go to stderr so report output on stdout stays clean.
pub fn init() -> Result<(), TelemetryError> {
    let env_filter = build_filter(
        env::var("RUST_LOG").ok(),
        env::var("RISK_LOG_LEVEL").ok(),
    )?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

fn build_filter(
    rust_log: Option<String>,
    level: Option<String>,
) -> Result<EnvFilter, TelemetryError> {
    let (var, value) = match rust_log.filter(|value| !value.trim().is_empty()) {
        Some(value) => ("RUST_LOG", value),
        None => (
            "RISK_LOG_LEVEL",
            level.unwrap_or_else(|| "info".to_string()),
        ),
    };
    EnvFilter::try_new(&value).map_err(|source| TelemetryError::EnvFilter { var, value, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info() {
        assert!(build_filter(None, None).is_ok());
        assert!(build_filter(Some(" ".to_string()), Some("debug".to_string())).is_ok());
    }

    #[test]
    fn bad_rust_log_is_reported() {
        let err = build_filter(Some("agent_risk=loud".to_string()), Some("info".to_string()))
            .expect_err("RUST_LOG is malformed");
        assert!(matches!(err, TelemetryError::EnvFilter { var: "RUST_LOG", .. }));
    }

    #[test]
    fn bad_level_is_reported() {
        let err = build_filter(None, Some("agent_risk=loud".to_string()))
            .expect_err("level is malformed");
        assert!(matches!(err, TelemetryError::EnvFilter { var: "RISK_LOG_LEVEL", .. }));
    }
}
