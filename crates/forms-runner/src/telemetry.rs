use std::fmt;

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Targets that follow the configured level. Everything else stays at `warn`.
const ENGINE_TARGETS: [&str; 2] = ["forms_runner", "forms_runner_cli"];

/// Per-expression traces are noisy; they only appear when `RUST_LOG` asks for them.
const EXPRESSION_TARGET: &str = "forms_runner::runner::expression";

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid log filter '{value}' for the forms runner")
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Filter directives in effect: `RUST_LOG` verbatim when set, otherwise the configured
/// level scoped to the engine's own targets.
pub(crate) fn filter_directives(config: &TelemetryConfig, rust_log: Option<&str>) -> String {
    if let Some(directives) = rust_log.map(str::trim).filter(|value| !value.is_empty()) {
        return directives.to_string();
    }
    let level = config.log_level.trim();
    let mut directives = vec!["warn".to_string()];
    directives.extend(ENGINE_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.push(format!("{EXPRESSION_TARGET}=warn"));
    directives.join(",")
}

pub(crate) fn build_filter(
    config: &TelemetryConfig,
    rust_log: Option<&str>,
) -> Result<EnvFilter, TelemetryError> {
    let directives = filter_directives(config, rust_log);
    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::EnvFilter {
        value: directives,
        source,
    })
}

/// Install the global subscriber. Logs go to stderr so command output stays parseable.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_filter(config, rust_log.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: level.to_string(),
        }
    }

    #[test]
    fn configured_level_is_scoped_to_engine_targets() {
        let directives = filter_directives(&config("debug"), None);
        assert_eq!(
            directives,
            "warn,forms_runner=debug,forms_runner_cli=debug,forms_runner::runner::expression=warn"
        );
        assert!(build_filter(&config("debug"), None).is_ok());
    }

    #[test]
    fn rust_log_overrides_configured_level() {
        let directives = filter_directives(
            &config("info"),
            Some("forms_runner::runner::expression=trace"),
        );
        assert_eq!(directives, "forms_runner::runner::expression=trace");

        let blank = filter_directives(&config("info"), Some("  "));
        assert!(blank.contains("forms_runner=info"));
    }

    #[test]
    fn invalid_level_reports_the_directives() {
        match build_filter(&config("loud"), None) {
            Err(TelemetryError::EnvFilter { value, .. }) => {
                assert!(value.contains("forms_runner=loud"))
            }
            other => panic!("expected filter error, got {other:?}"),
        }
    }
}
