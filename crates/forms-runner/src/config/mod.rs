use std::env;
use std::fmt;
use std::time::Duration;

const DEFAULT_EXPRESSION_TIMEOUT_MS: u64 = 1000;
const DEFAULT_EXPRESSION_MAX_STEPS: u64 = 10_000;
const DEFAULT_MAX_WALK_STEPS: usize = 500;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the runner.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let timeout_ms = read_number("APP_EXPRESSION_TIMEOUT_MS", DEFAULT_EXPRESSION_TIMEOUT_MS)?;
        let max_expression_steps =
            read_number("APP_EXPRESSION_MAX_STEPS", DEFAULT_EXPRESSION_MAX_STEPS)?;
        let max_walk_steps = read_number("APP_MAX_WALK_STEPS", DEFAULT_MAX_WALK_STEPS as u64)?;

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            engine: EngineConfig {
                expression_timeout: Duration::from_millis(timeout_ms),
                max_expression_steps,
                max_walk_steps: max_walk_steps as usize,
            },
        })
    }
}

fn read_number(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Budgets applied while evaluating author expressions and walking the page graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub expression_timeout: Duration,
    pub max_expression_steps: u64,
    pub max_walk_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expression_timeout: Duration::from_millis(DEFAULT_EXPRESSION_TIMEOUT_MS),
            max_expression_steps: DEFAULT_EXPRESSION_MAX_STEPS,
            max_walk_steps: DEFAULT_MAX_WALK_STEPS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a non-negative whole number")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
