use std::fmt;

use crate::config::ConfigError;
use crate::scoring::{AssessmentServiceError, BenchmarkError, ConfigurationError};
use crate::telemetry::TelemetryError;

/// Failures surfaced by the binaries; domain layers use their own error types.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Catalog(ConfigurationError),
    Benchmark(BenchmarkError),
    Assessment(AssessmentServiceError),
    Json(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {err}"),
            AppError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            AppError::Io(err) => write!(f, "io error: {err}"),
            AppError::Catalog(err) => write!(f, "catalog error: {err}"),
            AppError::Benchmark(err) => write!(f, "benchmark error: {err}"),
            AppError::Assessment(err) => write!(f, "assessment error: {err}"),
            AppError::Json(err) => write!(f, "invalid json: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Benchmark(err) => Some(err),
            AppError::Assessment(err) => Some(err),
            AppError::Json(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ConfigurationError> for AppError {
    fn from(value: ConfigurationError) -> Self {
        Self::Catalog(value)
    }
}

impl From<BenchmarkError> for AppError {
    fn from(value: BenchmarkError) -> Self {
        Self::Benchmark(value)
    }
}

impl From<AssessmentServiceError> for AppError {
    fn from(value: AssessmentServiceError) -> Self {
        Self::Assessment(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
