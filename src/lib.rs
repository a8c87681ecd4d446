//! Readiness scoring for proposed administrative regions.

pub mod config;
pub mod error;
pub mod scoring;
pub mod storage;
pub mod telemetry;
