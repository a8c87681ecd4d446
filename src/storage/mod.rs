//! Persistence collaborators the scoring engine depends on.
//!
//! The engine never talks to a database directly; callers inject these
//! traits. `memory` provides process-local implementations for tests and
//! the demo service.

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::scoring::{IndicatorCode, RegionId, RegionInputs, RegionRecord, StoredInputs};

/// Benchmark override persistence.
#[async_trait]
pub trait BenchmarkRepository: Send + Sync {
    async fn load_all(&self) -> Result<BTreeMap<IndicatorCode, f64>, PersistenceError>;

    async fn save_many(&self, values: &BTreeMap<IndicatorCode, f64>)
        -> Result<(), PersistenceError>;
}

/// Region record persistence.
#[async_trait]
pub trait RegionRepository: Send + Sync {
    async fn load_inputs(&self, region: &RegionId) -> Result<Option<RegionInputs>, PersistenceError>;

    async fn load(&self, region: &RegionId) -> Result<Option<RegionRecord>, PersistenceError>;

    /// Upserts the record; saving the same record twice is a no-op.
    async fn save_result(&self, record: &RegionRecord) -> Result<(), PersistenceError>;

    /// Every region holding at least one submitted value.
    async fn load_all_with_inputs(&self) -> Result<Vec<StoredInputs>, PersistenceError>;

    async fn list(&self) -> Result<Vec<RegionRecord>, PersistenceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PersistenceError {
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
