use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::benchmark::BenchmarkTable;
use super::catalog::ConfigurationError;
use super::evaluation::EngineRegistry;
use super::locks::RegionLocks;
use super::region::{RegionId, RegionRecord, StoredInputs};
use crate::storage::{PersistenceError, RegionRepository};

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Batch shape for bulk recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for RecomputeSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: Duration::ZERO,
        }
    }
}

/// One region that could not be recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecomputeFailure {
    pub region: RegionId,
    pub error: PersistenceError,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecomputeReport {
    pub updated: Vec<RegionRecord>,
    pub failures: Vec<RecomputeFailure>,
    /// Records with no submitted value; left untouched.
    pub skipped: usize,
}

impl RecomputeReport {
    pub fn succeeded(&self) -> usize {
        self.updated.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_complete() {
            format!("{} regions recomputed", self.succeeded())
        } else {
            format!(
                "{} regions recomputed, {} failed",
                self.succeeded(),
                self.failed()
            )
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecomputeError {
    #[error("could not load stored regions: {0}")]
    Load(#[from] PersistenceError),
    #[error("benchmarks unusable, nothing recomputed: {0}")]
    Configuration(#[from] ConfigurationError),
}

enum RegionFailure {
    Configuration(ConfigurationError),
    Persistence(PersistenceError),
}

/// Re-evaluates stored regions against the current benchmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecomputeCoordinator {
    settings: RecomputeSettings,
}

impl RecomputeCoordinator {
    pub fn new(settings: RecomputeSettings) -> Self {
        Self {
            settings: RecomputeSettings {
                batch_size: settings.batch_size.max(1),
                ..settings
            },
        }
    }

    pub fn settings(&self) -> RecomputeSettings {
        self.settings
    }

    /// Loads every region with submitted values, then recomputes them.
    pub async fn recompute_stored<R>(
        &self,
        engines: &EngineRegistry,
        benchmarks: &BenchmarkTable,
        repository: &R,
        locks: &RegionLocks,
    ) -> Result<RecomputeReport, RecomputeError>
    where
        R: RegionRepository + ?Sized,
    {
        let records = repository.load_all_with_inputs().await?;
        self.recompute_all(records, engines, benchmarks, repository, locks)
            .await
    }

    /// A failing region is recorded in the report and never stops the others.
    ///
    /// Each region is rewritten under its write lock from the inputs stored at
    /// that moment, so a save landing mid-run is never overwritten with older
    /// values. Unusable benchmarks abort before any region is touched.
    pub async fn recompute_all<R>(
        &self,
        records: Vec<StoredInputs>,
        engines: &EngineRegistry,
        benchmarks: &BenchmarkTable,
        repository: &R,
        locks: &RegionLocks,
    ) -> Result<RecomputeReport, RecomputeError>
    where
        R: RegionRepository + ?Sized,
    {
        engines.check_benchmarks(benchmarks)?;

        let mut report = RecomputeReport::default();
        let (pending, empty): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|stored| stored.inputs.has_values());
        report.skipped = empty.len();

        let batches: Vec<&[StoredInputs]> = pending.chunks(self.settings.batch_size).collect();
        let batch_count = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            if index > 0 && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }

            let outcomes = join_all(
                batch
                    .iter()
                    .map(|stored| recompute_one(stored, engines, benchmarks, repository, locks)),
            )
            .await;

            let mut batch_failures = 0;
            for (stored, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(Some(record)) => report.updated.push(record),
                    Ok(None) => report.skipped += 1,
                    Err(RegionFailure::Configuration(error)) => {
                        warn!(region = %stored.region, %error, "recompute aborted");
                        return Err(error.into());
                    }
                    Err(RegionFailure::Persistence(error)) => {
                        warn!(region = %stored.region, %error, "recompute failed");
                        batch_failures += 1;
                        report.failures.push(RecomputeFailure {
                            region: stored.region.clone(),
                            error,
                        });
                    }
                }
            }
            debug!(
                batch = index + 1,
                of = batch_count,
                size = batch.len(),
                failures = batch_failures,
                "recompute batch finished"
            );
        }

        info!(
            updated = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped,
            "recompute finished"
        );
        Ok(report)
    }
}

/// `Ok(None)` when the stored inputs were cleared since the run started.
async fn recompute_one<R>(
    stored: &StoredInputs,
    engines: &EngineRegistry,
    benchmarks: &BenchmarkTable,
    repository: &R,
    locks: &RegionLocks,
) -> Result<Option<RegionRecord>, RegionFailure>
where
    R: RegionRepository + ?Sized,
{
    let _guard = locks.acquire(&stored.region).await;

    let inputs = repository
        .load_inputs(&stored.region)
        .await
        .map_err(RegionFailure::Persistence)?
        .unwrap_or_else(|| stored.inputs.clone());
    if !inputs.has_values() {
        return Ok(None);
    }

    let result = engines
        .for_granularity(stored.region.granularity)
        .evaluate(&inputs, benchmarks)
        .map_err(RegionFailure::Configuration)?;

    let record = RegionRecord {
        region: stored.region.clone(),
        inputs,
        result: Some(result),
        updated_at: Utc::now(),
    };
    repository
        .save_result(&record)
        .await
        .map_err(RegionFailure::Persistence)?;
    Ok(Some(record))
}
