use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::benchmark::{BenchmarkEntry, BenchmarkError, BenchmarkStore};
use super::catalog::{ConfigurationError, IndicatorCode};
use super::evaluation::{AssessmentResult, EngineRegistry};
use super::inputs::RegionInputs;
use super::locks::RegionLocks;
use super::recap::{Recap, RecapFilter};
use super::recompute::{RecomputeCoordinator, RecomputeError, RecomputeReport, RecomputeSettings};
use super::region::{Granularity, RegionId, RegionRecord};
use crate::storage::{BenchmarkRepository, PersistenceError, RegionRepository};

/// Service composing the engines, benchmark store and region repository.
pub struct AssessmentService<R, B> {
    engines: Arc<EngineRegistry>,
    benchmarks: Arc<BenchmarkStore<B>>,
    regions: Arc<R>,
    coordinator: RecomputeCoordinator,
    view: RwLock<BTreeMap<RegionId, RegionRecord>>,
    locks: RegionLocks,
}

impl<R, B> AssessmentService<R, B>
where
    R: RegionRepository + 'static,
    B: BenchmarkRepository + 'static,
{
    pub fn new(
        engines: Arc<EngineRegistry>,
        benchmarks: Arc<BenchmarkStore<B>>,
        regions: Arc<R>,
        settings: RecomputeSettings,
    ) -> Self {
        Self {
            engines,
            benchmarks,
            regions,
            coordinator: RecomputeCoordinator::new(settings),
            view: RwLock::new(BTreeMap::new()),
            locks: RegionLocks::new(),
        }
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    pub fn benchmarks(&self) -> &BenchmarkStore<B> {
        &self.benchmarks
    }

    pub fn threshold(&self, granularity: Granularity) -> i64 {
        self.engines.for_granularity(granularity).policy().threshold
    }

    /// Fills the read cache from the repository; returns the number of records.
    pub async fn warm(&self) -> Result<usize, AssessmentServiceError> {
        let records = self.regions.list().await?;
        let count = records.len();
        let mut view = self.view.write().await;
        view.clear();
        view.extend(
            records
                .into_iter()
                .map(|record| (record.region.clone(), record)),
        );
        info!(regions = count, "region cache warmed");
        Ok(count)
    }

    /// Evaluates without persisting anything.
    pub fn preview(
        &self,
        region: &RegionId,
        inputs: &RegionInputs,
    ) -> Result<AssessmentResult, AssessmentServiceError> {
        let result = self
            .engines
            .for_granularity(region.granularity)
            .evaluate(inputs, &self.benchmarks.snapshot())?;
        Ok(result)
    }

    /// Evaluates and persists. The cache only changes once the repository confirms.
    pub async fn save(
        &self,
        region: RegionId,
        inputs: RegionInputs,
    ) -> Result<RegionRecord, AssessmentServiceError> {
        let _guard = self.locks.acquire(&region).await;

        let result = self.preview(&region, &inputs)?;
        if !result.rejected.is_empty() {
            warn!(%region, rejected = result.rejected.len(), "unreadable values scored as absent");
        }

        let record = RegionRecord {
            region,
            inputs,
            result: Some(result),
            updated_at: Utc::now(),
        };
        self.regions.save_result(&record).await?;

        self.view
            .write()
            .await
            .insert(record.region.clone(), record.clone());
        info!(
            region = %record.region,
            total = record.total(),
            status = record.status_label(),
            "assessment saved"
        );
        Ok(record)
    }

    pub async fn record(&self, region: &RegionId) -> Result<RegionRecord, AssessmentServiceError> {
        if let Some(record) = self.view.read().await.get(region) {
            return Ok(record.clone());
        }

        let record = self
            .regions
            .load(region)
            .await?
            .ok_or(PersistenceError::NotFound)?;
        self.view
            .write()
            .await
            .insert(record.region.clone(), record.clone());
        Ok(record)
    }

    pub fn benchmark_entries(
        &self,
        granularity: Granularity,
    ) -> Result<Vec<BenchmarkEntry>, AssessmentServiceError> {
        let catalog = self.engines.for_granularity(granularity).catalog();
        Ok(self.benchmarks.export(catalog)?)
    }

    /// Applies overrides and, when asked, recomputes every stored region.
    pub async fn update_benchmarks(
        &self,
        values: BTreeMap<IndicatorCode, f64>,
        recompute: bool,
    ) -> Result<Option<RecomputeReport>, AssessmentServiceError> {
        self.benchmarks.set_many(values).await?;
        self.recompute_if(recompute).await
    }

    pub async fn reset_benchmarks(
        &self,
        recompute: bool,
    ) -> Result<Option<RecomputeReport>, AssessmentServiceError> {
        self.benchmarks.reset_to_defaults().await?;
        self.recompute_if(recompute).await
    }

    pub async fn recompute(&self) -> Result<RecomputeReport, AssessmentServiceError> {
        let report = self
            .coordinator
            .recompute_stored(
                &self.engines,
                &self.benchmarks.snapshot(),
                self.regions.as_ref(),
                &self.locks,
            )
            .await?;

        // A save may have refreshed the cache after this run wrote a region.
        let mut view = self.view.write().await;
        for record in &report.updated {
            let newer_cached = view
                .get(&record.region)
                .is_some_and(|cached| cached.updated_at > record.updated_at);
            if !newer_cached {
                view.insert(record.region.clone(), record.clone());
            }
        }
        Ok(report)
    }

    /// Ranked summary over every stored region.
    pub async fn recap(&self, filter: RecapFilter) -> Result<Recap, AssessmentServiceError> {
        let records = self.regions.list().await?;
        let recap = Recap::build(records, |granularity| self.threshold(granularity), filter);
        info!(
            filter = filter.label(),
            rows = recap.rows.len(),
            regions = recap.statistics.regions,
            "recap built"
        );
        Ok(recap)
    }

    async fn recompute_if(
        &self,
        recompute: bool,
    ) -> Result<Option<RecomputeReport>, AssessmentServiceError> {
        if recompute {
            self.recompute().await.map(Some)
        } else {
            Ok(None)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Benchmark(#[from] BenchmarkError),
    #[error(transparent)]
    Recompute(#[from] RecomputeError),
}

impl AssessmentServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Persistence(PersistenceError::NotFound))
    }
}
