use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use kapasda::config::AppConfig;
use kapasda::error::AppError;
use kapasda::scoring::{AssessmentService, BenchmarkStore, EngineRegistry};
use kapasda::storage::memory::{MemoryBenchmarkRepository, MemoryRegionRepository};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MemoryAssessmentService =
    AssessmentService<MemoryRegionRepository, MemoryBenchmarkRepository>;

/// Standard catalog over process-local storage.
pub(crate) async fn memory_service(
    config: &AppConfig,
) -> Result<Arc<MemoryAssessmentService>, AppError> {
    let engines = EngineRegistry::standard(config.scoring.policy())?;
    let store = BenchmarkStore::load(
        engines.benchmark_table(),
        Arc::new(MemoryBenchmarkRepository::default()),
    )
    .await?;

    let service = AssessmentService::new(
        Arc::new(engines),
        Arc::new(store),
        Arc::new(MemoryRegionRepository::default()),
        config.recompute.settings(),
    );
    service.warm().await?;
    Ok(Arc::new(service))
}
