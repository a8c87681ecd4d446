use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use crate::scoring::catalog::{
    CatalogDefinition, EvaluationMode, Indicator, IndicatorCatalog, IndicatorCode, IndicatorGroup,
};
use crate::scoring::curve::{ScoreCurve, Step};
use crate::scoring::{
    AssessmentEngine, AssessmentService, BenchmarkStore, BenchmarkTable, EligibilityPolicy,
    EngineRegistry, RecomputeSettings, RegionId, RegionInputs, RegionRecord,
};
use crate::storage::memory::{MemoryBenchmarkRepository, MemoryRegionRepository};

pub(super) type MemoryService = AssessmentService<MemoryRegionRepository, MemoryBenchmarkRepository>;

pub(super) fn distance_curve() -> ScoreCurve {
    ScoreCurve::steps(
        vec![
            Step::at_most(60.0, 5),
            Step::at_most(80.0, 4),
            Step::at_most(100.0, 3),
            Step::at_most(120.0, 2),
        ],
        1,
    )
}

pub(super) fn attainment_curve() -> ScoreCurve {
    ScoreCurve::steps(
        vec![
            Step::at_least(1.0, 5),
            Step::at_least(0.9, 4),
            Step::at_least(0.8, 3),
            Step::at_least(0.7, 2),
        ],
        1,
    )
}

fn indicator(code: &str, weight: f64, mode: EvaluationMode, benchmark: f64, curve: ScoreCurve) -> Indicator {
    Indicator {
        code: IndicatorCode::from(code),
        name: format!("Indicator {code}"),
        unit: String::new(),
        weight,
        mode,
        default_benchmark: benchmark,
        curve,
    }
}

/// `D.1`: direct, weight 2, distance curve. `R.1`: ratio, weight 3, benchmark 100.
pub(super) fn scenario_catalog() -> Arc<IndicatorCatalog> {
    let catalog = IndicatorCatalog::new(CatalogDefinition {
        version: "scenario".to_string(),
        groups: vec![
            IndicatorGroup {
                number: 1,
                name: "Direct".to_string(),
                indicators: vec![indicator("D.1", 2.0, EvaluationMode::Direct, 60.0, distance_curve())],
            },
            IndicatorGroup {
                number: 2,
                name: "Ratio".to_string(),
                indicators: vec![indicator("R.1", 3.0, EvaluationMode::Ratio, 100.0, attainment_curve())],
            },
        ],
    })
    .expect("scenario catalog is valid");
    Arc::new(catalog)
}

pub(super) fn scenario_registry(threshold: i64) -> EngineRegistry {
    EngineRegistry::uniform(AssessmentEngine::new(
        scenario_catalog(),
        EligibilityPolicy::new(threshold),
    ))
}

pub(super) fn scenario_benchmarks() -> BenchmarkTable {
    BenchmarkTable::from_catalog(&scenario_catalog())
}

pub(super) fn overrides(pairs: &[(&str, f64)]) -> BTreeMap<IndicatorCode, f64> {
    pairs
        .iter()
        .map(|(code, value)| (IndicatorCode::from(*code), *value))
        .collect()
}

pub(super) fn pending(region: RegionId, inputs: RegionInputs) -> RegionRecord {
    RegionRecord::pending(region, inputs, Utc::now())
}

pub(super) struct Harness {
    pub service: MemoryService,
    pub regions: Arc<MemoryRegionRepository>,
    pub benchmarks: Arc<MemoryBenchmarkRepository>,
}

pub(super) fn harness(registry: EngineRegistry, batch_size: usize) -> Harness {
    let regions = Arc::new(MemoryRegionRepository::default());
    let benchmarks = Arc::new(MemoryBenchmarkRepository::default());
    let store = BenchmarkStore::new(registry.benchmark_table(), benchmarks.clone());
    let service = AssessmentService::new(
        Arc::new(registry),
        Arc::new(store),
        regions.clone(),
        RecomputeSettings {
            batch_size,
            ..RecomputeSettings::default()
        },
    );
    Harness {
        service,
        regions,
        benchmarks,
    }
}
