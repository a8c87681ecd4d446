use std::time::Duration;

use super::common::*;
use crate::scoring::{
    BenchmarkTable, ConfigurationError, RecomputeCoordinator, RecomputeError, RecomputeSettings,
    RawValue, RegionId, RegionInputs, RegionLocks, StoredInputs,
};
use crate::storage::memory::MemoryRegionRepository;
use crate::storage::{PersistenceError, RegionRepository};

fn stored(name: &str, raw: f64) -> StoredInputs {
    StoredInputs {
        region: RegionId::kecamatan(name),
        inputs: RegionInputs::new().with("R.1", raw),
    }
}

#[tokio::test]
async fn one_failing_region_does_not_stop_the_rest() {
    let repository = MemoryRegionRepository::default();
    repository.fail_saves_for(RegionId::kecamatan("Pakenjeng"));
    let records = vec![
        stored("Cikelet", 85.0),
        stored("Pakenjeng", 90.0),
        stored("Pameungpeuk", 100.0),
        stored("Cibalong", 70.0),
    ];
    let coordinator = RecomputeCoordinator::new(RecomputeSettings {
        batch_size: 3,
        batch_delay: Duration::from_millis(1),
    });

    let report = coordinator
        .recompute_all(
            records,
            &scenario_registry(400),
            &scenario_benchmarks(),
            &repository,
            &RegionLocks::new(),
        )
        .await
        .expect("benchmarks are usable");

    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_complete());
    assert_eq!(report.failures[0].region, RegionId::kecamatan("Pakenjeng"));
    assert!(matches!(
        &report.failures[0].error,
        PersistenceError::Unavailable(message) if message.contains("Pakenjeng")
    ));
    assert_eq!(repository.save_log().len(), 4);
    let stored = repository.list().await.expect("readable");
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn recompute_applies_the_new_benchmark_to_stored_inputs() {
    let repository = MemoryRegionRepository::default();
    repository
        .seed(pending(
            RegionId::kecamatan("Cikelet"),
            RegionInputs::new().with("R.1", 85.0),
        ))
        .await;
    let coordinator = RecomputeCoordinator::default();
    let registry = scenario_registry(400);

    let before = coordinator
        .recompute_stored(&registry, &scenario_benchmarks(), &repository, &RegionLocks::new())
        .await
        .expect("load succeeds");
    assert_eq!(before.updated[0].total(), Some(9));

    let raised = scenario_benchmarks()
        .with_override("R.1", 200.0)
        .expect("valid override");
    let after = coordinator
        .recompute_stored(&registry, &raised, &repository, &RegionLocks::new())
        .await
        .expect("load succeeds");

    assert_eq!(after.updated[0].total(), Some(3));
    let record = repository
        .load(&RegionId::kecamatan("Cikelet"))
        .await
        .expect("readable")
        .expect("record stored");
    assert_eq!(record.total(), Some(3));
}

#[tokio::test]
async fn regions_without_values_are_skipped() {
    let repository = MemoryRegionRepository::default();
    let mut cleared = RegionInputs::new();
    cleared.clear("R.1");
    let records = vec![
        StoredInputs {
            region: RegionId::desa("Sukamulya"),
            inputs: cleared,
        },
        stored("Cisewu", 95.0),
    ];

    let report = RecomputeCoordinator::default()
        .recompute_all(
            records,
            &scenario_registry(400),
            &scenario_benchmarks(),
            &repository,
            &RegionLocks::new(),
        )
        .await
        .expect("benchmarks are usable");

    assert_eq!(report.skipped, 1);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(repository.save_log(), vec![RegionId::kecamatan("Cisewu")]);
}

#[tokio::test]
async fn load_failure_fails_the_whole_run() {
    let repository = MemoryRegionRepository::default();
    repository.set_unavailable(true);

    let result = RecomputeCoordinator::default()
        .recompute_stored(
            &scenario_registry(400),
            &scenario_benchmarks(),
            &repository,
            &RegionLocks::new(),
        )
        .await;

    assert!(matches!(result, Err(RecomputeError::Load(_))));
    assert!(repository.save_log().is_empty());
}

#[tokio::test]
async fn unusable_benchmarks_abort_before_any_region_is_written() {
    let repository = MemoryRegionRepository::default();
    let records = vec![stored("Cikelet", 85.0), stored("Cisewu", 95.0)];

    let result = RecomputeCoordinator::default()
        .recompute_all(
            records,
            &scenario_registry(400),
            &BenchmarkTable::default(),
            &repository,
            &RegionLocks::new(),
        )
        .await;

    assert!(matches!(
        result,
        Err(RecomputeError::Configuration(ConfigurationError::MissingBenchmark(_)))
    ));
    assert!(repository.save_log().is_empty());
}

#[tokio::test]
async fn latest_stored_inputs_win_over_the_loaded_snapshot() {
    let repository = MemoryRegionRepository::default();
    let region = RegionId::kecamatan("Cikelet");
    repository
        .seed(pending(region.clone(), RegionInputs::new().with("R.1", 100.0)))
        .await;

    // The caller's snapshot predates the stored 100.
    let report = RecomputeCoordinator::default()
        .recompute_all(
            vec![stored("Cikelet", 70.0)],
            &scenario_registry(400),
            &scenario_benchmarks(),
            &repository,
            &RegionLocks::new(),
        )
        .await
        .expect("benchmarks are usable");

    assert_eq!(report.updated[0].total(), Some(15));
    let record = repository
        .load(&region)
        .await
        .expect("readable")
        .expect("record stored");
    assert_eq!(record.inputs.get("R.1"), Some(&RawValue::Number(100.0)));
}
