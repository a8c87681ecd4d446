use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BenchmarkRepository, PersistenceError, RegionRepository};
use crate::scoring::{IndicatorCode, RegionId, RegionInputs, RegionRecord, StoredInputs};

/// In-memory benchmark overrides.
#[derive(Debug, Default)]
pub struct MemoryBenchmarkRepository {
    values: RwLock<BTreeMap<IndicatorCode, f64>>,
    unavailable: AtomicBool,
}

impl MemoryBenchmarkRepository {
    pub fn with_values(values: BTreeMap<IndicatorCode, f64>) -> Self {
        Self {
            values: RwLock::new(values),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), PersistenceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(PersistenceError::Unavailable(
                "benchmark store offline".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BenchmarkRepository for MemoryBenchmarkRepository {
    async fn load_all(&self) -> Result<BTreeMap<IndicatorCode, f64>, PersistenceError> {
        self.check_available()?;
        Ok(self.values.read().await.clone())
    }

    async fn save_many(
        &self,
        values: &BTreeMap<IndicatorCode, f64>,
    ) -> Result<(), PersistenceError> {
        self.check_available()?;
        self.values
            .write()
            .await
            .extend(values.iter().map(|(code, value)| (code.clone(), *value)));
        Ok(())
    }
}

/// In-memory region records with per-region failure injection.
#[derive(Debug, Default)]
pub struct MemoryRegionRepository {
    records: RwLock<BTreeMap<RegionId, RegionRecord>>,
    failing: Mutex<BTreeSet<RegionId>>,
    unavailable: AtomicBool,
    saves: Mutex<Vec<RegionId>>,
}

impl MemoryRegionRepository {
    /// Stores a record directly, bypassing failure injection.
    pub async fn seed(&self, record: RegionRecord) {
        self.records
            .write()
            .await
            .insert(record.region.clone(), record);
    }

    /// Every later `save_result` for `region` fails.
    pub fn fail_saves_for(&self, region: RegionId) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(region);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Regions passed to `save_result`, in call order, including failed ones.
    pub fn save_log(&self) -> Vec<RegionId> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check_available(&self) -> Result<(), PersistenceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(PersistenceError::Unavailable(
                "region store offline".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RegionRepository for MemoryRegionRepository {
    async fn load_inputs(&self, region: &RegionId) -> Result<Option<RegionInputs>, PersistenceError> {
        self.check_available()?;
        Ok(self
            .records
            .read()
            .await
            .get(region)
            .map(|record| record.inputs.clone()))
    }

    async fn load(&self, region: &RegionId) -> Result<Option<RegionRecord>, PersistenceError> {
        self.check_available()?;
        Ok(self.records.read().await.get(region).cloned())
    }

    async fn save_result(&self, record: &RegionRecord) -> Result<(), PersistenceError> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.region.clone());
        self.check_available()?;

        let failing = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&record.region);
        if failing {
            return Err(PersistenceError::Unavailable(format!(
                "write rejected for {}",
                record.region
            )));
        }

        self.records
            .write()
            .await
            .insert(record.region.clone(), record.clone());
        Ok(())
    }

    async fn load_all_with_inputs(&self) -> Result<Vec<StoredInputs>, PersistenceError> {
        self.check_available()?;
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.inputs.has_values())
            .map(RegionRecord::stored_inputs)
            .collect())
    }

    async fn list(&self) -> Result<Vec<RegionRecord>, PersistenceError> {
        self.check_available()?;
        Ok(self.records.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(name: &str, inputs: RegionInputs) -> RegionRecord {
        RegionRecord::pending(RegionId::kecamatan(name), inputs, Utc::now())
    }

    #[tokio::test]
    async fn load_all_with_inputs_skips_empty_records() {
        let repository = MemoryRegionRepository::default();
        repository
            .seed(record("Garut Kota", RegionInputs::new().with("1.1", 50.0)))
            .await;
        repository.seed(record("Cisurupan", RegionInputs::new())).await;

        let stored = repository
            .load_all_with_inputs()
            .await
            .expect("repository available");

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].region, RegionId::kecamatan("Garut Kota"));
    }

    #[tokio::test]
    async fn failing_regions_reject_saves_but_log_them() {
        let repository = MemoryRegionRepository::default();
        let target = RegionId::kecamatan("Leles");
        repository.fail_saves_for(target.clone());

        let result = repository
            .save_result(&record("Leles", RegionInputs::new()))
            .await;

        assert!(matches!(result, Err(PersistenceError::Unavailable(_))));
        assert_eq!(repository.save_log(), vec![target.clone()]);
        assert!(repository.load(&target).await.expect("readable").is_none());
    }

    #[tokio::test]
    async fn benchmark_repository_can_go_offline() {
        let repository = MemoryBenchmarkRepository::default();
        repository.set_unavailable(true);
        assert!(repository.load_all().await.is_err());
        repository.set_unavailable(false);
        assert!(repository.load_all().await.expect("back online").is_empty());
    }
}
