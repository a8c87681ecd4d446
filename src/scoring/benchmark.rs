use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::catalog::{ConfigurationError, EvaluationMode, IndicatorCatalog, IndicatorCode};
use crate::storage::{BenchmarkRepository, PersistenceError};

/// Resolved reference values: catalog defaults plus administrative overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkTable {
    defaults: BTreeMap<IndicatorCode, f64>,
    overrides: BTreeMap<IndicatorCode, f64>,
    ratio_codes: BTreeSet<IndicatorCode>,
}

impl BenchmarkTable {
    pub fn from_catalog(catalog: &IndicatorCatalog) -> Self {
        Self::from_catalogs([catalog])
    }

    /// Merges the defaults of several catalogs; the first catalog wins on shared codes.
    pub fn from_catalogs<'a>(catalogs: impl IntoIterator<Item = &'a IndicatorCatalog>) -> Self {
        let mut table = Self::default();
        for catalog in catalogs {
            for indicator in catalog.indicators() {
                table
                    .defaults
                    .entry(indicator.code.clone())
                    .or_insert(indicator.default_benchmark);
                if indicator.mode == EvaluationMode::Ratio {
                    table.ratio_codes.insert(indicator.code.clone());
                }
            }
        }
        table
    }

    /// Override if recorded, else default; unknown codes are a configuration error.
    pub fn get(&self, code: &str) -> Result<f64, ConfigurationError> {
        self.overrides
            .get(code)
            .or_else(|| self.defaults.get(code))
            .copied()
            .ok_or_else(|| ConfigurationError::MissingBenchmark(IndicatorCode::from(code)))
    }

    pub fn default_for(&self, code: &str) -> Option<f64> {
        self.defaults.get(code).copied()
    }

    pub fn is_overridden(&self, code: &str) -> bool {
        self.overrides.contains_key(code)
    }

    pub fn overrides(&self) -> &BTreeMap<IndicatorCode, f64> {
        &self.overrides
    }

    /// Full code → value map with overrides applied.
    pub fn resolved(&self) -> BTreeMap<IndicatorCode, f64> {
        let mut resolved = self.defaults.clone();
        resolved.extend(self.overrides.iter().map(|(code, value)| (code.clone(), *value)));
        resolved
    }

    /// Builder used by tests and bootstrap code; validates like `set_many`.
    pub fn with_override(mut self, code: &str, value: f64) -> Result<Self, ConfigurationError> {
        let code = IndicatorCode::from(code);
        self.check(&code, value)?;
        self.overrides.insert(code, value);
        Ok(self)
    }

    pub(crate) fn validate(
        &self,
        values: &BTreeMap<IndicatorCode, f64>,
    ) -> Result<(), ConfigurationError> {
        values
            .iter()
            .try_for_each(|(code, value)| self.check(code, *value))
    }

    pub(crate) fn apply(&mut self, values: &BTreeMap<IndicatorCode, f64>) {
        self.overrides
            .extend(values.iter().map(|(code, value)| (code.clone(), *value)));
    }

    pub(crate) fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    fn check(&self, code: &IndicatorCode, value: f64) -> Result<(), ConfigurationError> {
        if !self.defaults.contains_key(code) {
            return Err(ConfigurationError::UnknownIndicator(code.clone()));
        }
        if !value.is_finite() {
            return Err(ConfigurationError::NonFiniteBenchmark {
                code: code.clone(),
                value,
            });
        }
        if value == 0.0 && self.ratio_codes.contains(code) {
            return Err(ConfigurationError::ZeroBenchmark(code.clone()));
        }
        Ok(())
    }
}

/// Exported view of one benchmark, also accepted back by [`BenchmarkStore::import`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub code: IndicatorCode,
    #[serde(default)]
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub default: Option<f64>,
    #[serde(default)]
    pub overridden: bool,
}

/// Process-wide benchmark state backed by an injected repository.
///
/// Writes persist first and only then touch memory, so a read after a
/// successful `set_many` always observes the new values.
pub struct BenchmarkStore<R> {
    table: RwLock<BenchmarkTable>,
    repository: Arc<R>,
    write_gate: tokio::sync::Mutex<()>,
}

impl<R> BenchmarkStore<R>
where
    R: BenchmarkRepository + 'static,
{
    pub fn new(table: BenchmarkTable, repository: Arc<R>) -> Self {
        Self {
            table: RwLock::new(table),
            repository,
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Builds the store and hydrates overrides persisted by earlier runs.
    pub async fn load(table: BenchmarkTable, repository: Arc<R>) -> Result<Self, BenchmarkError> {
        let stored = repository.load_all().await?;
        let mut table = table;
        let mut accepted = BTreeMap::new();
        for (code, value) in stored {
            if table.default_for(code.as_str()) == Some(value) {
                continue;
            }
            match table.check(&code, value) {
                Ok(()) => {
                    accepted.insert(code, value);
                }
                Err(error) => warn!(%code, %error, "ignoring stored benchmark"),
            }
        }
        table.apply(&accepted);
        info!(overrides = accepted.len(), "benchmarks loaded");
        Ok(Self::new(table, repository))
    }

    pub fn get(&self, code: &str) -> Result<f64, ConfigurationError> {
        self.read().get(code)
    }

    pub fn snapshot(&self) -> BenchmarkTable {
        self.read().clone()
    }

    /// Validates, persists, then applies. Nothing changes in memory on failure.
    pub async fn set_many(&self, values: BTreeMap<IndicatorCode, f64>) -> Result<(), BenchmarkError> {
        let _gate = self.write_gate.lock().await;
        self.read().validate(&values)?;
        self.repository.save_many(&values).await?;
        self.write().apply(&values);
        info!(updated = values.len(), "benchmarks updated");
        Ok(())
    }

    pub async fn reset_to_defaults(&self) -> Result<(), BenchmarkError> {
        let _gate = self.write_gate.lock().await;
        let defaults = self.read().defaults.clone();
        self.repository.save_many(&defaults).await?;
        self.write().clear_overrides();
        info!(indicators = defaults.len(), "benchmarks reset to defaults");
        Ok(())
    }

    /// Current value of every indicator in `catalog`, in catalog order.
    pub fn export(&self, catalog: &IndicatorCatalog) -> Result<Vec<BenchmarkEntry>, ConfigurationError> {
        let table = self.read();
        catalog
            .indicators()
            .map(|indicator| {
                Ok(BenchmarkEntry {
                    code: indicator.code.clone(),
                    name: indicator.name.clone(),
                    value: table.get(indicator.code.as_str())?,
                    default: table.default_for(indicator.code.as_str()),
                    overridden: table.is_overridden(indicator.code.as_str()),
                })
            })
            .collect()
    }

    /// Applies exported entries through `set_many`; returns how many were applied.
    pub async fn import(&self, entries: Vec<BenchmarkEntry>) -> Result<usize, BenchmarkError> {
        let values: BTreeMap<_, _> = entries
            .into_iter()
            .map(|entry| (entry.code, entry.value))
            .collect();
        let count = values.len();
        self.set_many(values).await?;
        Ok(count)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BenchmarkTable> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BenchmarkTable> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BenchmarkError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
