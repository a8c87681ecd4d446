use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::curve::{ScoreCurve, MAX_SCORE};

/// Stable identifier of an indicator, e.g. `"4.3"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorCode(pub String);

impl IndicatorCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndicatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for IndicatorCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IndicatorCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Whether the curve sees `raw / benchmark` or the raw measurement itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    Ratio,
    Direct,
}

impl EvaluationMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ratio => "ratio",
            Self::Direct => "direct",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub code: IndicatorCode,
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub weight: f64,
    pub mode: EvaluationMode,
    pub default_benchmark: f64,
    pub curve: ScoreCurve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorGroup {
    pub number: u8,
    pub name: String,
    pub indicators: Vec<Indicator>,
}

impl IndicatorGroup {
    pub fn total_weight(&self) -> f64 {
        self.indicators.iter().map(|indicator| indicator.weight).sum()
    }
}

/// Unvalidated catalog payload, as written in code or read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    pub version: String,
    pub groups: Vec<IndicatorGroup>,
}

/// Validated, immutable indicator catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "CatalogDefinition", into = "CatalogDefinition")]
pub struct IndicatorCatalog {
    version: String,
    groups: Vec<IndicatorGroup>,
    index: HashMap<IndicatorCode, (usize, usize)>,
}

impl IndicatorCatalog {
    pub fn new(definition: CatalogDefinition) -> Result<Self, ConfigurationError> {
        let CatalogDefinition { version, groups } = definition;

        if groups.is_empty() {
            return Err(ConfigurationError::EmptyCatalog(version));
        }

        let mut index = HashMap::new();
        for (group_position, group) in groups.iter().enumerate() {
            if group.indicators.is_empty() {
                return Err(ConfigurationError::EmptyGroup(group.number));
            }

            for (position, indicator) in group.indicators.iter().enumerate() {
                validate_indicator(indicator)?;
                if index
                    .insert(indicator.code.clone(), (group_position, position))
                    .is_some()
                {
                    return Err(ConfigurationError::DuplicateCode(indicator.code.clone()));
                }
            }
        }

        Ok(Self {
            version,
            groups,
            index,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn groups(&self) -> &[IndicatorGroup] {
        &self.groups
    }

    pub fn find(&self, code: &str) -> Option<&Indicator> {
        self.index
            .get(code)
            .map(|&(group, position)| &self.groups[group].indicators[position])
    }

    /// Group that owns `code`, if the code is known.
    pub fn group_of(&self, code: &str) -> Option<&IndicatorGroup> {
        self.index.get(code).map(|&(group, _)| &self.groups[group])
    }

    /// Every indicator, in group order and then declaration order.
    pub fn indicators(&self) -> impl Iterator<Item = &Indicator> + '_ {
        self.groups.iter().flat_map(|group| group.indicators.iter())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.groups.iter().map(IndicatorGroup::total_weight).sum()
    }

    /// Highest reachable total: every indicator at the top score.
    pub fn max_total(&self) -> f64 {
        self.total_weight() * f64::from(MAX_SCORE)
    }
}

impl TryFrom<CatalogDefinition> for IndicatorCatalog {
    type Error = ConfigurationError;

    fn try_from(value: CatalogDefinition) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IndicatorCatalog> for CatalogDefinition {
    fn from(value: IndicatorCatalog) -> Self {
        CatalogDefinition {
            version: value.version,
            groups: value.groups,
        }
    }
}

fn validate_indicator(indicator: &Indicator) -> Result<(), ConfigurationError> {
    if !indicator.weight.is_finite() || indicator.weight <= 0.0 {
        return Err(ConfigurationError::InvalidWeight {
            code: indicator.code.clone(),
            weight: indicator.weight,
        });
    }

    if !indicator.default_benchmark.is_finite() {
        return Err(ConfigurationError::NonFiniteBenchmark {
            code: indicator.code.clone(),
            value: indicator.default_benchmark,
        });
    }

    if indicator.mode == EvaluationMode::Ratio && indicator.default_benchmark == 0.0 {
        return Err(ConfigurationError::ZeroBenchmark(indicator.code.clone()));
    }

    indicator
        .curve
        .validate()
        .map_err(|reason| ConfigurationError::InvalidCurve {
            code: indicator.code.clone(),
            reason,
        })
}

/// Catalog or benchmark inconsistency. Never defaulted, never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("catalog {0} defines no indicator groups")]
    EmptyCatalog(String),
    #[error("indicator group {0} has no indicators")]
    EmptyGroup(u8),
    #[error("indicator code {0} is defined more than once")]
    DuplicateCode(IndicatorCode),
    #[error("indicator {code} has invalid weight {weight}; weights must be positive")]
    InvalidWeight { code: IndicatorCode, weight: f64 },
    #[error("indicator {code} has an invalid scoring curve: {reason}")]
    InvalidCurve { code: IndicatorCode, reason: String },
    #[error("no benchmark resolvable for indicator {0}")]
    MissingBenchmark(IndicatorCode),
    #[error("ratio indicator {0} requires a non-zero benchmark")]
    ZeroBenchmark(IndicatorCode),
    #[error("benchmark for indicator {code} must be finite, got {value}")]
    NonFiniteBenchmark { code: IndicatorCode, value: f64 },
    #[error("indicator {0} is not part of the catalog")]
    UnknownIndicator(IndicatorCode),
}
