//! Indicator scoring for regional readiness assessments.
//!
//! A versioned [`IndicatorCatalog`] describes what is measured. The
//! [`AssessmentEngine`] turns raw [`RegionInputs`] into a rounded total and an
//! eligibility classification, reading reference values from a
//! [`BenchmarkTable`]. Changing a benchmark goes through [`BenchmarkStore`] and
//! can trigger a bulk [`RecomputeCoordinator`] run over stored regions.

pub mod benchmark;
pub mod catalog;
pub mod curve;
pub mod evaluation;
pub mod inputs;
pub mod locks;
pub mod recap;
pub mod recompute;
pub mod region;
pub mod service;
pub mod standard;

#[cfg(test)]
mod tests;

pub use benchmark::{BenchmarkEntry, BenchmarkError, BenchmarkStore, BenchmarkTable};
pub use catalog::{
    CatalogDefinition, ConfigurationError, EvaluationMode, Indicator, IndicatorCatalog,
    IndicatorCode, IndicatorGroup,
};
pub use curve::{ScoreCurve, Step, Threshold, MAX_SCORE};
pub use evaluation::{
    score, AssessmentEngine, AssessmentResult, Eligibility, EligibilityPolicy, EngineRegistry,
    IndicatorBreakdown, InputWarning, ScoreStatistics, Scored, UnusableBenchmark,
    ELIGIBILITY_THRESHOLD, OUTLIER_FACTOR,
};
pub use inputs::{RawValue, RegionInputs, ValidationError, ValidationReason};
pub use locks::RegionLocks;
pub use recap::{Recap, RecapFilter, RecapRow, RecapStatistics, UnknownRecapFilter};
pub use recompute::{
    RecomputeCoordinator, RecomputeError, RecomputeFailure, RecomputeReport, RecomputeSettings,
};
pub use region::{Granularity, RegionId, RegionRecord, StoredInputs, UnknownGranularity};
pub use service::{AssessmentService, AssessmentServiceError};
pub use standard::{standard_catalog, standard_definition, STANDARD_CATALOG_VERSION};
