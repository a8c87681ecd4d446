mod policy;
mod rules;

pub use policy::{Eligibility, EligibilityPolicy, ELIGIBILITY_THRESHOLD};
pub use rules::{score, Scored, UnusableBenchmark};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::benchmark::BenchmarkTable;
use super::catalog::{ConfigurationError, EvaluationMode, IndicatorCatalog, IndicatorCode};
use super::inputs::{RegionInputs, ValidationError};
use super::region::Granularity;
use super::standard::standard_catalog;

/// Stateless evaluator binding one catalog to an eligibility policy.
#[derive(Debug, Clone)]
pub struct AssessmentEngine {
    catalog: Arc<IndicatorCatalog>,
    policy: EligibilityPolicy,
}

impl AssessmentEngine {
    pub fn new(catalog: Arc<IndicatorCatalog>, policy: EligibilityPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &IndicatorCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> EligibilityPolicy {
        self.policy
    }

    /// Scores every catalog indicator and classifies the rounded total.
    ///
    /// Unreadable values are reported in `rejected` and score 0; a benchmark
    /// that cannot be resolved aborts the whole evaluation.
    pub fn evaluate(
        &self,
        inputs: &RegionInputs,
        benchmarks: &BenchmarkTable,
    ) -> Result<AssessmentResult, ConfigurationError> {
        let scored = rules::score_catalog(&self.catalog, inputs, benchmarks)?;

        let total = scored.raw_total.round() as i64;
        let unknown_codes = inputs
            .codes()
            .filter(|code| self.catalog.find(code.as_str()).is_none())
            .cloned()
            .collect();

        Ok(AssessmentResult {
            catalog_version: self.catalog.version().to_string(),
            total,
            raw_total: scored.raw_total,
            threshold: self.policy.threshold,
            classification: self.policy.classify(total),
            breakdown: scored.breakdown,
            rejected: scored.rejected,
            warnings: scored.warnings,
            unknown_codes,
        })
    }

    /// Fails when any catalog indicator has no usable benchmark in `benchmarks`.
    pub fn check_benchmarks(&self, benchmarks: &BenchmarkTable) -> Result<(), ConfigurationError> {
        rules::check_benchmarks(&self.catalog, benchmarks)
    }
}

/// Engines per region granularity. Desa may carry its own catalog revision.
#[derive(Debug, Clone)]
pub struct EngineRegistry {
    kecamatan: AssessmentEngine,
    desa: AssessmentEngine,
}

impl EngineRegistry {
    pub fn new(kecamatan: AssessmentEngine, desa: AssessmentEngine) -> Self {
        Self { kecamatan, desa }
    }

    /// Same engine for every granularity.
    pub fn uniform(engine: AssessmentEngine) -> Self {
        Self {
            kecamatan: engine.clone(),
            desa: engine,
        }
    }

    pub fn standard(policy: EligibilityPolicy) -> Result<Self, ConfigurationError> {
        Ok(Self::uniform(AssessmentEngine::new(
            standard_catalog()?,
            policy,
        )))
    }

    pub fn for_granularity(&self, granularity: Granularity) -> &AssessmentEngine {
        match granularity {
            Granularity::Kecamatan => &self.kecamatan,
            Granularity::Desa => &self.desa,
        }
    }

    pub fn catalogs(&self) -> impl Iterator<Item = &IndicatorCatalog> + '_ {
        Granularity::ordered()
            .into_iter()
            .map(move |granularity| self.for_granularity(granularity).catalog())
    }

    pub fn check_benchmarks(&self, benchmarks: &BenchmarkTable) -> Result<(), ConfigurationError> {
        Granularity::ordered()
            .into_iter()
            .try_for_each(|granularity| {
                self.for_granularity(granularity)
                    .check_benchmarks(benchmarks)
            })
    }

    /// Default benchmarks covering every catalog in the registry.
    pub fn benchmark_table(&self) -> BenchmarkTable {
        BenchmarkTable::from_catalogs(self.catalogs())
    }
}

/// Audit row for one indicator of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorBreakdown {
    pub code: IndicatorCode,
    pub group: u8,
    pub mode: EvaluationMode,
    pub input: Option<f64>,
    pub benchmark: f64,
    pub evaluated: Option<f64>,
    pub score: u8,
    pub weight: f64,
    pub contribution: f64,
}

/// Values further than this factor from their benchmark are flagged.
pub const OUTLIER_FACTOR: f64 = 10.0;

/// A readable value far above or below its benchmark. Scoring is unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputWarning {
    pub code: IndicatorCode,
    pub value: f64,
    pub benchmark: f64,
    pub ratio: f64,
}

/// Spread of the non-zero indicator scores of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreStatistics {
    pub indicators: usize,
    pub scored: usize,
    pub average: Option<f64>,
    pub min: Option<u8>,
    pub max: Option<u8>,
    pub median: Option<f64>,
}

/// Evaluation output: rounded total, classification and per-indicator trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub catalog_version: String,
    pub total: i64,
    pub raw_total: f64,
    pub threshold: i64,
    pub classification: Eligibility,
    pub breakdown: Vec<IndicatorBreakdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<InputWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_codes: Vec<IndicatorCode>,
}

impl AssessmentResult {
    pub fn breakdown_for(&self, code: &str) -> Option<&IndicatorBreakdown> {
        self.breakdown.iter().find(|row| row.code.as_str() == code)
    }

    /// Share of the maximum reachable total, in percent.
    pub fn percentage_of(&self, max_total: f64) -> f64 {
        if max_total > 0.0 {
            self.raw_total / max_total * 100.0
        } else {
            0.0
        }
    }

    pub fn score_statistics(&self) -> ScoreStatistics {
        let mut scores: Vec<u8> = self
            .breakdown
            .iter()
            .map(|row| row.score)
            .filter(|score| *score > 0)
            .collect();
        scores.sort_unstable();

        let scored = scores.len();
        let median = match scored {
            0 => None,
            n if n % 2 == 0 => Some((f64::from(scores[n / 2 - 1]) + f64::from(scores[n / 2])) / 2.0),
            n => Some(f64::from(scores[n / 2])),
        };
        ScoreStatistics {
            indicators: self.breakdown.len(),
            scored,
            average: (scored > 0).then(|| {
                scores.iter().map(|score| f64::from(*score)).sum::<f64>() / scored as f64
            }),
            min: scores.first().copied(),
            max: scores.last().copied(),
            median,
        }
    }

    pub fn group_subtotals(&self) -> Vec<(u8, f64)> {
        let mut subtotals: Vec<(u8, f64)> = Vec::new();
        for row in &self.breakdown {
            match subtotals.last_mut() {
                Some((group, subtotal)) if *group == row.group => *subtotal += row.contribution,
                _ => subtotals.push((row.group, row.contribution)),
            }
        }
        subtotals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::catalog::{CatalogDefinition, Indicator, IndicatorGroup};
    use crate::scoring::curve::{ScoreCurve, Step};

    fn higher_is_better() -> ScoreCurve {
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

    fn single(mode: EvaluationMode, weight: f64, benchmark: f64, curve: ScoreCurve) -> AssessmentEngine {
        let catalog = IndicatorCatalog::new(CatalogDefinition {
            version: "test".to_string(),
            groups: vec![IndicatorGroup {
                number: 1,
                name: "Group".to_string(),
                indicators: vec![Indicator {
                    code: IndicatorCode::from("1.1"),
                    name: "Only".to_string(),
                    unit: String::new(),
                    weight,
                    mode,
                    default_benchmark: benchmark,
                    curve,
                }],
            }],
        })
        .expect("valid catalog");
        AssessmentEngine::new(Arc::new(catalog), EligibilityPolicy::default())
    }

    #[test]
    fn absent_value_scores_zero_in_every_mode() {
        for mode in [EvaluationMode::Ratio, EvaluationMode::Direct] {
            for benchmark in [0.5, 100.0, -3.0] {
                let scored = score(None, benchmark, mode, &ScoreCurve::constant(5))
                    .expect("absent values never fail");
                assert_eq!(scored.score, 0);
                assert_eq!(scored.evaluated, None);
            }
        }
    }

    #[test]
    fn ratio_scores_are_scale_invariant() {
        let curve = higher_is_better();
        for (raw, benchmark) in [(85.0, 100.0), (8.5, 10.0), (170.0, 200.0)] {
            let scored = score(Some(raw), benchmark, EvaluationMode::Ratio, &curve)
                .expect("non-zero benchmark");
            assert_eq!(scored.score, 3, "{raw}/{benchmark}");
        }
    }

    #[test]
    fn ratio_mode_rejects_zero_benchmark() {
        let result = score(Some(1.0), 0.0, EvaluationMode::Ratio, &higher_is_better());
        assert_eq!(result, Err(UnusableBenchmark));
    }

    #[test]
    fn direct_mode_ignores_benchmark() {
        let curve = ScoreCurve::steps(vec![Step::at_most(60.0, 5)], 1);
        let near = score(Some(50.0), 1.0, EvaluationMode::Direct, &curve).expect("scores");
        let far = score(Some(50.0), 1_000.0, EvaluationMode::Direct, &curve).expect("scores");
        assert_eq!(near, far);
        assert_eq!(near.evaluated, Some(50.0));
    }

    #[test]
    fn evaluate_reports_rejected_and_unknown_inputs() {
        let engine = single(EvaluationMode::Direct, 2.0, 60.0, ScoreCurve::constant(5));
        let benchmarks = BenchmarkTable::from_catalog(engine.catalog());
        let inputs = RegionInputs::new().with("1.1", "enam puluh").with("8.8", 3.0);

        let result = engine.evaluate(&inputs, &benchmarks).expect("evaluates");

        assert_eq!(result.total, 0);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].code.as_str(), "1.1");
        assert_eq!(result.unknown_codes, vec![IndicatorCode::from("8.8")]);
        let row = result.breakdown_for("1.1").expect("row present");
        assert_eq!(row.score, 0);
        assert_eq!(row.input, None);
    }

    #[test]
    fn evaluate_fails_when_benchmark_cannot_be_resolved() {
        let engine = single(EvaluationMode::Ratio, 3.0, 100.0, higher_is_better());
        let result = engine.evaluate(&RegionInputs::new(), &BenchmarkTable::default());
        assert_eq!(
            result.expect_err("empty table"),
            ConfigurationError::MissingBenchmark(IndicatorCode::from("1.1"))
        );
    }

    #[test]
    fn total_is_rounded_once_from_the_raw_sum() {
        let engine = single(EvaluationMode::Direct, 0.5, 1.0, ScoreCurve::constant(5));
        let benchmarks = BenchmarkTable::from_catalog(engine.catalog());
        let result = engine
            .evaluate(&RegionInputs::new().with("1.1", 1.0), &benchmarks)
            .expect("evaluates");
        assert_eq!(result.raw_total, 2.5);
        assert_eq!(result.total, 3);
        let sum: f64 = result.breakdown.iter().map(|row| row.contribution).sum();
        assert_eq!(result.total, sum.round() as i64);
    }

    #[test]
    fn values_far_from_the_benchmark_are_flagged_but_still_scored() {
        let engine = single(EvaluationMode::Ratio, 3.0, 100.0, higher_is_better());
        let benchmarks = BenchmarkTable::from_catalog(engine.catalog());

        let far = engine
            .evaluate(&RegionInputs::new().with("1.1", 1_500.0), &benchmarks)
            .expect("evaluates");
        assert_eq!(far.total, 15);
        assert_eq!(
            far.warnings,
            vec![InputWarning {
                code: IndicatorCode::from("1.1"),
                value: 1_500.0,
                benchmark: 100.0,
                ratio: 15.0,
            }]
        );

        let edge = engine
            .evaluate(&RegionInputs::new().with("1.1", 1_000.0), &benchmarks)
            .expect("evaluates");
        assert!(edge.warnings.is_empty());
        let negative = engine
            .evaluate(&RegionInputs::new().with("1.1", -2_000.0), &benchmarks)
            .expect("evaluates");
        assert_eq!(negative.warnings.len(), 1);
    }

    #[test]
    fn score_statistics_ignore_zero_scores() {
        let registry = EngineRegistry::standard(EligibilityPolicy::default()).expect("registry");
        let engine = registry.for_granularity(Granularity::Kecamatan);
        // 1.5 and 7.3 are fixed at 5; 1.1 at 100 km scores 3.
        let result = engine
            .evaluate(
                &RegionInputs::new()
                    .with("1.5", 1.0)
                    .with("7.3", 1.0)
                    .with("1.1", 100.0),
                &registry.benchmark_table(),
            )
            .expect("evaluates");

        let statistics = result.score_statistics();
        assert_eq!(statistics.indicators, 38);
        assert_eq!(statistics.scored, 3);
        assert_eq!(statistics.min, Some(3));
        assert_eq!(statistics.max, Some(5));
        assert_eq!(statistics.median, Some(5.0));
        assert_eq!(statistics.average, Some(13.0 / 3.0));

        let empty = engine
            .evaluate(&RegionInputs::new(), &registry.benchmark_table())
            .expect("evaluates");
        let statistics = empty.score_statistics();
        assert_eq!(statistics.scored, 0);
        assert_eq!(statistics.average, None);
        assert_eq!(statistics.median, None);
    }

    #[test]
    fn registry_check_reports_the_first_missing_benchmark() {
        let registry = EngineRegistry::standard(EligibilityPolicy::default()).expect("registry");
        assert_eq!(registry.check_benchmarks(&registry.benchmark_table()), Ok(()));
        assert!(matches!(
            registry.check_benchmarks(&BenchmarkTable::default()),
            Err(ConfigurationError::MissingBenchmark(_))
        ));
    }

    #[test]
    fn group_subtotals_follow_catalog_order() {
        let registry = EngineRegistry::standard(EligibilityPolicy::default()).expect("registry");
        let engine = registry.for_granularity(Granularity::Kecamatan);
        let result = engine
            .evaluate(
                &RegionInputs::new().with("1.5", 1.0).with("7.3", 1.0),
                &registry.benchmark_table(),
            )
            .expect("evaluates");

        let subtotals = result.group_subtotals();
        assert_eq!(subtotals.len(), 7);
        assert_eq!(subtotals[0], (1, 5.0));
        assert_eq!(subtotals[6], (7, 10.0));
        assert_eq!(result.total, 15);
    }
}
