use super::super::benchmark::BenchmarkTable;
use super::super::catalog::{ConfigurationError, EvaluationMode, Indicator, IndicatorCatalog};
use super::super::curve::ScoreCurve;
use super::super::inputs::{RegionInputs, ValidationError};
use super::{IndicatorBreakdown, InputWarning, OUTLIER_FACTOR};

/// Output of the scoring function for one indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    /// The value the curve saw: the ratio in ratio mode, the raw value otherwise.
    pub evaluated: Option<f64>,
    pub score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("ratio scoring needs a finite, non-zero benchmark")]
pub struct UnusableBenchmark;

/// Scores one raw value. A missing value scores 0 before the mode is consulted.
pub fn score(
    raw: Option<f64>,
    benchmark: f64,
    mode: EvaluationMode,
    curve: &ScoreCurve,
) -> Result<Scored, UnusableBenchmark> {
    let Some(raw) = raw else {
        return Ok(Scored {
            evaluated: None,
            score: 0,
        });
    };

    let evaluated = match mode {
        EvaluationMode::Direct => raw,
        EvaluationMode::Ratio => {
            if benchmark == 0.0 || !benchmark.is_finite() {
                return Err(UnusableBenchmark);
            }
            raw / benchmark
        }
    };

    Ok(Scored {
        evaluated: Some(evaluated),
        score: curve.evaluate(evaluated),
    })
}

pub(crate) struct CatalogScore {
    pub breakdown: Vec<IndicatorBreakdown>,
    pub raw_total: f64,
    pub rejected: Vec<ValidationError>,
    pub warnings: Vec<InputWarning>,
}

pub(crate) fn score_catalog(
    catalog: &IndicatorCatalog,
    inputs: &RegionInputs,
    benchmarks: &BenchmarkTable,
) -> Result<CatalogScore, ConfigurationError> {
    let mut breakdown = Vec::with_capacity(catalog.len());
    let mut rejected = Vec::new();
    let mut warnings = Vec::new();
    let mut raw_total = 0.0;

    for group in catalog.groups() {
        for indicator in &group.indicators {
            let benchmark = resolve_benchmark(indicator, benchmarks)?;

            let input = match inputs.get(indicator.code.as_str()) {
                None => None,
                Some(raw) => match raw.parse() {
                    Ok(value) => value,
                    Err(reason) => {
                        rejected.push(ValidationError {
                            code: indicator.code.clone(),
                            raw: raw.to_string(),
                            reason,
                        });
                        None
                    }
                },
            };

            if let Some(warning) = outlier(indicator, input, benchmark) {
                warnings.push(warning);
            }

            let scored = score(input, benchmark, indicator.mode, &indicator.curve)
                .map_err(|_| ConfigurationError::ZeroBenchmark(indicator.code.clone()))?;
            let contribution = f64::from(scored.score) * indicator.weight;
            raw_total += contribution;

            breakdown.push(IndicatorBreakdown {
                code: indicator.code.clone(),
                group: group.number,
                mode: indicator.mode,
                input,
                benchmark,
                evaluated: scored.evaluated,
                score: scored.score,
                weight: indicator.weight,
                contribution,
            });
        }
    }

    Ok(CatalogScore {
        breakdown,
        raw_total,
        rejected,
        warnings,
    })
}

fn outlier(indicator: &Indicator, input: Option<f64>, benchmark: f64) -> Option<InputWarning> {
    let value = input?;
    if benchmark == 0.0 {
        return None;
    }
    let ratio = value / benchmark;
    (ratio.abs() > OUTLIER_FACTOR).then(|| InputWarning {
        code: indicator.code.clone(),
        value,
        benchmark,
        ratio,
    })
}

pub(crate) fn check_benchmarks(
    catalog: &IndicatorCatalog,
    benchmarks: &BenchmarkTable,
) -> Result<(), ConfigurationError> {
    catalog
        .groups()
        .iter()
        .flat_map(|group| &group.indicators)
        .try_for_each(|indicator| resolve_benchmark(indicator, benchmarks).map(|_| ()))
}

fn resolve_benchmark(
    indicator: &Indicator,
    benchmarks: &BenchmarkTable,
) -> Result<f64, ConfigurationError> {
    let benchmark = benchmarks.get(indicator.code.as_str())?;
    if !benchmark.is_finite() {
        return Err(ConfigurationError::NonFiniteBenchmark {
            code: indicator.code.clone(),
            value: benchmark,
        });
    }
    if indicator.mode == EvaluationMode::Ratio && benchmark == 0.0 {
        return Err(ConfigurationError::ZeroBenchmark(indicator.code.clone()));
    }
    Ok(benchmark)
}
