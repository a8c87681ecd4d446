use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use kapasda::config::AppConfig;
use kapasda::error::AppError;
use kapasda::scoring::{
    AssessmentResult, BenchmarkTable, EngineRegistry, Granularity, IndicatorCatalog,
    IndicatorCode, RegionInputs, ScoreStatistics,
};
use serde::Serialize;

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// Region level whose catalog is printed
    #[arg(long, default_value = "kecamatan")]
    pub(crate) granularity: Granularity,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON object mapping indicator codes to raw values
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Region level the inputs belong to
    #[arg(long, default_value = "kecamatan")]
    pub(crate) granularity: Granularity,
    /// Optional JSON object of benchmark overrides
    #[arg(long)]
    pub(crate) benchmarks: Option<PathBuf>,
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let registry = EngineRegistry::standard(config.scoring.policy())?;
    let engine = registry.for_granularity(args.granularity);
    print!("{}", render_catalog(engine.catalog(), args.granularity));
    println!("Eligibility threshold: {}", engine.policy().threshold);
    Ok(())
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let registry = EngineRegistry::standard(config.scoring.policy())?;

    let inputs: RegionInputs = serde_json::from_str(&std::fs::read_to_string(&args.input)?)?;
    let benchmarks = match &args.benchmarks {
        Some(path) => {
            let overrides: BTreeMap<IndicatorCode, f64> =
                serde_json::from_str(&std::fs::read_to_string(path)?)?;
            apply_overrides(registry.benchmark_table(), overrides)?
        }
        None => registry.benchmark_table(),
    };

    let result = evaluate(&registry, args.granularity, &inputs, &benchmarks)?;
    let report = EvaluationReport::new(&registry, args.granularity, result);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// What `evaluate` prints: the verdict in words, then the full result.
#[derive(Debug, Serialize)]
struct EvaluationReport {
    summary: String,
    percentage: f64,
    statistics: ScoreStatistics,
    result: AssessmentResult,
}

impl EvaluationReport {
    fn new(registry: &EngineRegistry, granularity: Granularity, result: AssessmentResult) -> Self {
        let engine = registry.for_granularity(granularity);
        Self {
            summary: engine.policy().summary(result.total),
            percentage: result.percentage_of(engine.catalog().max_total()),
            statistics: result.score_statistics(),
            result,
        }
    }
}

fn apply_overrides(
    table: BenchmarkTable,
    overrides: BTreeMap<IndicatorCode, f64>,
) -> Result<BenchmarkTable, AppError> {
    overrides
        .into_iter()
        .try_fold(table, |table, (code, value)| {
            table.with_override(code.as_str(), value)
        })
        .map_err(AppError::from)
}

fn evaluate(
    registry: &EngineRegistry,
    granularity: Granularity,
    inputs: &RegionInputs,
    benchmarks: &BenchmarkTable,
) -> Result<AssessmentResult, AppError> {
    Ok(registry
        .for_granularity(granularity)
        .evaluate(inputs, benchmarks)?)
}

fn render_catalog(catalog: &IndicatorCatalog, granularity: Granularity) -> String {
    let mut out = format!(
        "Catalog {} ({}) - {} indicators, maximum total {}\n",
        catalog.version(),
        granularity.label(),
        catalog.len(),
        catalog.max_total()
    );
    for group in catalog.groups() {
        out.push_str(&format!(
            "\n{}. {} (weight {})\n",
            group.number,
            group.name,
            group.total_weight()
        ));
        for indicator in &group.indicators {
            out.push_str(&format!(
                "  {:<5} {:<32} w={:<4} {:<6} benchmark {}{}\n",
                indicator.code.as_str(),
                indicator.name,
                indicator.weight,
                indicator.mode.label(),
                indicator.default_benchmark,
                if indicator.unit.is_empty() {
                    String::new()
                } else {
                    format!(" {}", indicator.unit)
                }
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kapasda::scoring::EligibilityPolicy;

    #[test]
    fn catalog_table_lists_every_group_and_indicator() {
        let registry = EngineRegistry::standard(EligibilityPolicy::default()).expect("registry");
        let rendered = render_catalog(
            registry.for_granularity(Granularity::Desa).catalog(),
            Granularity::Desa,
        );

        assert!(rendered.starts_with("Catalog 2024.1 (desa) - 38 indicators, maximum total 515"));
        assert!(rendered.contains("\n7. Pemerintahan dan Tata Ruang"));
        assert!(rendered.contains("4.10"));
    }

    #[test]
    fn overrides_are_validated_before_evaluation() {
        let registry = EngineRegistry::standard(EligibilityPolicy::default()).expect("registry");
        let zero: BTreeMap<IndicatorCode, f64> = [(IndicatorCode::from("2.2"), 0.0)].into();

        let error = apply_overrides(registry.benchmark_table(), zero).expect_err("zero ratio");
        assert!(matches!(error, AppError::Catalog(_)));
    }

    #[test]
    fn evaluate_uses_overridden_benchmarks() {
        let registry = EngineRegistry::standard(EligibilityPolicy::default()).expect("registry");
        let raised: BTreeMap<IndicatorCode, f64> = [(IndicatorCode::from("2.2"), 137.0)].into();
        let benchmarks = apply_overrides(registry.benchmark_table(), raised).expect("valid");
        let inputs = RegionInputs::new().with("2.2", 68.5);

        let result = evaluate(&registry, Granularity::Kecamatan, &inputs, &benchmarks)
            .expect("evaluates");

        // 68.5 / 137 = 0.5 → 1 × 4
        assert_eq!(result.total, 4);
    }

    #[test]
    fn evaluation_report_states_the_verdict() {
        let registry = EngineRegistry::standard(EligibilityPolicy::default()).expect("registry");
        let inputs = RegionInputs::new().with("1.5", 1.0).with("7.3", 1.0);
        let result = evaluate(
            &registry,
            Granularity::Kecamatan,
            &inputs,
            &registry.benchmark_table(),
        )
        .expect("evaluates");

        let report = EvaluationReport::new(&registry, Granularity::Kecamatan, result);

        assert_eq!(report.summary, "TIDAK LAYAK with total 15, 385 short of threshold 400");
        assert!((report.percentage - 15.0 / 515.0 * 100.0).abs() < 1e-9);
        assert_eq!(report.statistics.scored, 2);
        assert_eq!(report.result.total, 15);
    }
}
