use std::ops::Bound::{Excluded, Included};
use std::sync::Arc;

use super::catalog::{
    CatalogDefinition, ConfigurationError, EvaluationMode, Indicator, IndicatorCatalog,
    IndicatorCode, IndicatorGroup,
};
use super::curve::{ScoreCurve, Step};

pub const STANDARD_CATALOG_VERSION: &str = "2024.1";

/// The canonical kelayakan indicator set used for both kecamatan and desa.
pub fn standard_catalog() -> Result<Arc<IndicatorCatalog>, ConfigurationError> {
    IndicatorCatalog::new(standard_definition()).map(Arc::new)
}

pub fn standard_definition() -> CatalogDefinition {
    CatalogDefinition {
        version: STANDARD_CATALOG_VERSION.to_string(),
        groups: vec![
            IndicatorGroup {
                number: 1,
                name: "Geografi dan Lingkungan".to_string(),
                indicators: vec![
                    direct("1.1", "Jarak ke Ibukota CDP", "km", 2.0, 60.0, distance_to_capital()),
                    direct(
                        "1.2",
                        "Luas Lahan Pemerintahan",
                        "ha",
                        2.0,
                        60.0,
                        at_least_table(&[(60.0, 5), (50.0, 4), (40.0, 3)], 2),
                    ),
                    direct(
                        "1.3",
                        "Potensi Air Permukaan",
                        "liter/detik",
                        1.0,
                        16_000.0,
                        at_least_table(&[(16_000.0, 5), (12_000.0, 4), (8_000.0, 3)], 2),
                    ),
                    direct(
                        "1.4",
                        "Ketersediaan Air Baku",
                        "%",
                        1.0,
                        80.0,
                        at_least_table(&[(80.0, 5), (60.0, 4), (40.0, 3)], 2),
                    ),
                    direct("1.5", "IRBI Kabupaten (tetap)", "indeks", 1.0, 1.0, fixed()),
                    direct("1.6", "Kejadian Bencana 10 Tahun", "kejadian", 2.0, 0.0, incident_count()),
                ],
            },
            IndicatorGroup {
                number: 2,
                name: "Pendidikan dan Kependudukan".to_string(),
                indicators: vec![
                    ratio("2.1", "Rata-rata Lama Sekolah", "tahun", 4.0, 7.25, higher_is_better()),
                    ratio("2.2", "APK SMA/SMK", "%", 4.0, 68.5, higher_is_better()),
                    ratio("2.3", "APK SD-SMP", "%", 4.0, 98.5, higher_is_better()),
                    ratio(
                        "2.4",
                        "Rasio Kepadatan Penduduk",
                        "jiwa/km²",
                        3.0,
                        421.5,
                        ScoreCurve::steps(
                            vec![
                                Step::below(0.5, 5),
                                Step::at_most(0.8, 4),
                                Step::at_most(1.0, 3),
                                Step::at_most(1.2, 2),
                            ],
                            1,
                        ),
                    ),
                ],
            },
            IndicatorGroup {
                number: 3,
                name: "Keamanan dan Sosial Politik".to_string(),
                indicators: vec![
                    direct("3.1", "Jumlah Kriminal per Tahun", "kasus", 2.0, 0.0, incident_count()),
                    direct(
                        "3.2",
                        "Jumlah Konflik 5 Tahun",
                        "kejadian",
                        2.0,
                        0.0,
                        ScoreCurve::steps(
                            vec![
                                Step::at_most(2.0, 5),
                                Step::at_most(5.0, 4),
                                Step::at_most(10.0, 3),
                            ],
                            1,
                        ),
                    ),
                    direct(
                        "3.3",
                        "Jumlah DPT Pemilu 2024",
                        "pemilih",
                        3.0,
                        50_000.0,
                        at_least_table(&[(50_000.0, 5), (40_000.0, 4), (30_000.0, 3)], 2),
                    ),
                    direct(
                        "3.4",
                        "Partisipasi Pemilih",
                        "%",
                        3.0,
                        80.0,
                        at_least_table(&[(80.0, 5), (75.0, 4), (70.0, 3)], 2),
                    ),
                    direct(
                        "3.5",
                        "Persentase Etnik Dominan",
                        "%",
                        2.0,
                        90.0,
                        at_least_table(&[(90.0, 4)], 5),
                    ),
                    direct(
                        "3.6",
                        "Jumlah Ormas Terdaftar",
                        "organisasi",
                        3.0,
                        20.0,
                        at_least_table(&[(20.0, 5), (15.0, 4), (10.0, 3)], 2),
                    ),
                ],
            },
            IndicatorGroup {
                number: 4,
                name: "Ekonomi".to_string(),
                indicators: vec![
                    ratio("4.1", "Rata-rata LPE 5 Tahun", "%", 3.0, 4.65, higher_is_better()),
                    ratio("4.2", "Pendapatan Per Kapita", "juta rupiah", 3.0, 31.0, higher_is_better()),
                    ratio("4.3", "IPM Kecamatan", "indeks", 3.0, 69.67, higher_is_better()),
                    ratio(
                        "4.4",
                        "Penduduk Miskin",
                        "%",
                        3.0,
                        7.95,
                        ScoreCurve::steps(
                            vec![
                                Step::below(0.7, 5),
                                Step::at_most(1.0, 4),
                                Step::at_most(1.2, 3),
                                Step::at_most(1.4, 2),
                            ],
                            1,
                        ),
                    ),
                    direct("4.5", "PDRB Sektor Pertanian", "juta rupiah", 1.0, 0.0, sector_present()),
                    direct("4.6", "PDRB Sektor Industri", "juta rupiah", 1.0, 0.0, sector_present()),
                    direct("4.7", "PDRB Sektor Perdagangan", "juta rupiah", 2.0, 0.0, sector_present()),
                    direct("4.8", "PDRB Sektor Transportasi", "juta rupiah", 1.0, 0.0, sector_present()),
                    direct("4.9", "PDRB Sektor Keuangan", "juta rupiah", 2.0, 0.0, sector_present()),
                    direct("4.10", "PDRB Sektor Jasa", "juta rupiah", 2.0, 0.0, sector_present()),
                ],
            },
            IndicatorGroup {
                number: 5,
                name: "Keuangan Daerah".to_string(),
                indicators: vec![
                    direct("5.1", "PAD Kabupaten 2024 (tetap)", "miliar rupiah", 5.0, 1.0, fixed()),
                    direct(
                        "5.2",
                        "Total PAD Kecamatan",
                        "miliar rupiah",
                        8.0,
                        20.0,
                        at_least_table(&[(20.0, 5), (10.0, 4)], 3),
                    ),
                    direct("5.3", "Opini WTP 5 Tahun (tetap)", "opini", 4.0, 1.0, fixed()),
                ],
            },
            IndicatorGroup {
                number: 6,
                name: "Sarana dan Prasarana".to_string(),
                indicators: vec![
                    ratio("6.1", "Rasio Murid SD per Kelas", "murid/kelas", 2.0, 28.0, optimal_band()),
                    ratio("6.2", "Rasio Murid SMP per Kelas", "murid/kelas", 2.0, 32.0, optimal_band()),
                    ratio("6.3", "Rasio Murid SMA per Kelas", "murid/kelas", 1.0, 36.0, optimal_band()),
                    direct(
                        "6.4",
                        "Jumlah Dokter",
                        "orang",
                        3.0,
                        5.0,
                        at_least_table(&[(5.0, 5), (2.0, 4)], 3),
                    ),
                    direct(
                        "6.5",
                        "Jumlah Tempat Tidur RS",
                        "unit",
                        2.0,
                        100.0,
                        at_least_table(&[(100.0, 5), (50.0, 4)], 3),
                    ),
                    direct(
                        "6.6",
                        "Panjang Jalan Desa",
                        "km",
                        10.0,
                        150.0,
                        at_least_table(&[(150.0, 5), (80.0, 4)], 3),
                    ),
                ],
            },
            IndicatorGroup {
                number: 7,
                name: "Pemerintahan dan Tata Ruang".to_string(),
                indicators: vec![
                    direct("7.1", "ASN Kabupaten (tetap)", "orang", 2.0, 1.0, fixed()),
                    direct(
                        "7.2",
                        "ASN/P3K di Kecamatan",
                        "orang",
                        2.0,
                        1_000.0,
                        at_least_table(&[(1_000.0, 5), (500.0, 4)], 3),
                    ),
                    direct("7.3", "Status RTRW CDP (tetap)", "status", 2.0, 1.0, fixed()),
                ],
            },
        ],
    }
}

fn direct(
    code: &str,
    name: &str,
    unit: &str,
    weight: f64,
    reference: f64,
    curve: ScoreCurve,
) -> Indicator {
    indicator(code, name, unit, weight, EvaluationMode::Direct, reference, curve)
}

fn ratio(
    code: &str,
    name: &str,
    unit: &str,
    weight: f64,
    benchmark: f64,
    curve: ScoreCurve,
) -> Indicator {
    indicator(code, name, unit, weight, EvaluationMode::Ratio, benchmark, curve)
}

fn indicator(
    code: &str,
    name: &str,
    unit: &str,
    weight: f64,
    mode: EvaluationMode,
    default_benchmark: f64,
    curve: ScoreCurve,
) -> Indicator {
    Indicator {
        code: IndicatorCode::from(code),
        name: name.to_string(),
        unit: unit.to_string(),
        weight,
        mode,
        default_benchmark,
        curve,
    }
}

fn at_least_table(rows: &[(f64, u8)], otherwise: u8) -> ScoreCurve {
    ScoreCurve::steps(
        rows.iter()
            .map(|&(limit, score)| Step::at_least(limit, score))
            .collect(),
        otherwise,
    )
}

fn fixed() -> ScoreCurve {
    ScoreCurve::constant(5)
}

fn distance_to_capital() -> ScoreCurve {
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

fn incident_count() -> ScoreCurve {
    ScoreCurve::steps(
        vec![
            Step::equals(0.0, 5),
            Step::at_most(5.0, 4),
            Step::at_most(10.0, 3),
        ],
        2,
    )
}

fn higher_is_better() -> ScoreCurve {
    at_least_table(&[(1.0, 5), (0.9, 4), (0.8, 3), (0.7, 2)], 1)
}

fn sector_present() -> ScoreCurve {
    ScoreCurve::steps(vec![Step::above(0.0, 4)], 1)
}

// Symmetric band around the benchmark: [0.8, 1.1] is ideal, each 0.1 step away drops a point.
fn optimal_band() -> ScoreCurve {
    ScoreCurve::steps(
        vec![
            Step::between(Included(0.8), Included(1.1), 5),
            Step::between(Included(0.7), Excluded(0.8), 4),
            Step::between(Excluded(1.1), Included(1.2), 4),
            Step::between(Included(0.6), Excluded(0.7), 3),
            Step::between(Excluded(1.2), Included(1.3), 3),
            Step::between(Included(0.5), Excluded(0.6), 2),
            Step::between(Excluded(1.3), Included(1.4), 2),
        ],
        1,
    )
}
