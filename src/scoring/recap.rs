use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluation::Eligibility;
use super::region::{Granularity, RegionId, RegionRecord};

/// Which rows a recap keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecapFilter {
    #[default]
    All,
    Eligible,
    NotEligible,
    Pending,
}

impl RecapFilter {
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Eligible => "eligible",
            Self::NotEligible => "not_eligible",
            Self::Pending => "pending",
        }
    }

    fn keeps(self, record: &RegionRecord) -> bool {
        let classification = record.result.as_ref().map(|result| result.classification);
        match self {
            Self::All => true,
            Self::Eligible => classification == Some(Eligibility::Eligible),
            Self::NotEligible => classification == Some(Eligibility::NotEligible),
            Self::Pending => classification.is_none(),
        }
    }
}

impl FromStr for RecapFilter {
    type Err = UnknownRecapFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "eligible" | "layak" => Ok(Self::Eligible),
            "not_eligible" | "tidak_layak" => Ok(Self::NotEligible),
            "pending" => Ok(Self::Pending),
            _ => Err(UnknownRecapFilter(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown recap filter '{0}'")]
pub struct UnknownRecapFilter(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapRow {
    pub rank: usize,
    pub region: RegionId,
    pub total: Option<i64>,
    pub classification: Option<Eligibility>,
    pub threshold: i64,
    pub status_label: String,
    pub updated_at: DateTime<Utc>,
}

/// Counts over every record, independent of the row filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecapStatistics {
    pub regions: usize,
    pub assessed: usize,
    pub eligible: usize,
    pub not_eligible: usize,
    pub pending: usize,
    pub eligible_percentage: f64,
    pub average_total: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recap {
    pub thresholds: BTreeMap<Granularity, i64>,
    pub filter: RecapFilter,
    pub rows: Vec<RecapRow>,
    pub statistics: RecapStatistics,
}

impl Recap {
    /// Ranks assessed regions by total descending, then by name; pending ones go last.
    ///
    /// `threshold` yields the eligibility threshold in force for a granularity.
    pub fn build(
        records: Vec<RegionRecord>,
        threshold: impl Fn(Granularity) -> i64,
        filter: RecapFilter,
    ) -> Self {
        let statistics = statistics(&records);

        let mut records = records;
        records.sort_by(ranking);

        let rows = records
            .iter()
            .enumerate()
            .filter(|(_, record)| filter.keeps(record))
            .map(|(index, record)| RecapRow {
                rank: index + 1,
                region: record.region.clone(),
                total: record.total(),
                classification: record.result.as_ref().map(|result| result.classification),
                threshold: threshold(record.region.granularity),
                status_label: record.status_label().to_string(),
                updated_at: record.updated_at,
            })
            .collect();

        Self {
            thresholds: Granularity::ordered()
                .into_iter()
                .map(|granularity| (granularity, threshold(granularity)))
                .collect(),
            filter,
            rows,
            statistics,
        }
    }
}

fn ranking(left: &RegionRecord, right: &RegionRecord) -> Ordering {
    match (left.total(), right.total()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| left.region.name.cmp(&right.region.name))
    .then_with(|| left.region.granularity.cmp(&right.region.granularity))
}

fn statistics(records: &[RegionRecord]) -> RecapStatistics {
    let totals: Vec<i64> = records.iter().filter_map(RegionRecord::total).collect();
    let eligible = records
        .iter()
        .filter(|record| RecapFilter::Eligible.keeps(record))
        .count();
    let assessed = totals.len();

    RecapStatistics {
        regions: records.len(),
        assessed,
        eligible,
        not_eligible: assessed - eligible,
        pending: records.len() - assessed,
        eligible_percentage: if assessed == 0 {
            0.0
        } else {
            eligible as f64 / assessed as f64 * 100.0
        },
        average_total: (assessed > 0)
            .then(|| totals.iter().sum::<i64>() as f64 / assessed as f64),
    }
}
