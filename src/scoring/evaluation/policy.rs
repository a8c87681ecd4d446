use serde::{Deserialize, Serialize};

/// Minimum rounded total for a region to be classified as eligible.
pub const ELIGIBILITY_THRESHOLD: i64 = 400;

/// Binary classification derived from the rounded total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    NotEligible,
}

impl Eligibility {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Eligible => "LAYAK",
            Self::NotEligible => "TIDAK LAYAK",
        }
    }

    pub const fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    pub threshold: i64,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            threshold: ELIGIBILITY_THRESHOLD,
        }
    }
}

impl EligibilityPolicy {
    pub fn new(threshold: i64) -> Self {
        Self { threshold }
    }

    pub fn classify(&self, total: i64) -> Eligibility {
        if total >= self.threshold {
            Eligibility::Eligible
        } else {
            Eligibility::NotEligible
        }
    }

    pub fn summary(&self, total: i64) -> String {
        let classification = self.classify(total);
        match classification {
            Eligibility::Eligible => format!(
                "{} with total {total} (threshold {})",
                classification.label(),
                self.threshold
            ),
            Eligibility::NotEligible => format!(
                "{} with total {total}, {} short of threshold {}",
                classification.label(),
                self.threshold - total,
                self.threshold
            ),
        }
    }
}
