use std::ops::{Bound, RangeBounds};

use serde::{Deserialize, Serialize};

/// Highest score any curve may award.
pub const MAX_SCORE: u8 = 5;

/// Boundary test applied to an evaluated value (a ratio or a raw measurement).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Threshold {
    AtLeast(f64),
    Above(f64),
    AtMost(f64),
    Below(f64),
    Equals(f64),
    Between { lower: Bound<f64>, upper: Bound<f64> },
}

impl Threshold {
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            Threshold::AtLeast(limit) => value >= limit,
            Threshold::Above(limit) => value > limit,
            Threshold::AtMost(limit) => value <= limit,
            Threshold::Below(limit) => value < limit,
            Threshold::Equals(target) => value == target,
            Threshold::Between { lower, upper } => (lower, upper).contains(&value),
        }
    }

    fn limits(&self) -> Vec<f64> {
        match *self {
            Threshold::AtLeast(limit)
            | Threshold::Above(limit)
            | Threshold::AtMost(limit)
            | Threshold::Below(limit)
            | Threshold::Equals(limit) => vec![limit],
            Threshold::Between { lower, upper } => [lower, upper]
                .into_iter()
                .filter_map(|bound| match bound {
                    Bound::Included(limit) | Bound::Excluded(limit) => Some(limit),
                    Bound::Unbounded => None,
                })
                .collect(),
        }
    }
}

/// One row of a step table: the score awarded when `when` matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub when: Threshold,
    pub score: u8,
}

impl Step {
    pub fn at_least(limit: f64, score: u8) -> Self {
        Self {
            when: Threshold::AtLeast(limit),
            score,
        }
    }

    pub fn above(limit: f64, score: u8) -> Self {
        Self {
            when: Threshold::Above(limit),
            score,
        }
    }

    pub fn at_most(limit: f64, score: u8) -> Self {
        Self {
            when: Threshold::AtMost(limit),
            score,
        }
    }

    pub fn below(limit: f64, score: u8) -> Self {
        Self {
            when: Threshold::Below(limit),
            score,
        }
    }

    pub fn equals(target: f64, score: u8) -> Self {
        Self {
            when: Threshold::Equals(target),
            score,
        }
    }

    pub fn between(lower: Bound<f64>, upper: Bound<f64>, score: u8) -> Self {
        Self {
            when: Threshold::Between { lower, upper },
            score,
        }
    }
}

/// Scoring curve of an indicator, evaluated as an ordered table.
///
/// Steps are tested top to bottom and the first match wins; `otherwise`
/// covers every value no step claims, which keeps the curve total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreCurve {
    Constant { score: u8 },
    Steps { steps: Vec<Step>, otherwise: u8 },
}

impl ScoreCurve {
    pub fn constant(score: u8) -> Self {
        ScoreCurve::Constant { score }
    }

    pub fn steps(steps: Vec<Step>, otherwise: u8) -> Self {
        ScoreCurve::Steps { steps, otherwise }
    }

    pub fn evaluate(&self, value: f64) -> u8 {
        match self {
            ScoreCurve::Constant { score } => *score,
            ScoreCurve::Steps { steps, otherwise } => steps
                .iter()
                .find(|step| step.when.matches(value))
                .map(|step| step.score)
                .unwrap_or(*otherwise),
        }
    }

    /// Checks the table is usable; returns a human-readable reason otherwise.
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            ScoreCurve::Constant { score } => check_score(*score),
            ScoreCurve::Steps { steps, otherwise } => {
                check_score(*otherwise)?;
                for (index, step) in steps.iter().enumerate() {
                    check_score(step.score)
                        .map_err(|reason| format!("step {}: {reason}", index + 1))?;
                    if step.when.limits().iter().any(|limit| !limit.is_finite()) {
                        return Err(format!("step {} has a non-finite boundary", index + 1));
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_score(score: u8) -> Result<(), String> {
    if score > MAX_SCORE {
        Err(format!("score {score} exceeds maximum {MAX_SCORE}"))
    } else {
        Ok(())
    }
}
