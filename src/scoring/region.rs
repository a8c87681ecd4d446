use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::evaluation::AssessmentResult;
use super::inputs::RegionInputs;

/// Administrative level a region is scored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Kecamatan,
    Desa,
}

impl Granularity {
    pub const fn ordered() -> [Self; 2] {
        [Self::Kecamatan, Self::Desa]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Kecamatan => "kecamatan",
            Self::Desa => "desa",
        }
    }
}

impl FromStr for Granularity {
    type Err = UnknownGranularity;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kecamatan" => Ok(Self::Kecamatan),
            "desa" => Ok(Self::Desa),
            _ => Err(UnknownGranularity(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region granularity '{0}'; expected kecamatan or desa")]
pub struct UnknownGranularity(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId {
    pub granularity: Granularity,
    pub name: String,
}

impl RegionId {
    pub fn new(granularity: Granularity, name: impl Into<String>) -> Self {
        Self {
            granularity,
            name: name.into(),
        }
    }

    pub fn kecamatan(name: impl Into<String>) -> Self {
        Self::new(Granularity::Kecamatan, name)
    }

    pub fn desa(name: impl Into<String>) -> Self {
        Self::new(Granularity::Desa, name)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.granularity.label(), self.name)
    }
}

/// Stored state of one assessed region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub region: RegionId,
    pub inputs: RegionInputs,
    pub result: Option<AssessmentResult>,
    pub updated_at: DateTime<Utc>,
}

impl RegionRecord {
    /// Raw data imported before any calculation ran.
    pub fn pending(region: RegionId, inputs: RegionInputs, updated_at: DateTime<Utc>) -> Self {
        Self {
            region,
            inputs,
            result: None,
            updated_at,
        }
    }

    pub fn total(&self) -> Option<i64> {
        self.result.as_ref().map(|result| result.total)
    }

    pub fn status_label(&self) -> &'static str {
        match &self.result {
            Some(result) => result.classification.label(),
            None => "BELUM DINILAI",
        }
    }

    pub fn stored_inputs(&self) -> StoredInputs {
        StoredInputs {
            region: self.region.clone(),
            inputs: self.inputs.clone(),
        }
    }
}

/// Region identifier paired with its raw submissions, as read for recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredInputs {
    pub region: RegionId,
    pub inputs: RegionInputs,
}
