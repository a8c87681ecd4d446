use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::IndicatorCode;

/// A value as submitted by the form layer, before numeric validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    /// Booleans, arrays or objects; kept so the rest of a submission still scores.
    Other(serde_json::Value),
}

impl RawValue {
    /// `Ok(None)` means nothing was entered; blank text counts as nothing.
    pub fn parse(&self) -> Result<Option<f64>, ValidationReason> {
        match self {
            RawValue::Number(value) if value.is_finite() => Ok(Some(*value)),
            RawValue::Number(_) => Err(ValidationReason::NotFinite),
            RawValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Ok(None);
                }
                let value = trimmed
                    .parse::<f64>()
                    .map_err(|_| ValidationReason::NotANumber)?;
                if value.is_finite() {
                    Ok(Some(value))
                } else {
                    Err(ValidationReason::NotFinite)
                }
            }
            RawValue::Other(_) => Err(ValidationReason::NotANumber),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(value) => write!(f, "{value}"),
            RawValue::Text(text) => f.write_str(text),
            RawValue::Other(value) => write!(f, "{value}"),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    #[error("not a number")]
    NotANumber,
    #[error("not a finite number")]
    NotFinite,
}

/// A submitted value the engine could not read; scored as if absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("indicator {code}: {reason} ({raw:?})")]
pub struct ValidationError {
    pub code: IndicatorCode,
    pub raw: String,
    pub reason: ValidationReason,
}

/// Raw submissions for one region keyed by indicator code.
///
/// `None` entries record a field the user cleared; they score like missing keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionInputs(BTreeMap<IndicatorCode, Option<RawValue>>);

impl RegionInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, code: &str, value: impl Into<RawValue>) -> Self {
        self.set(code, value);
        self
    }

    pub fn set(&mut self, code: &str, value: impl Into<RawValue>) {
        self.0.insert(IndicatorCode::from(code), Some(value.into()));
    }

    pub fn clear(&mut self, code: &str) {
        self.0.insert(IndicatorCode::from(code), None);
    }

    pub fn get(&self, code: &str) -> Option<&RawValue> {
        self.0.get(code).and_then(Option::as_ref)
    }

    pub fn codes(&self) -> impl Iterator<Item = &IndicatorCode> + '_ {
        self.0.keys()
    }

    /// True when at least one indicator carries a submitted value.
    pub fn has_values(&self) -> bool {
        self.0.values().any(Option::is_some)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(IndicatorCode, RawValue)> for RegionInputs {
    fn from_iter<T: IntoIterator<Item = (IndicatorCode, RawValue)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(code, value)| (code, Some(value)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(RawValue::from("   ").parse(), Ok(None));
        assert_eq!(RawValue::from("").parse(), Ok(None));
    }

    #[test]
    fn numeric_text_is_trimmed_and_parsed() {
        assert_eq!(RawValue::from(" 42.5 ").parse(), Ok(Some(42.5)));
        assert_eq!(RawValue::from("-3").parse(), Ok(Some(-3.0)));
    }

    #[test]
    fn garbage_and_non_finite_values_are_rejected() {
        assert_eq!(
            RawValue::from("tujuh").parse(),
            Err(ValidationReason::NotANumber)
        );
        assert_eq!(
            RawValue::from("inf").parse(),
            Err(ValidationReason::NotFinite)
        );
        assert_eq!(
            RawValue::Number(f64::NAN).parse(),
            Err(ValidationReason::NotFinite)
        );
    }

    #[test]
    fn cleared_fields_read_as_absent() {
        let mut inputs = RegionInputs::new().with("1.1", 70.0);
        assert!(inputs.has_values());
        inputs.clear("1.1");
        assert!(inputs.get("1.1").is_none());
        assert!(!inputs.has_values());
        assert_eq!(inputs.len(), 1);
    }

    #[test]
    fn deserializes_numbers_text_and_nulls() {
        let inputs: RegionInputs = serde_json::from_value(serde_json::json!({
            "1.1": 70,
            "1.2": "55",
            "1.3": null
        }))
        .expect("valid inputs payload");

        assert_eq!(inputs.get("1.1"), Some(&RawValue::Number(70.0)));
        assert_eq!(inputs.get("1.2"), Some(&RawValue::Text("55".to_string())));
        assert!(inputs.get("1.3").is_none());
        assert_eq!(inputs.len(), 3);
    }

    #[test]
    fn non_scalar_fields_are_kept_and_rejected_individually() {
        let inputs: RegionInputs = serde_json::from_value(serde_json::json!({
            "1.1": true,
            "1.2": { "nilai": 3 },
            "1.3": 12
        }))
        .expect("one odd field does not reject the payload");

        let flag = inputs.get("1.1").expect("kept");
        assert_eq!(flag.parse(), Err(ValidationReason::NotANumber));
        assert_eq!(flag.to_string(), "true");
        assert_eq!(
            inputs.get("1.2").map(RawValue::parse),
            Some(Err(ValidationReason::NotANumber))
        );
        assert_eq!(inputs.get("1.3").map(RawValue::parse), Some(Ok(Some(12.0))));
    }
}
