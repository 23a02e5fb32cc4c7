//! Engine configuration
//!
//! Loaded from JSON by hosts that need non-default behaviour; everything has
//! a default so `EngineConfig::default()` is always usable.

use crate::error::VitalsError;
use crate::window::DatasetBounds;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Default ceiling on medication name length
pub const DEFAULT_MEDICATION_NAME_LIMIT: usize = 100;

/// Where the three-month clamp bounds come from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum BoundsSource {
    /// Earliest and latest record dates of the loaded patient
    #[default]
    FromData,
    /// Explicit coverage interval
    Fixed { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub bounds: BoundsSource,
    /// Time of day given to single-value glucose and blood pressure readings
    pub unknown_time: NaiveTime,
    pub medication_name_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bounds: BoundsSource::FromData,
            unknown_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN),
            medication_name_limit: DEFAULT_MEDICATION_NAME_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, VitalsError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), VitalsError> {
        if let BoundsSource::Fixed { start, end } = &self.bounds {
            if start > end {
                return Err(VitalsError::ConfigError(format!(
                    "dataset start {start} is after end {end}"
                )));
            }
        }
        if self.medication_name_limit == 0 {
            return Err(VitalsError::ConfigError(
                "medication_name_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the clamp bounds, given the dates actually present in the data
    pub fn resolve_bounds(&self, data_bounds: Option<DatasetBounds>) -> DatasetBounds {
        match &self.bounds {
            BoundsSource::Fixed { start, end } => DatasetBounds::new(*start, *end),
            BoundsSource::FromData => data_bounds.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.bounds, BoundsSource::FromData);
        assert_eq!(config.unknown_time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(config.medication_name_limit, 100);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(
            r#"{"bounds": {"source": "fixed", "start": "2024-07-01", "end": "2025-07-31"}}"#,
        )
        .unwrap();
        assert_eq!(
            config.bounds,
            BoundsSource::Fixed {
                start: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 7, 31).unwrap(),
            }
        );
        assert_eq!(config.medication_name_limit, 100);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let result = EngineConfig::from_json(
            r#"{"bounds": {"source": "fixed", "start": "2025-07-31", "end": "2024-07-01"}}"#,
        );
        assert!(matches!(result, Err(VitalsError::ConfigError(_))));
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig {
            unknown_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_resolve_bounds() {
        let data = DatasetBounds::new(
            NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
        );
        let config = EngineConfig::default();
        assert_eq!(config.resolve_bounds(Some(data)), data);
        assert_eq!(config.resolve_bounds(None), DatasetBounds::default());
    }
}
