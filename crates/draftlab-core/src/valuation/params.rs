// Scoring parameter sets: the tunable weights searched by the optimizer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::draft::player::InjuryRisk;

/// Every key a parameter set must carry before it can drive scoring.
pub const REQUIRED_KEYS: [&str; 24] = [
    "NORMALIZATION_MAX_SCALE",
    "BASE_BYE_PENALTY",
    "INJURY_PENALTIES_LOW",
    "INJURY_PENALTIES_MEDIUM",
    "INJURY_PENALTIES_HIGH",
    "DRAFT_ORDER_PRIMARY_BONUS",
    "DRAFT_ORDER_SECONDARY_BONUS",
    "ADP_EXCELLENT_MULTIPLIER",
    "ADP_GOOD_MULTIPLIER",
    "ADP_POOR_MULTIPLIER",
    "PLAYER_RATING_EXCELLENT_MULTIPLIER",
    "PLAYER_RATING_GOOD_MULTIPLIER",
    "PLAYER_RATING_POOR_MULTIPLIER",
    "TEAM_EXCELLENT_MULTIPLIER",
    "TEAM_GOOD_MULTIPLIER",
    "TEAM_POOR_MULTIPLIER",
    "MATCHUP_EXCELLENT_MULTIPLIER",
    "MATCHUP_GOOD_MULTIPLIER",
    "MATCHUP_NEUTRAL_MULTIPLIER",
    "MATCHUP_POOR_MULTIPLIER",
    "MATCHUP_VERY_POOR_MULTIPLIER",
    "CONSISTENCY_LOW_MULTIPLIER",
    "CONSISTENCY_MEDIUM_MULTIPLIER",
    "CONSISTENCY_HIGH_MULTIPLIER",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("missing required scoring parameter `{0}`")]
    MissingKey(String),

    #[error("invalid value {value} for scoring parameter `{key}`: {reason}")]
    InvalidValue {
        key: String,
        value: f64,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// ParameterSet
// ---------------------------------------------------------------------------

/// An immutable, validated name -> value mapping.
///
/// Deserialization is transparent so sets round-trip through reports, but a
/// deserialized set is not validated; `ScoringWeights::from_params` still
/// fails fast on a missing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    /// Build a parameter set, rejecting missing keys, unknown keys and values
    /// outside their allowed range.
    pub fn from_map(values: BTreeMap<String, f64>) -> Result<Self, ParameterError> {
        for key in REQUIRED_KEYS {
            if !values.contains_key(key) {
                return Err(ParameterError::MissingKey(key.to_string()));
            }
        }
        for (key, &value) in &values {
            check_value(key, value)?;
        }
        Ok(ParameterSet { values })
    }

    /// Look up a parameter. Absent keys are an error, never a default.
    pub fn get(&self, key: &str) -> Result<f64, ParameterError> {
        self.values
            .get(key)
            .copied()
            .ok_or_else(|| ParameterError::MissingKey(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Return a copy with one parameter replaced, re-validating the new value.
    pub fn with_value(&self, key: &str, value: f64) -> Result<Self, ParameterError> {
        if !self.values.contains_key(key) {
            return Err(ParameterError::MissingKey(key.to_string()));
        }
        check_value(key, value)?;
        let mut values = self.values.clone();
        values.insert(key.to_string(), value);
        Ok(ParameterSet { values })
    }

    /// Stable grouping key: sorted `NAME=value` pairs joined by `|`.
    pub fn config_key(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.values
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config_key())
    }
}

fn check_value(key: &str, value: f64) -> Result<(), ParameterError> {
    let invalid = |reason: &str| ParameterError::InvalidValue {
        key: key.to_string(),
        value,
        reason: reason.to_string(),
    };

    if !REQUIRED_KEYS.contains(&key) {
        return Err(invalid("unknown parameter"));
    }
    if !value.is_finite() {
        return Err(invalid("must be finite"));
    }
    if key.ends_with("_MULTIPLIER") || key == "NORMALIZATION_MAX_SCALE" {
        if value <= 0.0 {
            return Err(invalid("must be > 0"));
        }
    } else if value < 0.0 {
        return Err(invalid("must be >= 0"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Resolved weights
// ---------------------------------------------------------------------------

/// Multipliers for a three-tier curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierMultipliers {
    pub excellent: f64,
    pub good: f64,
    pub poor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchupMultipliers {
    pub excellent: f64,
    pub good: f64,
    pub neutral: f64,
    pub poor: f64,
    pub very_poor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsistencyMultipliers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InjuryPenalties {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl InjuryPenalties {
    pub fn for_risk(&self, risk: InjuryRisk) -> f64 {
        match risk {
            InjuryRisk::Low => self.low,
            InjuryRisk::Medium => self.medium,
            InjuryRisk::High => self.high,
        }
    }
}

/// A parameter set resolved into typed fields, so the scoring hot path never
/// performs string lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub normalization_max_scale: f64,
    pub base_bye_penalty: f64,
    pub injury: InjuryPenalties,
    pub draft_order_primary_bonus: f64,
    pub draft_order_secondary_bonus: f64,
    pub adp: TierMultipliers,
    pub rating: TierMultipliers,
    pub team: TierMultipliers,
    pub matchup: MatchupMultipliers,
    pub consistency: ConsistencyMultipliers,
}

impl ScoringWeights {
    pub fn from_params(params: &ParameterSet) -> Result<Self, ParameterError> {
        let tier = |prefix: &str| -> Result<TierMultipliers, ParameterError> {
            Ok(TierMultipliers {
                excellent: params.get(&format!("{prefix}_EXCELLENT_MULTIPLIER"))?,
                good: params.get(&format!("{prefix}_GOOD_MULTIPLIER"))?,
                poor: params.get(&format!("{prefix}_POOR_MULTIPLIER"))?,
            })
        };

        Ok(ScoringWeights {
            normalization_max_scale: params.get("NORMALIZATION_MAX_SCALE")?,
            base_bye_penalty: params.get("BASE_BYE_PENALTY")?,
            injury: InjuryPenalties {
                low: params.get("INJURY_PENALTIES_LOW")?,
                medium: params.get("INJURY_PENALTIES_MEDIUM")?,
                high: params.get("INJURY_PENALTIES_HIGH")?,
            },
            draft_order_primary_bonus: params.get("DRAFT_ORDER_PRIMARY_BONUS")?,
            draft_order_secondary_bonus: params.get("DRAFT_ORDER_SECONDARY_BONUS")?,
            adp: tier("ADP")?,
            rating: tier("PLAYER_RATING")?,
            team: tier("TEAM")?,
            matchup: MatchupMultipliers {
                excellent: params.get("MATCHUP_EXCELLENT_MULTIPLIER")?,
                good: params.get("MATCHUP_GOOD_MULTIPLIER")?,
                neutral: params.get("MATCHUP_NEUTRAL_MULTIPLIER")?,
                poor: params.get("MATCHUP_POOR_MULTIPLIER")?,
                very_poor: params.get("MATCHUP_VERY_POOR_MULTIPLIER")?,
            },
            consistency: ConsistencyMultipliers {
                low: params.get("CONSISTENCY_LOW_MULTIPLIER")?,
                medium: params.get("CONSISTENCY_MEDIUM_MULTIPLIER")?,
                high: params.get("CONSISTENCY_HIGH_MULTIPLIER")?,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

/// The shipped baseline values, for tests and synthetic runs.
pub fn baseline_map() -> BTreeMap<String, f64> {
    [
        ("NORMALIZATION_MAX_SCALE", 100.0),
        ("BASE_BYE_PENALTY", 20.0),
        ("INJURY_PENALTIES_LOW", 0.0),
        ("INJURY_PENALTIES_MEDIUM", 25.0),
        ("INJURY_PENALTIES_HIGH", 50.0),
        ("DRAFT_ORDER_PRIMARY_BONUS", 75.0),
        ("DRAFT_ORDER_SECONDARY_BONUS", 40.0),
        ("ADP_EXCELLENT_MULTIPLIER", 1.15),
        ("ADP_GOOD_MULTIPLIER", 1.08),
        ("ADP_POOR_MULTIPLIER", 0.92),
        ("PLAYER_RATING_EXCELLENT_MULTIPLIER", 1.20),
        ("PLAYER_RATING_GOOD_MULTIPLIER", 1.10),
        ("PLAYER_RATING_POOR_MULTIPLIER", 0.90),
        ("TEAM_EXCELLENT_MULTIPLIER", 1.12),
        ("TEAM_GOOD_MULTIPLIER", 1.06),
        ("TEAM_POOR_MULTIPLIER", 0.94),
        ("MATCHUP_EXCELLENT_MULTIPLIER", 1.20),
        ("MATCHUP_GOOD_MULTIPLIER", 1.10),
        ("MATCHUP_NEUTRAL_MULTIPLIER", 1.00),
        ("MATCHUP_POOR_MULTIPLIER", 0.90),
        ("MATCHUP_VERY_POOR_MULTIPLIER", 0.80),
        ("CONSISTENCY_LOW_MULTIPLIER", 1.08),
        ("CONSISTENCY_MEDIUM_MULTIPLIER", 1.00),
        ("CONSISTENCY_HIGH_MULTIPLIER", 0.92),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_map_is_complete() {
        let set = ParameterSet::from_map(baseline_map()).unwrap();
        assert_eq!(set.as_map().len(), REQUIRED_KEYS.len());
        assert_eq!(set.get("BASE_BYE_PENALTY").unwrap(), 20.0);
    }

    #[test]
    fn missing_key_fails_fast() {
        let mut map = baseline_map();
        map.remove("INJURY_PENALTIES_HIGH");
        assert_eq!(
            ParameterSet::from_map(map).unwrap_err(),
            ParameterError::MissingKey("INJURY_PENALTIES_HIGH".into())
        );
    }

    #[test]
    fn unknown_key_rejected() {
        let mut map = baseline_map();
        map.insert("POS_NEEDED_SCORE".into(), 10.0);
        match ParameterSet::from_map(map).unwrap_err() {
            ParameterError::InvalidValue { key, .. } => assert_eq!(key, "POS_NEEDED_SCORE"),
            other => panic!("expected InvalidValue, got: {other}"),
        }
    }

    #[test]
    fn range_checks() {
        let set = ParameterSet::from_map(baseline_map()).unwrap();
        assert!(set.with_value("ADP_GOOD_MULTIPLIER", 0.0).is_err());
        assert!(set.with_value("BASE_BYE_PENALTY", -1.0).is_err());
        assert!(set.with_value("BASE_BYE_PENALTY", f64::NAN).is_err());
        assert!(set.with_value("BASE_BYE_PENALTY", 0.0).is_ok());
    }

    #[test]
    fn with_value_leaves_original_untouched() {
        let set = ParameterSet::from_map(baseline_map()).unwrap();
        let changed = set.with_value("BASE_BYE_PENALTY", 30.0).unwrap();
        assert_eq!(set.get("BASE_BYE_PENALTY").unwrap(), 20.0);
        assert_eq!(changed.get("BASE_BYE_PENALTY").unwrap(), 30.0);
        assert_ne!(set.config_key(), changed.config_key());
    }

    #[test]
    fn config_key_is_sorted_and_stable() {
        let a = ParameterSet::from_map(baseline_map()).unwrap();
        let b = ParameterSet::from_map(baseline_map().into_iter().rev().collect()).unwrap();
        assert_eq!(a.config_key(), b.config_key());
        assert!(a.config_key().starts_with("ADP_EXCELLENT_MULTIPLIER=1.15|"));
    }

    #[test]
    fn weights_fail_on_unvalidated_set() {
        let set: ParameterSet =
            serde_json::from_str(r#"{"NORMALIZATION_MAX_SCALE": 100.0}"#).unwrap();
        assert!(matches!(
            ScoringWeights::from_params(&set),
            Err(ParameterError::MissingKey(_))
        ));
    }

    #[test]
    fn weights_resolve_from_baseline() {
        let set = ParameterSet::from_map(baseline_map()).unwrap();
        let w = ScoringWeights::from_params(&set).unwrap();
        assert_eq!(w.injury.for_risk(InjuryRisk::Medium), 25.0);
        assert_eq!(w.rating.excellent, 1.20);
        assert_eq!(w.matchup.very_poor, 0.80);
    }
}
