// Tiered multiplier curves: ADP, rating, team quality, matchup, consistency.
//
// ADP, rating and team rank use a piecewise-linear curve through four anchor
// points (excellent, good, neutral midpoint, poor). Matchup and consistency
// are stepped tiers.

use crate::config::{MatchupThresholds, TierThresholds};

use super::params::{ConsistencyMultipliers, MatchupMultipliers, TierMultipliers};

// ---------------------------------------------------------------------------
// Interpolated curves
// ---------------------------------------------------------------------------

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Position of `value` between `lo` and `hi` (0.0 to 1.0). A zero-width span
/// counts as fully crossed.
fn fraction(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        (value - lo) / (hi - lo)
    } else {
        1.0
    }
}

/// Multiplier for a metric where smaller values are better (ADP, team rank).
///
/// Thresholds must satisfy `excellent <= good <= poor`.
pub fn lower_is_better(value: f64, t: &TierThresholds, m: &TierMultipliers) -> f64 {
    let neutral = (t.good + t.poor) / 2.0;
    if value <= t.excellent {
        m.excellent
    } else if value <= t.good {
        lerp(m.excellent, m.good, fraction(value, t.excellent, t.good))
    } else if value <= neutral {
        lerp(m.good, 1.0, fraction(value, t.good, neutral))
    } else if value < t.poor {
        lerp(1.0, m.poor, fraction(value, neutral, t.poor))
    } else {
        m.poor
    }
}

/// Multiplier for a metric where larger values are better (player rating).
///
/// Thresholds must satisfy `excellent >= good >= poor`.
pub fn higher_is_better(value: f64, t: &TierThresholds, m: &TierMultipliers) -> f64 {
    let mirrored = TierThresholds {
        excellent: -t.excellent,
        good: -t.good,
        poor: -t.poor,
    };
    lower_is_better(-value, &mirrored, m)
}

// ---------------------------------------------------------------------------
// Matchup tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchupTier {
    Excellent,
    Good,
    Neutral,
    Poor,
    VeryPoor,
}

impl MatchupTier {
    pub fn from_rating(rating: f64, t: &MatchupThresholds) -> Self {
        if rating >= t.excellent {
            MatchupTier::Excellent
        } else if rating >= t.good {
            MatchupTier::Good
        } else if rating >= t.neutral {
            MatchupTier::Neutral
        } else if rating >= t.poor {
            MatchupTier::Poor
        } else {
            MatchupTier::VeryPoor
        }
    }

    pub fn multiplier(&self, m: &MatchupMultipliers) -> f64 {
        match self {
            MatchupTier::Excellent => m.excellent,
            MatchupTier::Good => m.good,
            MatchupTier::Neutral => m.neutral,
            MatchupTier::Poor => m.poor,
            MatchupTier::VeryPoor => m.very_poor,
        }
    }
}

// ---------------------------------------------------------------------------
// Consistency tiers
// ---------------------------------------------------------------------------

/// Week-to-week volatility of a player's projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyTier {
    /// Coefficient of variation below 0.3.
    Low,
    /// CV from 0.3 to 0.6, or too little data to tell.
    Medium,
    /// CV above 0.6.
    High,
}

impl ConsistencyTier {
    /// Classify by the coefficient of variation of non-zero weekly values.
    pub fn from_weekly(weekly: &[f64]) -> Self {
        let played: Vec<f64> = weekly.iter().copied().filter(|&w| w > 0.0).collect();
        if played.len() < 3 {
            return ConsistencyTier::Medium;
        }
        let n = played.len() as f64;
        let mean = played.iter().sum::<f64>() / n;
        if mean <= 0.0 {
            return ConsistencyTier::Medium;
        }
        let variance = played.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / n;
        let cv = variance.sqrt() / mean;

        if cv < 0.3 {
            ConsistencyTier::Low
        } else if cv <= 0.6 {
            ConsistencyTier::Medium
        } else {
            ConsistencyTier::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConsistencyTier::Low => "LOW",
            ConsistencyTier::Medium => "MEDIUM",
            ConsistencyTier::High => "HIGH",
        }
    }

    pub fn multiplier(&self, m: &ConsistencyMultipliers) -> f64 {
        match self {
            ConsistencyTier::Low => m.low,
            ConsistencyTier::Medium => m.medium,
            ConsistencyTier::High => m.high,
        }
    }
}
