// Valuation engine: parameter sets, tier curves, penalties and the scoring pipeline.

pub mod params;
pub mod penalties;
pub mod projections;
pub mod tiers;

use std::sync::Arc;

use serde::Serialize;

use crate::config::ScoringOptions;
use crate::draft::player::Player;
use crate::draft::roster::Roster;

use params::{ParameterError, ParameterSet, ScoringWeights};
use tiers::{higher_is_better, lower_is_better, ConsistencyTier, MatchupTier};

// ---------------------------------------------------------------------------
// Scoring context
// ---------------------------------------------------------------------------

/// What a score is being computed for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoringMode {
    /// Draft pick in a 1-indexed round. Enables the draft-order bonus.
    Draft { round: u8 },
    /// Trade evaluation. Optionally ignores injury risk of players already
    /// on the roster.
    Trade { suppress_rostered_injury: bool },
    /// Start/sit for a single week. Uses weekly points and matchup quality.
    Weekly { week: u8 },
}

/// Per-call inputs to the scoring pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringContext {
    pub mode: ScoringMode,
    /// Largest projection among the eligible candidates, used to normalize.
    pub max_points: f64,
    pub current_week: u8,
    /// Scale applied to the bye-week and injury penalties.
    pub penalty_scale: f64,
    pub apply_consistency: bool,
}

impl ScoringContext {
    pub fn draft(round: u8, max_points: f64) -> Self {
        ScoringContext {
            mode: ScoringMode::Draft { round },
            max_points,
            current_week: 1,
            penalty_scale: 1.0,
            apply_consistency: false,
        }
    }

    pub fn trade(max_points: f64, suppress_rostered_injury: bool) -> Self {
        ScoringContext {
            mode: ScoringMode::Trade {
                suppress_rostered_injury,
            },
            ..Self::draft(0, max_points)
        }
    }

    pub fn weekly(week: u8, max_points: f64) -> Self {
        ScoringContext {
            mode: ScoringMode::Weekly { week },
            current_week: week,
            ..Self::draft(0, max_points)
        }
    }
}

/// Every stage of one score, for inspection and reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub adp_multiplier: f64,
    pub rating_multiplier: f64,
    pub team_multiplier: f64,
    pub matchup_multiplier: f64,
    pub consistency_multiplier: f64,
    /// Product of the stage multipliers after clamping.
    pub total_multiplier: f64,
    pub adjusted: f64,
    pub draft_order_bonus: f64,
    pub bye_penalty: f64,
    pub injury_penalty: f64,
    pub total: f64,
}

// ---------------------------------------------------------------------------
// Scoring engine
// ---------------------------------------------------------------------------

/// Deterministic candidate scoring for one parameter set.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    params: Arc<ParameterSet>,
    weights: ScoringWeights,
    options: ScoringOptions,
    current_week: u8,
}

impl ScoringEngine {
    /// Resolve `params` once. Fails if any required key is absent.
    pub fn new(params: Arc<ParameterSet>, options: ScoringOptions) -> Result<Self, ParameterError> {
        let weights = ScoringWeights::from_params(&params)?;
        Ok(ScoringEngine {
            params,
            weights,
            options,
            current_week: 1,
        })
    }

    /// Week the league is in. Byes before it no longer cost anything.
    pub fn with_current_week(mut self, week: u8) -> Self {
        self.current_week = week;
        self
    }

    pub fn current_week(&self) -> u8 {
        self.current_week
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn options(&self) -> &ScoringOptions {
        &self.options
    }

    /// Projection the pipeline normalizes for a given mode.
    pub fn points(player: &Player, mode: ScoringMode) -> f64 {
        match mode {
            ScoringMode::Weekly { week } => player.week_points(week),
            _ => player.season_points(),
        }
    }

    /// Normalization ceiling over a candidate set.
    pub fn max_points<'a>(candidates: impl IntoIterator<Item = &'a Player>, mode: ScoringMode) -> f64 {
        candidates
            .into_iter()
            .map(|p| Self::points(p, mode))
            .fold(0.0, f64::max)
    }

    pub fn score(&self, player: &Player, roster: &Roster, ctx: &ScoringContext) -> f64 {
        self.score_breakdown(player, roster, ctx).total
    }

    /// Run the full pipeline:
    /// 1. Normalize projected points onto 0..NORMALIZATION_MAX_SCALE
    /// 2-4. ADP, rating and team-quality multipliers (plus matchup in weekly
    ///      mode and consistency when enabled), clamped as a product
    /// 5. Draft-order bonus (draft mode only)
    /// 6. Bye-week penalty
    /// 7. Injury penalty
    pub fn score_breakdown(&self, player: &Player, roster: &Roster, ctx: &ScoringContext) -> ScoreBreakdown {
        let w = &self.weights;
        let o = &self.options;

        let points = Self::points(player, ctx.mode);
        let base = if ctx.max_points > 0.0 {
            points / ctx.max_points * w.normalization_max_scale
        } else {
            0.0
        };

        let adp_multiplier = player
            .adp
            .map_or(1.0, |adp| lower_is_better(adp, &o.adp, &w.adp));
        let rating_multiplier = player.rating.map_or(1.0, |rating| {
            higher_is_better(rating, &o.rating, &w.rating).min(o.rating_max_boost)
        });
        let team_rank = if player.position.is_skill() {
            player.team_offensive_rank
        } else {
            player.team_defensive_rank
        };
        let team_multiplier =
            team_rank.map_or(1.0, |rank| lower_is_better(f64::from(rank), &o.team, &w.team));
        let matchup_multiplier = match (ctx.mode, player.matchup_rating) {
            (ScoringMode::Weekly { .. }, Some(rating)) => {
                MatchupTier::from_rating(rating, &o.matchup).multiplier(&w.matchup)
            }
            _ => 1.0,
        };
        let consistency_multiplier = if ctx.apply_consistency {
            ConsistencyTier::from_weekly(&player.weekly_projections).multiplier(&w.consistency)
        } else {
            1.0
        };

        let total_multiplier = (adp_multiplier
            * rating_multiplier
            * team_multiplier
            * matchup_multiplier
            * consistency_multiplier)
            .max(o.min_multiplier)
            .min(o.max_multiplier);
        let adjusted = base * total_multiplier;

        let rules = roster.rules();
        let draft_order_bonus = match ctx.mode {
            ScoringMode::Draft { round } => rules.draft_order.bonus(
                round,
                rules.flex_normalized(player.position),
                w.draft_order_primary_bonus,
                w.draft_order_secondary_bonus,
            ),
            _ => 0.0,
        };

        let bye_penalty = penalties::bye_week_penalty(
            player,
            roster,
            ctx.current_week,
            w.base_bye_penalty,
            &o.bye,
        ) * ctx.penalty_scale;

        let injury_penalty = match ctx.mode {
            ScoringMode::Trade {
                suppress_rostered_injury: true,
            } if roster.contains(&player.id) => 0.0,
            _ => penalties::injury_penalty(player, &w.injury) * ctx.penalty_scale,
        };

        ScoreBreakdown {
            base,
            adp_multiplier,
            rating_multiplier,
            team_multiplier,
            matchup_multiplier,
            consistency_multiplier,
            total_multiplier,
            adjusted,
            draft_order_bonus,
            bye_penalty,
            injury_penalty,
            total: adjusted + draft_order_bonus - bye_penalty - injury_penalty,
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
