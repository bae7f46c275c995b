// The five drafting policies.

use std::sync::Arc;

use crate::draft::pick::Position;
use crate::draft::player::Player;
use crate::draft::roster::Roster;
use crate::valuation::{ScoringContext, ScoringEngine, ScoringMode};

use super::{sort_best_first, Candidate, DraftStrategy, StrategyKind};

/// Single-week ceiling that earns the aggressive upside bonus.
const CEILING_THRESHOLD: f64 = 25.0;
const CEILING_BONUS: f64 = 50.0;
/// Last round in which the aggressive skill-position bonus applies.
const EARLY_ROUNDS: u8 = 6;
const EARLY_SKILL_BONUS: f64 = 30.0;

const PRIMARY_NEED_BONUS: f64 = 100.0;
const OTHER_NEED_BONUS: f64 = 50.0;
const FILLED_POSITION_PENALTY: f64 = 50.0;

/// Score every draftable player with `f` and sort best-first.
fn rank_with<'a>(
    available: &'a [Player],
    roster: &Roster,
    mut f: impl FnMut(&Player) -> f64,
) -> Vec<Candidate<'a>> {
    let mut ranked: Vec<Candidate<'a>> = available
        .iter()
        .filter(|p| roster.can_draft(p))
        .map(|player| Candidate {
            player,
            score: f(player),
        })
        .collect();
    sort_best_first(&mut ranked);
    ranked
}

fn injury(engine: &ScoringEngine, player: &Player) -> f64 {
    engine.weights().injury.for_risk(player.injury_risk())
}

fn best_value_score(engine: &ScoringEngine, player: &Player, roster: &Roster) -> f64 {
    player.season_points() + roster.position_need(player.position) * 5.0 - injury(engine, player)
}

// ---------------------------------------------------------------------------
// Conservative
// ---------------------------------------------------------------------------

/// Raw projection with a doubled injury penalty and a mild need bonus.
pub struct Conservative {
    engine: Arc<ScoringEngine>,
}

impl Conservative {
    pub fn new(engine: Arc<ScoringEngine>) -> Self {
        Conservative { engine }
    }
}

impl DraftStrategy for Conservative {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Conservative
    }

    fn rank_candidates<'a>(
        &self,
        available: &'a [Player],
        roster: &Roster,
        _round: u8,
    ) -> Vec<Candidate<'a>> {
        rank_with(available, roster, |p| {
            p.season_points() - 2.0 * injury(&self.engine, p)
                + roster.position_need(p.position) * 10.0
        })
    }
}

// ---------------------------------------------------------------------------
// Aggressive
// ---------------------------------------------------------------------------

/// Chases ceiling: halved injury penalty, a bonus for big single weeks and
/// for skill positions early.
pub struct Aggressive {
    engine: Arc<ScoringEngine>,
}

impl Aggressive {
    pub fn new(engine: Arc<ScoringEngine>) -> Self {
        Aggressive { engine }
    }
}

impl DraftStrategy for Aggressive {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Aggressive
    }

    fn rank_candidates<'a>(
        &self,
        available: &'a [Player],
        roster: &Roster,
        round: u8,
    ) -> Vec<Candidate<'a>> {
        rank_with(available, roster, |p| {
            let mut score = p.season_points() - 0.5 * injury(&self.engine, p);
            if p.max_week_points() > CEILING_THRESHOLD {
                score += CEILING_BONUS;
            }
            let skill = matches!(
                p.position,
                Position::RunningBack | Position::WideReceiver | Position::Quarterback
            );
            if round <= EARLY_ROUNDS && skill {
                score += EARLY_SKILL_BONUS;
            }
            score
        })
    }
}

// ---------------------------------------------------------------------------
// Positional need
// ---------------------------------------------------------------------------

/// Fills the most-needed position first.
pub struct PositionalNeed {
    engine: Arc<ScoringEngine>,
}

impl PositionalNeed {
    pub fn new(engine: Arc<ScoringEngine>) -> Self {
        PositionalNeed { engine }
    }
}

impl DraftStrategy for PositionalNeed {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PositionalNeed
    }

    fn rank_candidates<'a>(
        &self,
        available: &'a [Player],
        roster: &Roster,
        _round: u8,
    ) -> Vec<Candidate<'a>> {
        let needed = roster.needed_positions();
        let Some(&primary) = needed.first() else {
            // Only FLEX left: take the best value
            return rank_with(available, roster, |p| best_value_score(&self.engine, p, roster));
        };

        rank_with(available, roster, |p| {
            let adjustment = if p.position == primary {
                PRIMARY_NEED_BONUS
            } else if needed.contains(&p.position) {
                OTHER_NEED_BONUS
            } else {
                -FILLED_POSITION_PENALTY
            };
            p.season_points() - injury(&self.engine, p) + adjustment
        })
    }
}

// ---------------------------------------------------------------------------
// Best value
// ---------------------------------------------------------------------------

/// Projection plus a small positional-need nudge.
pub struct BestValue {
    engine: Arc<ScoringEngine>,
}

impl BestValue {
    pub fn new(engine: Arc<ScoringEngine>) -> Self {
        BestValue { engine }
    }
}

impl DraftStrategy for BestValue {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BestValue
    }

    fn rank_candidates<'a>(
        &self,
        available: &'a [Player],
        roster: &Roster,
        _round: u8,
    ) -> Vec<Candidate<'a>> {
        rank_with(available, roster, |p| best_value_score(&self.engine, p, roster))
    }
}

// ---------------------------------------------------------------------------
// Helper driven
// ---------------------------------------------------------------------------

/// The full scoring pipeline, as the draft helper would recommend.
///
/// Penalties shrink as a position's open slots run out: a team with one RB
/// slot left cares less about that RB's bye week than a team with five.
pub struct HelperDriven {
    engine: Arc<ScoringEngine>,
}

impl HelperDriven {
    pub fn new(engine: Arc<ScoringEngine>) -> Self {
        HelperDriven { engine }
    }
}

impl DraftStrategy for HelperDriven {
    fn kind(&self) -> StrategyKind {
        StrategyKind::HelperDriven
    }

    fn rank_candidates<'a>(
        &self,
        available: &'a [Player],
        roster: &Roster,
        round: u8,
    ) -> Vec<Candidate<'a>> {
        let mode = ScoringMode::Draft { round };
        let max_points = ScoringEngine::max_points(
            available.iter().filter(|p| roster.can_draft(p)),
            mode,
        );
        let rules = roster.rules();

        rank_with(available, roster, |p| {
            let total = rules.total_capacity(p.position);
            let penalty_scale = if total > 0 {
                roster.remaining_capacity(p.position) as f64 / total as f64
            } else {
                0.0
            };
            let ctx = ScoringContext {
                mode,
                max_points,
                current_week: self.engine.current_week(),
                penalty_scale,
                apply_consistency: true,
            };
            self.engine.score(p, roster, &ctx)
        })
    }
}
