// Bye-week and injury penalties.

use crate::config::ByeWeights;
use crate::draft::player::Player;
use crate::draft::roster::Roster;

use super::params::InjuryPenalties;

/// Penalty for stacking `player`'s bye week on top of rostered players who
/// share it.
///
/// Each conflicting starter costs `base × w`, each conflicting bench player
/// `base × w × bench_factor`, where `w` depends on whether the positions
/// match. Byes already behind `current_week` cost nothing.
pub fn bye_week_penalty(
    player: &Player,
    roster: &Roster,
    current_week: u8,
    base: f64,
    weights: &ByeWeights,
) -> f64 {
    let Some(bye) = player.bye_week else {
        return 0.0;
    };
    if bye < current_week {
        return 0.0;
    }

    let conflict = |other: &Player| -> f64 {
        if other.id == player.id || other.bye_week != Some(bye) {
            return 0.0;
        }
        if other.position == player.position {
            weights.same_position
        } else {
            weights.other_position
        }
    };

    let (starters, bench) = roster.starters_and_bench();
    let starter_weight: f64 = starters.iter().map(|p| conflict(p)).sum();
    let bench_weight: f64 = bench.iter().map(|p| conflict(p)).sum();

    base * (starter_weight + bench_weight * weights.bench_factor)
}

/// Flat penalty for the player's injury risk tier.
pub fn injury_penalty(player: &Player, penalties: &InjuryPenalties) -> f64 {
    penalties.for_risk(player.injury_risk())
}
