// League roster rules and the per-round ideal-position schedule.

use std::collections::HashMap;

use crate::config::{parse_position, ConfigError, LeagueConfig};

use super::pick::Position;

/// Priority positions for a single draft round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundPriority {
    pub primary: Position,
    pub secondary: Option<Position>,
}

/// Round -> ideal position schedule, consumed read-only by the roster and
/// the scoring engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftOrder {
    rounds: Vec<RoundPriority>,
}

impl DraftOrder {
    pub fn new(rounds: Vec<RoundPriority>) -> Self {
        DraftOrder { rounds }
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Priorities for a 1-indexed round, if the schedule covers it.
    pub fn round(&self, round: u8) -> Option<&RoundPriority> {
        if round == 0 {
            return None;
        }
        self.rounds.get(round as usize - 1)
    }

    /// The position a team should ideally fill in `round`. Rounds beyond the
    /// schedule default to FLEX.
    pub fn ideal_position(&self, round: u8) -> Position {
        self.round(round).map_or(Position::Flex, |r| r.primary)
    }

    /// Additive bonus for drafting `normalized` (a FLEX-normalized position)
    /// in `round`.
    pub fn bonus(&self, round: u8, normalized: Position, primary: f64, secondary: f64) -> f64 {
        match self.round(round) {
            Some(r) if r.primary == normalized => primary,
            Some(r) if r.secondary == Some(normalized) => secondary,
            _ => 0.0,
        }
    }
}

/// Roster limits shared by every team in a league.
#[derive(Debug, Clone)]
pub struct RosterRules {
    pub max_players: usize,
    /// Bucket -> cap. Includes the FLEX bucket.
    pub max_positions: HashMap<Position, usize>,
    pub flex_eligible: Vec<Position>,
    pub possible_bye_weeks: Vec<u8>,
    pub min_flex_coverage: usize,
    /// Weekly starters per slot.
    pub lineup: HashMap<Position, usize>,
    pub draft_order: DraftOrder,
}

impl RosterRules {
    /// Build rules from a validated league config.
    pub fn from_config(league: &LeagueConfig) -> Result<Self, ConfigError> {
        let mut max_positions = HashMap::new();
        for (name, &cap) in &league.max_positions {
            max_positions.insert(parse_position("league.max_positions", name)?, cap);
        }

        let mut lineup = HashMap::new();
        for (name, &count) in &league.lineup {
            lineup.insert(parse_position("league.lineup", name)?, count);
        }

        let flex_eligible = league
            .flex_eligible
            .iter()
            .map(|name| parse_position("league.flex_eligible", name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rounds = Vec::with_capacity(league.draft_order.len());
        for entry in &league.draft_order {
            rounds.push(RoundPriority {
                primary: parse_position("league.draft_order", &entry.primary)?,
                secondary: entry
                    .secondary
                    .as_deref()
                    .map(|s| parse_position("league.draft_order", s))
                    .transpose()?,
            });
        }

        Ok(RosterRules {
            max_players: league.max_players,
            max_positions,
            flex_eligible,
            possible_bye_weeks: league.possible_bye_weeks.clone(),
            min_flex_coverage: league.min_flex_coverage,
            lineup,
            draft_order: DraftOrder::new(rounds),
        })
    }

    /// Cap for a bucket, or None if the position is not part of this league.
    pub fn max_for(&self, pos: Position) -> Option<usize> {
        self.max_positions.get(&pos).copied()
    }

    pub fn is_flex_eligible(&self, pos: Position) -> bool {
        self.flex_eligible.contains(&pos)
    }

    /// Map FLEX-eligible positions onto FLEX, leaving the rest untouched.
    pub fn flex_normalized(&self, pos: Position) -> Position {
        if self.is_flex_eligible(pos) {
            Position::Flex
        } else {
            pos
        }
    }

    /// Total slots a player at `pos` could ever occupy: natural plus FLEX.
    pub fn total_capacity(&self, pos: Position) -> usize {
        let natural = self.max_for(pos).unwrap_or(0);
        if self.is_flex_eligible(pos) {
            natural + self.max_for(Position::Flex).unwrap_or(0)
        } else {
            natural
        }
    }

    pub fn starters(&self, pos: Position) -> usize {
        self.lineup.get(&pos).copied().unwrap_or(0)
    }

    /// Positions counted toward `min_flex_coverage`, whatever else the
    /// league makes FLEX-eligible.
    pub fn is_coverage_position(pos: Position) -> bool {
        matches!(pos, Position::RunningBack | Position::WideReceiver)
    }

    /// The default 10-team league: QB2 RB4 WR4 TE2 K1 DEF1 FLEX1, RB/WR FLEX.
    pub fn standard() -> Self {
        use Position::*;
        let max_positions = HashMap::from([
            (Quarterback, 2),
            (RunningBack, 4),
            (WideReceiver, 4),
            (TightEnd, 2),
            (Kicker, 1),
            (Defense, 1),
            (Flex, 1),
        ]);
        let lineup = HashMap::from([
            (Quarterback, 1),
            (RunningBack, 2),
            (WideReceiver, 2),
            (TightEnd, 1),
            (Flex, 1),
            (Kicker, 1),
            (Defense, 1),
        ]);
        let p = |primary, secondary| RoundPriority { primary, secondary };
        let rounds = vec![
            p(Flex, Some(Quarterback)),
            p(Flex, Some(Quarterback)),
            p(Flex, Some(Quarterback)),
            p(Flex, Some(Quarterback)),
            p(Quarterback, Some(Flex)),
            p(TightEnd, Some(Flex)),
            p(Flex, None),
            p(Quarterback, Some(Flex)),
            p(TightEnd, Some(Flex)),
            p(Flex, None),
            p(Flex, None),
            p(Kicker, None),
            p(Defense, None),
            p(Flex, None),
            p(Flex, None),
        ];
        RosterRules {
            max_players: 15,
            max_positions,
            flex_eligible: vec![RunningBack, WideReceiver],
            possible_bye_weeks: vec![5, 6, 7, 8, 9, 10, 11, 12, 14],
            min_flex_coverage: 4,
            lineup,
            draft_order: DraftOrder::new(rounds),
        }
    }
}
