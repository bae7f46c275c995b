// Positions and individual pick representation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::strategy::StrategyKind;

/// Football positions, plus the FLEX meta-slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Kicker,
    Defense,
    Flex,
}

impl Position {
    /// Every concrete playing position (FLEX excluded), in display order.
    pub const PLAYING: [Position; 6] = [
        Position::Quarterback,
        Position::RunningBack,
        Position::WideReceiver,
        Position::TightEnd,
        Position::Kicker,
        Position::Defense,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Team defenses show up as "DEF", "DST" or "D/ST" depending on the source.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" => Some(Position::Kicker),
            "DEF" | "DST" | "D/ST" => Some(Position::Defense),
            "FLEX" => Some(Position::Flex),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DEF",
            Position::Flex => "FLEX",
        }
    }

    /// Whether this position uses the team's offensive rank for quality
    /// adjustments (everything except team defenses).
    pub fn is_skill(&self) -> bool {
        !matches!(self, Position::Defense | Position::Flex)
    }

    /// Deterministic ordering index for roster display and tie-breaking.
    pub fn sort_order(&self) -> u8 {
        match self {
            Position::Quarterback => 0,
            Position::RunningBack => 1,
            Position::WideReceiver => 2,
            Position::TightEnd => 3,
            Position::Flex => 4,
            Position::Kicker => 5,
            Position::Defense => 6,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A single pick made during a simulated draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftPickEvent {
    /// Draft round (1-indexed).
    pub round: u8,
    /// Overall draft slot (1-indexed). Skipped turns still use up their number.
    pub pick_number: u32,
    /// Index of the picking team in the draft's team list.
    pub team_index: usize,
    pub player_id: String,
    pub player_name: String,
    pub position: Position,
    /// Strategy the team used to rank its candidates.
    pub strategy: StrategyKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_pos_standard_positions() {
        assert_eq!(Position::from_str_pos("QB"), Some(Position::Quarterback));
        assert_eq!(Position::from_str_pos("RB"), Some(Position::RunningBack));
        assert_eq!(Position::from_str_pos("WR"), Some(Position::WideReceiver));
        assert_eq!(Position::from_str_pos("TE"), Some(Position::TightEnd));
        assert_eq!(Position::from_str_pos("K"), Some(Position::Kicker));
        assert_eq!(Position::from_str_pos("FLEX"), Some(Position::Flex));
    }

    #[test]
    fn from_str_pos_defense_aliases() {
        assert_eq!(Position::from_str_pos("DEF"), Some(Position::Defense));
        assert_eq!(Position::from_str_pos("DST"), Some(Position::Defense));
        assert_eq!(Position::from_str_pos("D/ST"), Some(Position::Defense));
    }

    #[test]
    fn from_str_pos_case_insensitive_and_trimmed() {
        assert_eq!(Position::from_str_pos(" wr "), Some(Position::WideReceiver));
        assert_eq!(Position::from_str_pos("qb"), Some(Position::Quarterback));
    }

    #[test]
    fn from_str_pos_unknown() {
        assert_eq!(Position::from_str_pos("SP"), None);
        assert_eq!(Position::from_str_pos(""), None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for pos in Position::PLAYING.iter().chain(std::iter::once(&Position::Flex)) {
            assert_eq!(Position::from_str_pos(pos.display_str()), Some(*pos));
            assert_eq!(format!("{pos}"), pos.display_str());
        }
    }

    #[test]
    fn defense_is_not_skill_position() {
        assert!(Position::Quarterback.is_skill());
        assert!(Position::Kicker.is_skill());
        assert!(!Position::Defense.is_skill());
    }
}
