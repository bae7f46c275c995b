// Player records shared by the roster model, scoring and simulations.

use serde::{Deserialize, Serialize};

use super::pick::Position;

/// Number of regular-season weeks carried in each projection sequence.
pub const SEASON_WEEKS: usize = 17;

/// Who, if anyone, has drafted a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DraftStatus {
    #[default]
    Available,
    DraftedByOther,
    DraftedBySelf,
}

impl DraftStatus {
    /// Parse the numeric encoding used by player CSV files (0/1/2).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(DraftStatus::Available),
            1 => Some(DraftStatus::DraftedByOther),
            2 => Some(DraftStatus::DraftedBySelf),
            _ => None,
        }
    }
}

/// Injury risk tier derived from a player's reported status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InjuryRisk {
    Low,
    Medium,
    High,
}

impl InjuryRisk {
    /// Map a reported injury status onto a risk tier.
    ///
    /// ACTIVE (or blank) is low risk, QUESTIONABLE is medium, and statuses
    /// that keep a player off the field are high. Anything unrecognized is
    /// treated as medium.
    pub fn from_status(status: &str) -> Self {
        match status.trim().to_uppercase().as_str() {
            "" | "ACTIVE" => InjuryRisk::Low,
            "QUESTIONABLE" => InjuryRisk::Medium,
            "OUT" | "DOUBTFUL" | "INJURY_RESERVE" | "SUSPENSION" | "UNKNOWN" => InjuryRisk::High,
            _ => InjuryRisk::Medium,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InjuryRisk::Low => "LOW",
            InjuryRisk::Medium => "MEDIUM",
            InjuryRisk::High => "HIGH",
        }
    }
}

/// A draftable player and their season projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub team: String,
    /// Week the player's NFL team is idle. None if unknown.
    pub bye_week: Option<u8>,
    pub injury_status: String,
    /// Projected fantasy points for weeks 1..=17 (index 0 is week 1).
    pub weekly_projections: Vec<f64>,
    /// Average draft position. None if unranked.
    pub adp: Option<f64>,
    /// Positional rating on a 0-100 scale.
    pub rating: Option<f64>,
    pub team_offensive_rank: Option<u32>,
    pub team_defensive_rank: Option<u32>,
    /// Opponent matchup quality for the current week (1-100, higher is easier).
    pub matchup_rating: Option<f64>,
    pub status: DraftStatus,
    pub locked: bool,
}

impl Player {
    /// Build an available player with a projection sequence and no optional
    /// market data. Mostly useful for fixtures and synthetic pools.
    pub fn new(id: &str, name: &str, position: Position, weekly_projections: Vec<f64>) -> Self {
        Player {
            id: id.to_string(),
            name: name.to_string(),
            position,
            team: String::new(),
            bye_week: None,
            injury_status: "ACTIVE".to_string(),
            weekly_projections,
            adp: None,
            rating: None,
            team_offensive_rank: None,
            team_defensive_rank: None,
            matchup_rating: None,
            status: DraftStatus::Available,
            locked: false,
        }
    }

    /// Total projected points across the season.
    pub fn season_points(&self) -> f64 {
        self.weekly_projections.iter().sum()
    }

    /// Projected points for a 1-indexed week. Weeks outside the projection
    /// sequence score zero.
    pub fn week_points(&self, week: u8) -> f64 {
        if week == 0 {
            return 0.0;
        }
        self.weekly_projections
            .get(week as usize - 1)
            .copied()
            .unwrap_or(0.0)
    }

    /// Best single-week projection (the player's ceiling).
    pub fn max_week_points(&self) -> f64 {
        self.weekly_projections
            .iter()
            .copied()
            .fold(0.0, f64::max)
    }

    pub fn injury_risk(&self) -> InjuryRisk {
        InjuryRisk::from_status(&self.injury_status)
    }

    pub fn is_available(&self) -> bool {
        self.status == DraftStatus::Available
    }
}

/// Mark every player in a pool as available again so the same pool can back
/// another batch of simulations.
pub fn reset_pool(players: &mut [Player]) {
    for p in players.iter_mut() {
        p.status = DraftStatus::Available;
    }
}
