// Simulation batches: one league per task, a parallel runner, the parameter
// search on top of it and the reduction of its results.

pub mod analyzer;
pub mod league;
pub mod optimizer;
pub mod runner;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::draft::roster::RosterError;
use crate::valuation::params::{ParameterError, ParameterSet};

/// One unit of work: a parameter set, a repetition number and its seed.
#[derive(Debug, Clone)]
pub struct SimulationTask {
    pub config_index: usize,
    pub repetition: usize,
    pub seed: u64,
    pub parameters: Arc<ParameterSet>,
}

/// How the evaluated team did over one drafted season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub user_team: usize,
    pub wins: u32,
    pub losses: u32,
    pub win_percentage: f64,
    pub total_points: f64,
    pub points_per_game: f64,
    pub consistency: f64,
    /// 1-based final standing.
    pub rank: usize,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid scoring parameters: {0}")]
    Parameters(#[from] ParameterError),

    #[error("player pool is empty")]
    EmptyPlayerPool,

    #[error("draft must have between 1 and 255 rounds, got {0}")]
    InvalidRounds(usize),

    #[error("invalid strategy mix: {0}")]
    InvalidStrategyMix(String),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
