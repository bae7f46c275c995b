// One simulated league: shuffled strategy mix, snake draft, regular season.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::{Config, ScoringOptions};
use crate::draft::player::{reset_pool, Player};
use crate::draft::roster::Roster;
use crate::draft::rules::RosterRules;
use crate::draft::state::{DraftSettings, DraftState, TeamState};
use crate::season::SeasonSimulator;
use crate::strategy::StrategyKind;
use crate::valuation::ScoringEngine;

use super::{SimulationError, SimulationOutcome, SimulationTask};

/// Everything that stays fixed across the tasks of a batch.
///
/// Construction rejects inputs that would make every task fail, so a batch
/// either starts with a usable league or not at all.
#[derive(Debug, Clone)]
pub struct LeagueSimulation {
    rules: Arc<RosterRules>,
    players: Vec<Player>,
    strategy_mix: Vec<StrategyKind>,
    settings: DraftSettings,
    scoring: ScoringOptions,
    season_weeks: u8,
    current_week: u8,
}

impl LeagueSimulation {
    pub fn new(
        rules: Arc<RosterRules>,
        players: Vec<Player>,
        strategy_mix: Vec<StrategyKind>,
        settings: DraftSettings,
        scoring: ScoringOptions,
        season_weeks: u8,
    ) -> Result<Self, SimulationError> {
        if players.is_empty() {
            return Err(SimulationError::EmptyPlayerPool);
        }
        if settings.rounds == 0 {
            return Err(SimulationError::InvalidRounds(0));
        }
        if strategy_mix.len() < 2 {
            return Err(SimulationError::InvalidStrategyMix(format!(
                "need at least 2 teams, got {}",
                strategy_mix.len()
            )));
        }
        if !strategy_mix.contains(&StrategyKind::HelperDriven) {
            return Err(SimulationError::InvalidStrategyMix(
                "no helper_driven team to evaluate".into(),
            ));
        }

        Ok(LeagueSimulation {
            rules,
            players,
            strategy_mix,
            settings,
            scoring,
            season_weeks,
            current_week: 1,
        })
    }

    /// Build from a loaded config. The mix must account for every team.
    pub fn from_config(config: &Config, players: Vec<Player>) -> Result<Self, SimulationError> {
        let rules = Arc::new(RosterRules::from_config(&config.league)?);

        let rounds = u8::try_from(config.league.max_players)
            .map_err(|_| SimulationError::InvalidRounds(config.league.max_players))?;
        if rounds == 0 {
            return Err(SimulationError::InvalidRounds(0));
        }

        let mut mix = Vec::with_capacity(config.league.num_teams);
        for (name, &count) in &config.strategy_mix {
            let kind = StrategyKind::from_name(name).ok_or_else(|| {
                SimulationError::InvalidStrategyMix(format!("unknown strategy `{name}`"))
            })?;
            mix.extend(std::iter::repeat(kind).take(count));
        }
        if mix.len() != config.league.num_teams {
            return Err(SimulationError::InvalidStrategyMix(format!(
                "{} strategies for {} teams",
                mix.len(),
                config.league.num_teams
            )));
        }

        let settings = DraftSettings::from_config(&config.simulation, rounds);
        Ok(Self::new(
            rules,
            players,
            mix,
            settings,
            config.scoring.clone(),
            config.simulation.season_weeks,
        )?
        .with_current_week(config.simulation.current_week))
    }

    pub fn with_current_week(mut self, week: u8) -> Self {
        self.current_week = week;
        self
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn rules(&self) -> &Arc<RosterRules> {
        &self.rules
    }

    pub fn strategy_mix(&self) -> &[StrategyKind] {
        &self.strategy_mix
    }

    /// Draft and play one season with the task's parameters. The result is
    /// a pure function of the task.
    pub fn simulate(&self, task: &SimulationTask) -> Result<SimulationOutcome, SimulationError> {
        let mut rng = ChaCha8Rng::seed_from_u64(task.seed);
        let engine = Arc::new(
            ScoringEngine::new(Arc::clone(&task.parameters), self.scoring.clone())?
                .with_current_week(self.current_week),
        );

        let mut mix = self.strategy_mix.clone();
        mix.shuffle(&mut rng);
        let user_team = mix
            .iter()
            .position(|k| *k == StrategyKind::HelperDriven)
            .ok_or_else(|| SimulationError::InvalidStrategyMix("no helper_driven team".into()))?;

        let teams = mix
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                TeamState::new(
                    format!("Team {} ({})", i + 1, kind),
                    kind.build(Arc::clone(&engine)),
                    Roster::new(Arc::clone(&self.rules)),
                )
            })
            .collect();

        let mut pool = self.players.clone();
        reset_pool(&mut pool);

        let draft = DraftState::new(teams, pool, self.settings, user_team).run(&mut rng);
        for roster in &draft.rosters {
            roster.integrity_check()?;
        }

        let season =
            SeasonSimulator::new(&draft.rosters, &self.rules, self.season_weeks).simulate(&mut rng);
        let record = &season.teams[user_team];
        let rank = season.rank_of(user_team).unwrap_or(mix.len());

        debug!(
            "task {}/{}: user team {} went {}-{} ({:.1} pts), rank {}",
            task.config_index,
            task.repetition,
            user_team,
            record.wins,
            record.losses,
            record.total_points,
            rank
        );

        Ok(SimulationOutcome {
            user_team,
            wins: record.wins,
            losses: record.losses,
            win_percentage: record.win_percentage(),
            total_points: record.total_points,
            points_per_game: record.points_per_game(),
            consistency: record.consistency(),
            rank,
        })
    }
}
