// Draft state: snake order, shared pool and the pick loop.

use rand::Rng;
use tracing::{debug, warn};

use crate::config::SimulationConfig;
use crate::strategy::{DraftStrategy, StrategyKind};

use super::pick::DraftPickEvent;
use super::player::Player;
use super::roster::Roster;

/// One team in a simulated draft.
pub struct TeamState {
    pub name: String,
    pub strategy: Box<dyn DraftStrategy>,
    pub roster: Roster,
}

impl TeamState {
    pub fn new(name: impl Into<String>, strategy: Box<dyn DraftStrategy>, roster: Roster) -> Self {
        TeamState {
            name: name.into(),
            strategy,
            roster,
        }
    }
}

/// Knobs for a single draft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DraftSettings {
    pub rounds: u8,
    /// Probability a pick is made at random from the top candidates.
    pub human_error_rate: f64,
    /// How many top candidates a human-error pick chooses among.
    pub suboptimal_choice_pool: usize,
}

impl DraftSettings {
    pub fn from_config(sim: &SimulationConfig, rounds: u8) -> Self {
        DraftSettings {
            rounds,
            human_error_rate: sim.human_error_rate,
            suboptimal_choice_pool: sim.suboptimal_choice_pool,
        }
    }
}

/// Everything a finished draft produced.
#[derive(Debug, Clone)]
pub struct DraftOutcome {
    pub history: Vec<DraftPickEvent>,
    pub team_names: Vec<String>,
    pub rosters: Vec<Roster>,
    pub strategies: Vec<StrategyKind>,
    /// Index of the team under evaluation.
    pub user_team: usize,
    /// Players nobody took.
    pub remaining: Vec<Player>,
    /// Turns on which the team had no legal candidate.
    pub skipped_picks: usize,
}

/// Team indices in pick order for a 1-indexed round: forward on odd rounds,
/// reversed on even rounds.
pub fn snake_order(num_teams: usize, round: u8) -> Vec<usize> {
    if round % 2 == 1 {
        (0..num_teams).collect()
    } else {
        (0..num_teams).rev().collect()
    }
}

/// The complete state of a simulated snake draft.
pub struct DraftState {
    teams: Vec<TeamState>,
    available: Vec<Player>,
    settings: DraftSettings,
    user_team: usize,
    history: Vec<DraftPickEvent>,
    skipped_picks: usize,
}

impl DraftState {
    /// Create a new draft.
    ///
    /// # Arguments
    /// - `teams`: teams in round-1 pick order
    /// - `pool`: the shared available player pool
    /// - `settings`: round count and human-error knobs
    /// - `user_team`: index into `teams` of the team under evaluation
    pub fn new(
        teams: Vec<TeamState>,
        pool: Vec<Player>,
        settings: DraftSettings,
        user_team: usize,
    ) -> Self {
        DraftState {
            teams,
            available: pool,
            settings,
            user_team,
            history: Vec::new(),
            skipped_picks: 0,
        }
    }

    pub fn available(&self) -> &[Player] {
        &self.available
    }

    pub fn history(&self) -> &[DraftPickEvent] {
        &self.history
    }

    /// Play every round to completion. Deterministic for a given RNG state.
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> DraftOutcome {
        let num_teams = self.teams.len();
        for round in 1..=self.settings.rounds {
            let order = snake_order(num_teams, round);
            for (position_in_round, team_idx) in order.into_iter().enumerate() {
                // Skipped turns still consume their slot number
                let pick_number =
                    (u32::from(round) - 1) * num_teams as u32 + position_in_round as u32 + 1;
                self.make_pick(team_idx, round, pick_number, rng);
            }
        }

        debug!(
            "draft complete: {} picks, {} skipped, {} players left",
            self.history.len(),
            self.skipped_picks,
            self.available.len()
        );

        let mut team_names = Vec::with_capacity(num_teams);
        let mut rosters = Vec::with_capacity(num_teams);
        let mut strategies = Vec::with_capacity(num_teams);
        for team in self.teams {
            strategies.push(team.strategy.kind());
            team_names.push(team.name);
            rosters.push(team.roster);
        }

        DraftOutcome {
            history: self.history,
            team_names,
            rosters,
            strategies,
            user_team: self.user_team,
            remaining: self.available,
            skipped_picks: self.skipped_picks,
        }
    }

    /// One team's turn. A team with no legal candidate skips the turn.
    fn make_pick<R: Rng + ?Sized>(
        &mut self,
        team_idx: usize,
        round: u8,
        pick_number: u32,
        rng: &mut R,
    ) {
        let team = &self.teams[team_idx];
        let chosen_id = {
            let ranked = team
                .strategy
                .rank_candidates(&self.available, &team.roster, round);
            if ranked.is_empty() {
                debug!("{} has no legal pick in round {}", team.name, round);
                self.skipped_picks += 1;
                return;
            }

            let idx = if rng.gen::<f64>() < self.settings.human_error_rate {
                let k = self.settings.suboptimal_choice_pool.clamp(1, ranked.len());
                rng.gen_range(0..k)
            } else {
                0
            };
            ranked[idx].player.id.clone()
        };

        let Some(pool_idx) = self.available.iter().position(|p| p.id == chosen_id) else {
            warn!("{} picked {} who is not in the pool", team.name, chosen_id);
            self.skipped_picks += 1;
            return;
        };
        let player = self.available.remove(pool_idx);

        let team = &mut self.teams[team_idx];
        if !team.roster.draft_player(&player) {
            warn!("{} could not roster {}; returning to pool", team.name, player.name);
            self.available.insert(pool_idx, player);
            self.skipped_picks += 1;
            return;
        }

        self.history.push(DraftPickEvent {
            round,
            pick_number,
            team_index: team_idx,
            player_id: player.id,
            player_name: player.name,
            position: player.position,
            strategy: team.strategy.kind(),
        });
    }
}
