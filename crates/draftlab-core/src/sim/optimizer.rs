// Two-phase parameter search: a coarse grid, then a longer retest of the best.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, OptimizerConfig};
use crate::valuation::params::{ParameterError, ParameterSet};

use super::analyzer::{summarize, ConfigurationResult};
use super::runner::{seed_for, ParallelRunner, RunSummary, RunnerError};
use super::{SimulationError, SimulationOutcome, SimulationTask};

/// Decimal places kept for derived parameter values, so offset arithmetic
/// never produces near-duplicate keys.
const VALUE_PRECISION: f64 = 1e6;

/// Salt separating the full phase's seeds from the preliminary phase's.
const FULL_PHASE_SALT: u64 = 0x5EED_0000_0000_0001;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("search space produced no valid parameter combinations")]
    NoValidCombinations,

    #[error("every simulation in the preliminary phase failed")]
    NoSuccessfulRuns,

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

fn round_value(v: f64) -> f64 {
    (v * VALUE_PRECISION).round() / VALUE_PRECISION
}

// ---------------------------------------------------------------------------
// Search space
// ---------------------------------------------------------------------------

/// The parameter grid and the fine-grain neighborhood around it.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    pub baseline: ParameterSet,
    /// Parameter -> candidate values for the coarse grid.
    pub values: BTreeMap<String, Vec<f64>>,
    /// Parameter -> offsets tried around an advancing value.
    pub offsets: BTreeMap<String, Vec<f64>>,
    /// Parameter -> inclusive (lo, hi) clip range.
    pub bounds: BTreeMap<String, (f64, f64)>,
}

impl SearchSpace {
    pub fn new(baseline: ParameterSet) -> Self {
        SearchSpace {
            baseline,
            values: BTreeMap::new(),
            offsets: BTreeMap::new(),
            bounds: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        SearchSpace {
            baseline: config.parameters.clone(),
            values: config.search.values.clone(),
            offsets: config.search.offsets.clone(),
            bounds: config.search.bounds.clone(),
        }
    }

    /// Number of grid points before validation.
    pub fn combination_count(&self) -> usize {
        self.values.values().map(Vec::len).product()
    }

    /// Cartesian product of `values` over the baseline. Combinations that
    /// fail validation are dropped.
    pub fn expand(&self) -> Result<Vec<ParameterSet>, OptimizerError> {
        let mut grid: Vec<Vec<(&str, f64)>> = vec![Vec::new()];
        for (name, candidates) in &self.values {
            grid = grid
                .into_iter()
                .flat_map(|prefix| {
                    candidates.iter().map(move |&v| {
                        let mut next = prefix.clone();
                        next.push((name.as_str(), v));
                        next
                    })
                })
                .collect();
        }

        let mut combinations = Vec::with_capacity(grid.len());
        for assignment in grid {
            match self.apply(&self.baseline, &assignment) {
                Ok(set) => combinations.push(set),
                Err(e) => warn!("skipping parameter combination {:?}: {}", assignment, e),
            }
        }

        if combinations.is_empty() {
            return Err(OptimizerError::NoValidCombinations);
        }
        Ok(combinations)
    }

    /// The base set plus one variation per (parameter, offset), clipped to
    /// bounds and deduplicated.
    pub fn neighborhood(&self, base: &ParameterSet) -> Vec<ParameterSet> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        seen.insert(base.config_key());
        out.push(base.clone());

        for (name, offsets) in &self.offsets {
            let current = match base.get(name) {
                Ok(v) => v,
                Err(e) => {
                    warn!("cannot vary `{}`: {}", name, e);
                    continue;
                }
            };
            for offset in offsets {
                let value = self.clip(name, round_value(current + offset));
                match base.with_value(name, value) {
                    Ok(set) => {
                        if seen.insert(set.config_key()) {
                            out.push(set);
                        }
                    }
                    Err(e) => warn!("skipping variation {}={}: {}", name, value, e),
                }
            }
        }
        out
    }

    fn clip(&self, name: &str, value: f64) -> f64 {
        match self.bounds.get(name) {
            Some(&(lo, hi)) => value.clamp(lo, hi),
            None => value,
        }
    }

    fn apply(&self, base: &ParameterSet, assignment: &[(&str, f64)]) -> Result<ParameterSet, ParameterError> {
        let mut set = base.clone();
        for &(name, value) in assignment {
            set = set.with_value(name, value)?;
        }
        Ok(set)
    }
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

/// Everything the search learned.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    /// Ranked, best first.
    pub preliminary: Vec<ConfigurationResult>,
    /// Ranked, best first.
    pub full: Vec<ConfigurationResult>,
    pub optimal: Option<ConfigurationResult>,
    pub total_simulations: usize,
    pub failed_tasks: usize,
}

impl OptimizationResult {
    /// The result set later analysis should use: the full phase when it
    /// produced anything, else the preliminary phase.
    pub fn final_results(&self) -> &[ConfigurationResult] {
        if self.full.is_empty() {
            &self.preliminary
        } else {
            &self.full
        }
    }
}

pub struct ConfigOptimizer {
    runner: ParallelRunner,
    settings: OptimizerConfig,
    base_seed: u64,
}

impl ConfigOptimizer {
    pub fn new(runner: ParallelRunner, settings: OptimizerConfig, base_seed: u64) -> Self {
        ConfigOptimizer {
            runner,
            settings,
            base_seed,
        }
    }

    /// How many preliminary configurations advance to the full phase.
    pub fn top_count(&self, n: usize) -> usize {
        let by_share = (self.settings.top_configs_percentage * n as f64).ceil() as usize;
        by_share.max(self.settings.min_top_configs).min(n)
    }

    pub fn run<F>(&self, space: &SearchSpace, simulate: F) -> Result<OptimizationResult, OptimizerError>
    where
        F: Fn(&SimulationTask) -> Result<SimulationOutcome, SimulationError> + Sync,
    {
        let combinations = space.expand()?;
        info!(
            "preliminary phase: {} combinations x {} simulations",
            combinations.len(),
            self.settings.preliminary_simulations
        );
        let prelim_summary = self.run_phase(
            &combinations,
            self.settings.preliminary_simulations,
            self.base_seed,
            &simulate,
        )?;
        let preliminary = summarize(&prelim_summary);
        if preliminary.is_empty() {
            return Err(OptimizerError::NoSuccessfulRuns);
        }

        let top_n = self.top_count(preliminary.len());
        let advancing: Vec<ParameterSet> = preliminary
            .iter()
            .take(top_n)
            .map(|r| r.parameters.clone())
            .collect();

        let candidates = if self.settings.fine_grain {
            let mut seen = HashSet::new();
            advancing
                .iter()
                .flat_map(|base| space.neighborhood(base))
                .filter(|set| seen.insert(set.config_key()))
                .collect()
        } else {
            advancing
        };

        info!(
            "full phase: {} of {} configurations advance, {} to test{}",
            top_n,
            preliminary.len(),
            candidates.len(),
            if self.settings.fine_grain {
                " after fine-grain expansion"
            } else {
                ""
            }
        );
        let full_summary = self.run_phase(
            &candidates,
            self.settings.full_simulations,
            self.base_seed ^ FULL_PHASE_SALT,
            &simulate,
        )?;
        let full = summarize(&full_summary);

        let optimal = full.first().or_else(|| preliminary.first()).cloned();
        if let Some(best) = &optimal {
            info!(
                "optimal configuration: {:.3} win pct, {:.1} pts over {} simulations",
                best.mean_win_percentage, best.mean_total_points, best.simulations
            );
        }

        Ok(OptimizationResult {
            preliminary,
            full,
            optimal,
            total_simulations: prelim_summary.completed + full_summary.completed,
            failed_tasks: prelim_summary.failed + full_summary.failed,
        })
    }

    fn run_phase<F>(
        &self,
        configs: &[ParameterSet],
        repetitions: usize,
        seed: u64,
        simulate: &F,
    ) -> Result<RunSummary, OptimizerError>
    where
        F: Fn(&SimulationTask) -> Result<SimulationOutcome, SimulationError> + Sync,
    {
        let mut tasks = Vec::with_capacity(configs.len() * repetitions);
        for (config_index, params) in configs.iter().enumerate() {
            let params = Arc::new(params.clone());
            for repetition in 0..repetitions {
                tasks.push(SimulationTask {
                    config_index,
                    repetition,
                    seed: seed_for(seed, repetition),
                    parameters: Arc::clone(&params),
                });
            }
        }
        Ok(self.runner.run(&tasks, simulate)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::params::baseline_map;

    fn baseline() -> ParameterSet {
        ParameterSet::from_map(baseline_map()).unwrap()
    }

    fn settings(fine_grain: bool) -> OptimizerConfig {
        OptimizerConfig {
            preliminary_simulations: 3,
            full_simulations: 4,
            top_configs_percentage: 0.25,
            min_top_configs: 1,
            fine_grain,
        }
    }

    /// Win rate rises with the normalization scale, so the search should
    /// settle on the largest one it sees.
    fn by_scale(task: &SimulationTask) -> Result<SimulationOutcome, SimulationError> {
        let scale = task.parameters.get("NORMALIZATION_MAX_SCALE")?;
        let win_percentage = (scale / 200.0).min(1.0);
        Ok(SimulationOutcome {
            user_team: 0,
            wins: (win_percentage * 17.0).round() as u32,
            losses: 17 - (win_percentage * 17.0).round() as u32,
            win_percentage,
            total_points: scale * 10.0,
            points_per_game: scale * 10.0 / 17.0,
            consistency: 5.0,
            rank: 1,
        })
    }

    #[test]
    fn expansion_is_cartesian() {
        let mut space = SearchSpace::new(baseline());
        space.values.insert("NORMALIZATION_MAX_SCALE".into(), vec![90.0, 110.0]);
        space.values.insert("BASE_BYE_PENALTY".into(), vec![10.0, 30.0]);
        space.values.insert("INJURY_PENALTIES_HIGH".into(), vec![50.0, 100.0]);
        let combos = space.expand().unwrap();
        assert_eq!(combos.len(), 8);
        let keys: HashSet<String> = combos.iter().map(ParameterSet::config_key).collect();
        assert_eq!(keys.len(), 8);
        // Untouched parameters keep their baseline value
        for set in &combos {
            assert_eq!(
                set.get("ADP_EXCELLENT_MULTIPLIER").unwrap(),
                baseline().get("ADP_EXCELLENT_MULTIPLIER").unwrap()
            );
        }
    }

    #[test]
    fn empty_grid_is_the_baseline() {
        let combos = SearchSpace::new(baseline()).expand().unwrap();
        assert_eq!(combos, vec![baseline()]);
    }

    #[test]
    fn invalid_combinations_are_dropped() {
        let mut space = SearchSpace::new(baseline());
        space.values.insert("BASE_BYE_PENALTY".into(), vec![-5.0, 20.0]);
        let combos = space.expand().unwrap();
        assert_eq!(combos.len(), 1);

        let mut space = SearchSpace::new(baseline());
        space.values.insert("NORMALIZATION_MAX_SCALE".into(), vec![0.0, -1.0]);
        assert!(matches!(
            space.expand(),
            Err(OptimizerError::NoValidCombinations)
        ));
    }

    #[test]
    fn neighborhood_clips_and_dedupes() {
        let mut space = SearchSpace::new(baseline());
        space
            .offsets
            .insert("BASE_BYE_PENALTY".into(), vec![-1000.0, -0.1, 0.0, 0.1]);
        space.bounds.insert("BASE_BYE_PENALTY".into(), (0.0, 100.0));
        let base = baseline();
        let current = base.get("BASE_BYE_PENALTY").unwrap();

        let sets = space.neighborhood(&base);
        let values: Vec<f64> = sets
            .iter()
            .map(|s| s.get("BASE_BYE_PENALTY").unwrap())
            .collect();
        // Base, clipped low, -0.1, +0.1. Offset 0.0 duplicates the base.
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], current);
        assert_eq!(values[1], 0.0);
        assert_eq!(values[2], round_value(current - 0.1));
        assert_eq!(values[3], round_value(current + 0.1));
    }

    #[test]
    fn top_count_respects_floor_and_ceiling() {
        let opt = ConfigOptimizer::new(ParallelRunner::new(Some(1)), settings(false), 1);
        assert_eq!(opt.top_count(16), 4);
        assert_eq!(opt.top_count(3), 1);
        assert_eq!(opt.top_count(0), 0);
        let mut s = settings(false);
        s.min_top_configs = 10;
        let opt = ConfigOptimizer::new(ParallelRunner::new(Some(1)), s, 1);
        assert_eq!(opt.top_count(4), 4);
    }

    #[test]
    fn finds_the_best_grid_point() {
        let mut space = SearchSpace::new(baseline());
        space
            .values
            .insert("NORMALIZATION_MAX_SCALE".into(), vec![60.0, 80.0, 100.0, 120.0]);
        let opt = ConfigOptimizer::new(ParallelRunner::new(Some(2)), settings(false), 7);
        let result = opt.run(&space, by_scale).unwrap();

        assert_eq!(result.preliminary.len(), 4);
        assert_eq!(result.full.len(), 1);
        assert_eq!(result.total_simulations, 4 * 3 + 4);
        assert_eq!(result.failed_tasks, 0);
        let best = result.optimal.unwrap();
        assert_eq!(best.parameters.get("NORMALIZATION_MAX_SCALE").unwrap(), 120.0);
        assert_eq!(best.simulations, 4);
    }

    #[test]
    fn fine_grain_can_improve_on_the_grid() {
        let mut space = SearchSpace::new(baseline());
        space
            .values
            .insert("NORMALIZATION_MAX_SCALE".into(), vec![80.0, 100.0]);
        space
            .offsets
            .insert("NORMALIZATION_MAX_SCALE".into(), vec![-10.0, 10.0]);
        let opt = ConfigOptimizer::new(ParallelRunner::new(Some(2)), settings(true), 7);
        let result = opt.run(&space, by_scale).unwrap();

        // 100 advances and expands to {100, 90, 110}
        assert_eq!(result.full.len(), 3);
        let best = result.optimal.unwrap();
        assert_eq!(best.parameters.get("NORMALIZATION_MAX_SCALE").unwrap(), 110.0);
    }

    #[test]
    fn total_failure_is_an_error() {
        let space = SearchSpace::new(baseline());
        let opt = ConfigOptimizer::new(ParallelRunner::new(Some(1)), settings(false), 1);
        let err = opt
            .run(&space, |_| Err(SimulationError::EmptyPlayerPool))
            .unwrap_err();
        assert!(matches!(err, OptimizerError::NoSuccessfulRuns));
    }
}
