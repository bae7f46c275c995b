// Parallel simulation runner: a bounded rayon pool and a locked aggregator.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;
use thiserror::Error;
use tracing::{error, info};

use crate::valuation::params::ParameterSet;

use super::{SimulationError, SimulationOutcome, SimulationTask};

/// Worker ceiling when none is configured.
const DEFAULT_MAX_WORKERS: usize = 6;

/// Completions always logged before throttling kicks in.
const EARLY_PROGRESS_LOGS: usize = 10;
const PROGRESS_EVERY: usize = 50;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Successful outcomes for one parameter set.
#[derive(Debug, Clone)]
pub struct ConfigurationRuns {
    pub parameters: Arc<ParameterSet>,
    pub outcomes: Vec<SimulationOutcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    pub config_index: usize,
    pub repetition: usize,
    pub config_key: String,
    pub message: String,
}

/// What a batch produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Config key -> successful runs.
    pub results: BTreeMap<String, ConfigurationRuns>,
    pub completed: usize,
    pub failed: usize,
    pub failures: Vec<TaskFailure>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Number of successful outcomes across all configurations.
    pub fn successful(&self) -> usize {
        self.results.values().map(|r| r.outcomes.len()).sum()
    }

    /// Failed task count for one config key.
    pub fn failures_for(&self, config_key: &str) -> usize {
        self.failures
            .iter()
            .filter(|f| f.config_key == config_key)
            .count()
    }
}

/// Derive a repetition's seed from the batch seed.
///
/// Every configuration sees the same seed for the same repetition, so
/// configurations are compared over identical leagues and draws.
pub fn seed_for(base: u64, repetition: usize) -> u64 {
    // splitmix64 finalizer
    let mut z = base.wrapping_add((repetition as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Progress {
    completed: usize,
    failed: usize,
}

/// Merges task results. Results and progress sit behind separate locks so a
/// progress log never holds up a result merge.
struct Aggregator {
    results: Mutex<BTreeMap<String, ConfigurationRuns>>,
    failures: Mutex<Vec<TaskFailure>>,
    progress: Mutex<Progress>,
    total: usize,
    started: Instant,
}

impl Aggregator {
    fn new(total: usize) -> Self {
        Aggregator {
            results: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(Vec::new()),
            progress: Mutex::new(Progress::default()),
            total,
            started: Instant::now(),
        }
    }

    fn record(&self, task: &SimulationTask, result: Result<SimulationOutcome, String>) {
        let key = task.parameters.config_key();
        let failed = match result {
            Ok(outcome) => {
                let mut results = self.results.lock().unwrap_or_else(PoisonError::into_inner);
                results
                    .entry(key)
                    .or_insert_with(|| ConfigurationRuns {
                        parameters: Arc::clone(&task.parameters),
                        outcomes: Vec::new(),
                    })
                    .outcomes
                    .push(outcome);
                false
            }
            Err(message) => {
                error!(
                    "simulation failed (config {}, repetition {}): {}",
                    task.config_index, task.repetition, message
                );
                self.failures
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(TaskFailure {
                        config_index: task.config_index,
                        repetition: task.repetition,
                        config_key: key,
                        message,
                    });
                true
            }
        };
        self.tick(failed);
    }

    fn tick(&self, failed: bool) {
        let mut progress = self.progress.lock().unwrap_or_else(PoisonError::into_inner);
        progress.completed += 1;
        if failed {
            progress.failed += 1;
        }
        if should_log(progress.completed, self.total) {
            let elapsed = self.started.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                progress.completed as f64 / elapsed
            } else {
                0.0
            };
            let eta = if rate > 0.0 {
                (self.total - progress.completed) as f64 / rate
            } else {
                0.0
            };
            info!(
                "progress: {}/{} ({:.1}%), {} failed, {:.1} sims/s, eta {:.0}s",
                progress.completed,
                self.total,
                100.0 * progress.completed as f64 / self.total.max(1) as f64,
                progress.failed,
                rate,
                eta
            );
        }
    }

    fn finish(self) -> RunSummary {
        let progress = self.progress.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut failures = self.failures.into_inner().unwrap_or_else(PoisonError::into_inner);
        failures.sort_by_key(|f| (f.config_index, f.repetition));
        RunSummary {
            results: self.results.into_inner().unwrap_or_else(PoisonError::into_inner),
            completed: progress.completed,
            failed: progress.failed,
            failures,
            elapsed: self.started.elapsed(),
        }
    }
}

/// First few completions, then every 50 or every ~5%, whichever is more
/// frequent, and always the last one.
fn should_log(done: usize, total: usize) -> bool {
    let step = (total / 20).clamp(1, PROGRESS_EVERY);
    done <= EARLY_PROGRESS_LOGS || done % step == 0 || done == total
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Runs simulation tasks on a bounded worker pool.
#[derive(Debug, Clone, Copy)]
pub struct ParallelRunner {
    workers: usize,
}

impl ParallelRunner {
    /// `max_workers` of None means min(6, available cores).
    pub fn new(max_workers: Option<usize>) -> Self {
        let workers = max_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(DEFAULT_MAX_WORKERS)
        });
        ParallelRunner {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Execute every task. A failing or panicking task is recorded and the
    /// rest of the batch carries on.
    pub fn run<F>(&self, tasks: &[SimulationTask], simulate: F) -> Result<RunSummary, RunnerError>
    where
        F: Fn(&SimulationTask) -> Result<SimulationOutcome, SimulationError> + Sync,
    {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("sim-worker-{i}"))
            .build()?;

        info!(
            "running {} simulations on {} workers",
            tasks.len(),
            self.workers
        );

        let aggregator = Aggregator::new(tasks.len());
        pool.scope(|scope| {
            for task in tasks {
                let aggregator = &aggregator;
                let simulate = &simulate;
                scope.spawn(move |_| {
                    let result = match catch_unwind(AssertUnwindSafe(|| simulate(task))) {
                        Ok(Ok(outcome)) => Ok(outcome),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(payload) => Err(panic_message(payload)),
                    };
                    aggregator.record(task, result);
                });
            }
        });

        let summary = aggregator.finish();
        info!(
            "batch finished: {} completed, {} failed in {:.2}s",
            summary.completed,
            summary.failed,
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::params::baseline_map;

    fn params(scale: f64) -> Arc<ParameterSet> {
        let base = ParameterSet::from_map(baseline_map()).unwrap();
        Arc::new(base.with_value("NORMALIZATION_MAX_SCALE", scale).unwrap())
    }

    fn outcome(wins: u32) -> SimulationOutcome {
        SimulationOutcome {
            user_team: 0,
            wins,
            losses: 17 - wins,
            win_percentage: f64::from(wins) / 17.0,
            total_points: 1500.0,
            points_per_game: 1500.0 / 17.0,
            consistency: 10.0,
            rank: 1,
        }
    }

    fn tasks(configs: &[Arc<ParameterSet>], reps: usize) -> Vec<SimulationTask> {
        configs
            .iter()
            .enumerate()
            .flat_map(|(i, p)| {
                (0..reps).map(move |r| SimulationTask {
                    config_index: i,
                    repetition: r,
                    seed: seed_for(1, r),
                    parameters: Arc::clone(p),
                })
            })
            .collect()
    }

    #[test]
    fn groups_results_by_config_key() {
        let configs = [params(100.0), params(120.0)];
        let summary = ParallelRunner::new(Some(3))
            .run(&tasks(&configs, 5), |t| Ok(outcome(t.repetition as u32)))
            .unwrap();
        assert_eq!(summary.completed, 10);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.results.len(), 2);
        for runs in summary.results.values() {
            assert_eq!(runs.outcomes.len(), 5);
        }
        assert!(summary.results.contains_key(&configs[1].config_key()));
    }

    #[test]
    fn errors_and_panics_are_isolated() {
        let configs = [params(100.0)];
        let summary = ParallelRunner::new(Some(2))
            .run(&tasks(&configs, 6), |t| match t.repetition {
                2 => Err(SimulationError::EmptyPlayerPool),
                4 => panic!("boom"),
                _ => Ok(outcome(9)),
            })
            .unwrap();
        assert_eq!(summary.completed, 6);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.successful(), 4);
        let reps: Vec<usize> = summary.failures.iter().map(|f| f.repetition).collect();
        assert_eq!(reps, vec![2, 4]);
        assert!(summary.failures[1].message.contains("boom"));
        assert_eq!(summary.failures_for(&configs[0].config_key()), 2);
    }

    #[test]
    fn empty_batch_is_fine() {
        let summary = ParallelRunner::new(None).run(&[], |_| Ok(outcome(1))).unwrap();
        assert_eq!(summary.completed, 0);
        assert!(summary.results.is_empty());
    }

    #[test]
    fn default_worker_count_is_bounded() {
        let runner = ParallelRunner::new(None);
        assert!((1..=DEFAULT_MAX_WORKERS).contains(&runner.workers()));
        assert_eq!(ParallelRunner::new(Some(0)).workers(), 1);
    }

    #[test]
    fn seeds_differ_per_repetition_only() {
        assert_eq!(seed_for(42, 3), seed_for(42, 3));
        assert_ne!(seed_for(42, 3), seed_for(42, 4));
        assert_ne!(seed_for(42, 3), seed_for(43, 3));
    }

    #[test]
    fn progress_logging_is_throttled() {
        assert!(should_log(1, 10_000));
        assert!(should_log(10, 10_000));
        assert!(!should_log(11, 10_000));
        assert!(should_log(50, 10_000));
        assert!(should_log(10_000, 10_000));
        // Small batches log every 5%
        assert!(should_log(20, 200));
        assert!(!should_log(21, 200));
    }
}
