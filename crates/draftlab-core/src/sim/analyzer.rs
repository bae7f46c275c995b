// Results analysis: per-configuration means, rankings, parameter sensitivity
// and the JSON report.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::valuation::params::ParameterSet;

use super::optimizer::OptimizationResult;
use super::runner::RunSummary;
use super::SimulationOutcome;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Per-configuration summary
// ---------------------------------------------------------------------------

/// Averages over every successful run of one parameter set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationResult {
    pub config_key: String,
    pub parameters: ParameterSet,
    pub simulations: usize,
    pub failures: usize,
    pub mean_win_percentage: f64,
    pub mean_total_points: f64,
    pub mean_points_per_game: f64,
    pub mean_consistency: f64,
    /// Final rank -> number of seasons finished there.
    pub rank_distribution: BTreeMap<usize, usize>,
}

impl ConfigurationResult {
    pub fn from_runs(parameters: ParameterSet, outcomes: &[SimulationOutcome], failures: usize) -> Self {
        let mean = |f: fn(&SimulationOutcome) -> f64| {
            if outcomes.is_empty() {
                0.0
            } else {
                outcomes.iter().map(f).sum::<f64>() / outcomes.len() as f64
            }
        };

        let mut rank_distribution = BTreeMap::new();
        for o in outcomes {
            *rank_distribution.entry(o.rank).or_insert(0) += 1;
        }

        ConfigurationResult {
            config_key: parameters.config_key(),
            simulations: outcomes.len(),
            failures,
            mean_win_percentage: mean(|o| o.win_percentage),
            mean_total_points: mean(|o| o.total_points),
            mean_points_per_game: mean(|o| o.points_per_game),
            mean_consistency: mean(|o| o.consistency),
            rank_distribution,
            parameters,
        }
    }
}

/// Order by (win percentage, total points), best first.
pub fn compare_results(a: &ConfigurationResult, b: &ConfigurationResult) -> Ordering {
    b.mean_win_percentage
        .partial_cmp(&a.mean_win_percentage)
        .unwrap_or(Ordering::Equal)
        .then(
            b.mean_total_points
                .partial_cmp(&a.mean_total_points)
                .unwrap_or(Ordering::Equal),
        )
}

pub fn rank_results(results: &mut [ConfigurationResult]) {
    results.sort_by(compare_results);
}

/// Reduce a batch into ranked per-configuration results.
pub fn summarize(summary: &RunSummary) -> Vec<ConfigurationResult> {
    let mut results: Vec<ConfigurationResult> = summary
        .results
        .iter()
        .map(|(key, runs)| {
            ConfigurationResult::from_runs(
                (*runs.parameters).clone(),
                &runs.outcomes,
                summary.failures_for(key),
            )
        })
        .collect();
    rank_results(&mut results);
    results
}

// ---------------------------------------------------------------------------
// Sensitivity and distributions
// ---------------------------------------------------------------------------

/// How configurations sharing one parameter value performed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterValueStats {
    pub value: f64,
    pub mean_win_percentage: f64,
    pub mean_total_points: f64,
    pub configurations: usize,
}

/// For every parameter that took more than one value, group results by
/// value. Values are listed in ascending order.
pub fn parameter_breakdown(results: &[ConfigurationResult]) -> BTreeMap<String, Vec<ParameterValueStats>> {
    let mut grouped: BTreeMap<String, Vec<(f64, Vec<&ConfigurationResult>)>> = BTreeMap::new();
    for result in results {
        for (name, value) in result.parameters.iter() {
            let groups = grouped.entry(name.to_string()).or_default();
            match groups.iter_mut().find(|(v, _)| v.to_bits() == value.to_bits()) {
                Some((_, members)) => members.push(result),
                None => groups.push((value, vec![result])),
            }
        }
    }

    grouped
        .into_iter()
        .filter(|(_, groups)| groups.len() > 1)
        .map(|(name, mut groups)| {
            groups.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            let stats = groups
                .into_iter()
                .map(|(value, members)| {
                    let n = members.len() as f64;
                    ParameterValueStats {
                        value,
                        mean_win_percentage: members.iter().map(|r| r.mean_win_percentage).sum::<f64>() / n,
                        mean_total_points: members.iter().map(|r| r.mean_total_points).sum::<f64>() / n,
                        configurations: members.len(),
                    }
                })
                .collect();
            (name, stats)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

/// Summary statistics. All zero for an empty input.
pub fn distribution(values: &[f64]) -> Distribution {
    if values.is_empty() {
        return Distribution::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    Distribution {
        mean,
        median,
        std_dev: variance.sqrt(),
        min,
        max,
        range: max - min,
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub configurations_tested: usize,
    pub total_simulations: usize,
    pub failed_tasks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedConfiguration {
    pub rank: usize,
    #[serde(flatten)]
    pub result: ConfigurationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct Distributions {
    pub win_percentage: Distribution,
    pub total_points: Distribution,
    pub consistency: Distribution,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatisticalSummary {
    pub above_50_percent: usize,
    pub above_60_percent: usize,
    pub above_70_percent: usize,
    pub best_win_percentage: f64,
    pub worst_win_percentage: f64,
    pub spread: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub optimal: Option<ConfigurationResult>,
    pub rankings: Vec<RankedConfiguration>,
    pub parameter_breakdown: BTreeMap<String, Vec<ParameterValueStats>>,
    pub distributions: Distributions,
    pub summary: StatisticalSummary,
}

/// Build the report from the final result set of a search.
pub fn build_report(result: &OptimizationResult) -> AnalysisReport {
    let mut results = result.final_results().to_vec();
    rank_results(&mut results);

    let win: Vec<f64> = results.iter().map(|r| r.mean_win_percentage).collect();
    let points: Vec<f64> = results.iter().map(|r| r.mean_total_points).collect();
    let consistency: Vec<f64> = results.iter().map(|r| r.mean_consistency).collect();
    let win_dist = distribution(&win);
    let above = |threshold: f64| win.iter().filter(|&&w| w > threshold).count();

    AnalysisReport {
        metadata: ReportMetadata {
            generated_at: Utc::now(),
            configurations_tested: result.preliminary.len(),
            total_simulations: result.total_simulations,
            failed_tasks: result.failed_tasks,
        },
        optimal: result.optimal.clone(),
        parameter_breakdown: parameter_breakdown(&results),
        distributions: Distributions {
            win_percentage: win_dist,
            total_points: distribution(&points),
            consistency: distribution(&consistency),
        },
        summary: StatisticalSummary {
            above_50_percent: above(0.5),
            above_60_percent: above(0.6),
            above_70_percent: above(0.7),
            best_win_percentage: win_dist.max,
            worst_win_percentage: win_dist.min,
            spread: win_dist.range,
        },
        rankings: results
            .into_iter()
            .enumerate()
            .map(|(i, result)| RankedConfiguration { rank: i + 1, result })
            .collect(),
    }
}

/// Write the report as pretty JSON, creating parent directories.
pub fn write_report(report: &AnalysisReport, path: &Path) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).map_err(io_err)?;
    info!("wrote report to {}", path.display());
    Ok(())
}
