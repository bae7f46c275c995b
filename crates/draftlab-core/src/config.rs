// Configuration loading and parsing (league.toml, simulation.toml, parameters.toml).

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::draft::pick::Position;
use crate::strategy::StrategyKind;
use crate::valuation::params::ParameterSet;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub simulation: SimulationConfig,
    /// Strategy name -> number of teams using it.
    pub strategy_mix: BTreeMap<String, usize>,
    pub optimizer: OptimizerConfig,
    pub scoring: ScoringOptions,
    /// Baseline scoring parameter set.
    pub parameters: ParameterSet,
    pub search: SearchConfig,
    pub data_paths: DataPaths,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: usize,
    /// Roster size, which is also the number of draft rounds.
    pub max_players: usize,
    /// Minimum combined head-count of FLEX-eligible positions a trade must keep.
    #[serde(default = "default_min_flex_coverage")]
    pub min_flex_coverage: usize,
    pub flex_eligible: Vec<String>,
    pub possible_bye_weeks: Vec<u8>,
    /// Slot bucket name -> maximum occupancy (FLEX included).
    pub max_positions: HashMap<String, usize>,
    /// Weekly starting lineup: slot name -> starters.
    pub lineup: HashMap<String, usize>,
    pub draft_order: Vec<DraftOrderEntry>,
}

fn default_min_flex_coverage() -> usize {
    4
}

/// One round of the ideal-position schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftOrderEntry {
    pub primary: String,
    #[serde(default)]
    pub secondary: Option<String>,
}

// ---------------------------------------------------------------------------
// simulation.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire simulation.toml file.
#[derive(Debug, Clone, Deserialize)]
struct SimulationFile {
    simulation: SimulationConfig,
    strategies: BTreeMap<String, usize>,
    optimizer: OptimizerConfig,
    scoring: ScoringOptions,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub human_error_rate: f64,
    pub suboptimal_choice_pool: usize,
    pub season_weeks: u8,
    pub current_week: u8,
    pub seed: u64,
    #[serde(default)]
    pub max_workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    pub preliminary_simulations: usize,
    pub full_simulations: usize,
    pub top_configs_percentage: f64,
    pub min_top_configs: usize,
    pub fine_grain: bool,
}

/// Shape of the scoring curves. These are structural settings; the tuned
/// magnitudes live in the parameter set.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringOptions {
    pub rating_max_boost: f64,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
    pub adp: TierThresholds,
    pub rating: TierThresholds,
    pub team: TierThresholds,
    pub matchup: MatchupThresholds,
    pub bye: ByeWeights,
}

/// Breakpoints for a three-tier multiplier curve.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TierThresholds {
    pub excellent: f64,
    pub good: f64,
    pub poor: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MatchupThresholds {
    pub excellent: f64,
    pub good: f64,
    pub neutral: f64,
    pub poor: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ByeWeights {
    /// Weight of a conflict with a player at the candidate's own position.
    pub same_position: f64,
    /// Weight of a conflict with any other position.
    pub other_position: f64,
    /// Fraction of a starter conflict charged for a bench conflict.
    pub bench_factor: f64,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        ScoringOptions {
            rating_max_boost: 1.25,
            min_multiplier: 0.70,
            max_multiplier: 1.50,
            adp: TierThresholds {
                excellent: 50.0,
                good: 100.0,
                poor: 200.0,
            },
            rating: TierThresholds {
                excellent: 80.0,
                good: 60.0,
                poor: 30.0,
            },
            team: TierThresholds {
                excellent: 5.0,
                good: 12.0,
                poor: 25.0,
            },
            matchup: MatchupThresholds {
                excellent: 80.0,
                good: 60.0,
                neutral: 40.0,
                poor: 20.0,
            },
            bye: ByeWeights {
                same_position: 1.0,
                other_position: 0.5,
                bench_factor: 0.5,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
    pub report: String,
}

// ---------------------------------------------------------------------------
// parameters.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct ParametersFile {
    parameters: BTreeMap<String, f64>,
    #[serde(default)]
    search: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    fine_grain: FineGrainSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FineGrainSection {
    #[serde(default)]
    offsets: BTreeMap<String, Vec<f64>>,
    #[serde(default)]
    bounds: BTreeMap<String, (f64, f64)>,
}

/// The optimizer's search space around the baseline parameter set.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    /// Candidate values per parameter for the preliminary grid.
    pub values: BTreeMap<String, Vec<f64>>,
    /// Offsets tried one parameter at a time in the fine-grained phase.
    pub offsets: BTreeMap<String, Vec<f64>>,
    /// Inclusive (low, high) clamp applied to fine-grained values.
    pub bounds: BTreeMap<String, (f64, f64)>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml`,
/// `config/simulation.toml`, and `config/parameters.toml`, all relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- simulation.toml ---
    let simulation_path = config_dir.join("simulation.toml");
    let simulation_text = read_file(&simulation_path)?;
    let simulation_file: SimulationFile =
        toml::from_str(&simulation_text).map_err(|e| ConfigError::ParseError {
            path: simulation_path.clone(),
            source: e,
        })?;

    // --- parameters.toml ---
    let parameters_path = config_dir.join("parameters.toml");
    let parameters_text = read_file(&parameters_path)?;
    let parameters_file: ParametersFile =
        toml::from_str(&parameters_text).map_err(|e| ConfigError::ParseError {
            path: parameters_path.clone(),
            source: e,
        })?;

    let parameters = ParameterSet::from_map(parameters_file.parameters).map_err(|e| {
        ConfigError::ValidationError {
            field: "parameters".into(),
            message: e.to_string(),
        }
    })?;

    let config = Config {
        league: league_file.league,
        simulation: simulation_file.simulation,
        strategy_mix: simulation_file.strategies,
        optimizer: simulation_file.optimizer,
        scoring: simulation_file.scoring,
        parameters,
        search: SearchConfig {
            values: parameters_file.search,
            offsets: parameters_file.fine_grain.offsets,
            bounds: parameters_file.fine_grain.bounds,
        },
        data_paths: simulation_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // Keep the user's edited copy
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Parse a position name, reporting the offending field on failure.
pub(crate) fn parse_position(field: &str, name: &str) -> Result<Position, ConfigError> {
    Position::from_str_pos(name).ok_or_else(|| invalid(field, format!("unknown position `{name}`")))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_league(&config.league)?;

    // Simulation validations
    let sim = &config.simulation;
    if !(0.0..=1.0).contains(&sim.human_error_rate) {
        return Err(invalid(
            "simulation.human_error_rate",
            format!("must be between 0.0 and 1.0 inclusive, got {}", sim.human_error_rate),
        ));
    }
    let sim_fields: &[(&str, usize)] = &[
        ("simulation.suboptimal_choice_pool", sim.suboptimal_choice_pool),
        ("simulation.season_weeks", sim.season_weeks as usize),
    ];
    for (name, val) in sim_fields {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }
    if sim.season_weeks as usize > crate::draft::player::SEASON_WEEKS {
        return Err(invalid(
            "simulation.season_weeks",
            format!(
                "must be at most {}, got {}",
                crate::draft::player::SEASON_WEEKS,
                sim.season_weeks
            ),
        ));
    }
    if sim.max_workers == Some(0) {
        return Err(invalid("simulation.max_workers", "must be > 0 when set"));
    }

    // Strategy mix must name known strategies, cover the whole league, and
    // include the helper-driven team under evaluation.
    let mut total = 0;
    let mut has_helper = false;
    for (name, count) in &config.strategy_mix {
        let kind = StrategyKind::from_name(name)
            .ok_or_else(|| invalid(&format!("strategies.{name}"), "unknown strategy"))?;
        if kind == StrategyKind::HelperDriven && *count > 0 {
            has_helper = true;
        }
        total += count;
    }
    if total != config.league.num_teams {
        return Err(invalid(
            "strategies",
            format!(
                "team counts must sum to league.num_teams ({}), got {total}",
                config.league.num_teams
            ),
        ));
    }
    if !has_helper {
        return Err(invalid("strategies", "at least one draft_helper team is required"));
    }

    // Optimizer validations
    let opt = &config.optimizer;
    let opt_fields: &[(&str, usize)] = &[
        ("optimizer.preliminary_simulations", opt.preliminary_simulations),
        ("optimizer.full_simulations", opt.full_simulations),
        ("optimizer.min_top_configs", opt.min_top_configs),
    ];
    for (name, val) in opt_fields {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }
    let pct = opt.top_configs_percentage;
    if !(pct > 0.0 && pct <= 1.0) {
        return Err(invalid(
            "optimizer.top_configs_percentage",
            format!("must be in (0.0, 1.0], got {pct}"),
        ));
    }

    // Scoring shape
    let scoring = &config.scoring;
    if scoring.min_multiplier <= 0.0 || scoring.min_multiplier > scoring.max_multiplier {
        return Err(invalid(
            "scoring.min_multiplier",
            format!(
                "must be > 0 and <= max_multiplier ({}), got {}",
                scoring.max_multiplier, scoring.min_multiplier
            ),
        ));
    }
    if scoring.rating_max_boost <= 0.0 {
        return Err(invalid(
            "scoring.rating_max_boost",
            format!("must be > 0, got {}", scoring.rating_max_boost),
        ));
    }

    // Search space must only touch known parameters
    for (name, values) in &config.search.values {
        if !config.parameters.contains(name) {
            return Err(invalid(&format!("search.{name}"), "unknown parameter"));
        }
        if values.is_empty() {
            return Err(invalid(&format!("search.{name}"), "must list at least one value"));
        }
    }
    for name in config.search.offsets.keys() {
        if !config.parameters.contains(name) {
            return Err(invalid(&format!("fine_grain.offsets.{name}"), "unknown parameter"));
        }
    }
    for (name, (lo, hi)) in &config.search.bounds {
        if lo > hi {
            return Err(invalid(
                &format!("fine_grain.bounds.{name}"),
                format!("lower bound {lo} exceeds upper bound {hi}"),
            ));
        }
    }

    Ok(())
}

fn validate_league(league: &LeagueConfig) -> Result<(), ConfigError> {
    if league.num_teams < 2 {
        return Err(invalid("league.num_teams", "must be at least 2"));
    }
    if league.max_players == 0 {
        return Err(invalid("league.max_players", "must be greater than 0"));
    }

    for name in league.max_positions.keys() {
        parse_position(&format!("league.max_positions.{name}"), name)?;
    }
    for name in league.lineup.keys() {
        parse_position(&format!("league.lineup.{name}"), name)?;
    }
    for name in &league.flex_eligible {
        let pos = parse_position("league.flex_eligible", name)?;
        if pos == Position::Flex {
            return Err(invalid("league.flex_eligible", "FLEX cannot be FLEX-eligible"));
        }
    }

    let capacity: usize = league.max_positions.values().sum();
    if capacity < league.max_players {
        return Err(invalid(
            "league.max_positions",
            format!(
                "slot capacity ({capacity}) is smaller than league.max_players ({})",
                league.max_players
            ),
        ));
    }

    if league.possible_bye_weeks.is_empty() {
        return Err(invalid("league.possible_bye_weeks", "must not be empty"));
    }

    if league.draft_order.len() != league.max_players {
        return Err(invalid(
            "league.draft_order",
            format!(
                "must have one entry per round ({}), got {}",
                league.max_players,
                league.draft_order.len()
            ),
        ));
    }
    for entry in &league.draft_order {
        parse_position("league.draft_order", &entry.primary)?;
        if let Some(secondary) = &entry.secondary {
            parse_position("league.draft_order", secondary)?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Helper: returns the workspace root that holds `defaults/`.
    fn project_root() -> PathBuf {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let root = manifest.join("../..");
        if root.join("defaults").exists() {
            root
        } else {
            panic!("Cannot locate defaults/ directory from {:?}", manifest);
        }
    }

    /// Helper: a temp project with all three default files in config/.
    fn temp_project(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        let config_dir = tmp.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        let root = project_root();
        for file in ["league.toml", "simulation.toml", "parameters.toml"] {
            fs::copy(root.join("defaults").join(file), config_dir.join(file)).unwrap();
        }
        tmp
    }

    /// Helper: rewrite one config file with a string substitution.
    fn patch(tmp: &Path, file: &str, from: &str, to: &str) {
        let path = tmp.join("config").join(file);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(from), "{file} does not contain {from:?}");
        fs::write(&path, text.replacen(from, to, 1)).unwrap();
    }

    fn expect_field(err: ConfigError, expected: &str) {
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config_from_default_files() {
        let tmp = temp_project("draftlab_config_valid");
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.league.num_teams, 10);
        assert_eq!(config.league.max_players, 15);
        assert_eq!(config.league.min_flex_coverage, 4);
        assert_eq!(config.league.max_positions.get("RB"), Some(&4));
        assert_eq!(config.league.max_positions.get("FLEX"), Some(&1));
        assert_eq!(config.league.lineup.get("WR"), Some(&2));
        assert_eq!(config.league.draft_order.len(), 15);
        assert_eq!(config.league.draft_order[11].primary, "K");
        assert_eq!(config.league.flex_eligible, vec!["RB", "WR"]);

        assert!((config.simulation.human_error_rate - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.simulation.suboptimal_choice_pool, 5);
        assert_eq!(config.simulation.season_weeks, 17);
        assert!(config.simulation.max_workers.is_none());

        assert_eq!(config.strategy_mix.values().sum::<usize>(), 10);
        assert_eq!(config.strategy_mix.get("draft_helper"), Some(&1));

        assert_eq!(config.optimizer.min_top_configs, 3);
        assert!(config.optimizer.fine_grain);

        assert!((config.scoring.max_multiplier - 1.5).abs() < f64::EPSILON);
        assert!((config.scoring.adp.poor - 200.0).abs() < f64::EPSILON);

        assert_eq!(config.parameters.get("DRAFT_ORDER_PRIMARY_BONUS").unwrap(), 75.0);
        assert_eq!(config.search.values.len(), 5);
        assert_eq!(
            config.search.bounds.get("NORMALIZATION_MAX_SCALE"),
            Some(&(50.0, 200.0))
        );
        assert_eq!(config.data_paths.players, "data/players.csv");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_single_team_league() {
        let tmp = temp_project("draftlab_config_one_team");
        patch(&tmp, "league.toml", "num_teams = 10", "num_teams = 1");
        expect_field(load_config_from(&tmp).unwrap_err(), "league.num_teams");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_draft_order_length_mismatch() {
        let tmp = temp_project("draftlab_config_draft_order");
        patch(&tmp, "league.toml", "max_players = 15", "max_players = 14");
        expect_field(load_config_from(&tmp).unwrap_err(), "league.draft_order");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_position() {
        let tmp = temp_project("draftlab_config_unknown_pos");
        patch(&tmp, "league.toml", "primary = \"K\"", "primary = \"SP\"");
        expect_field(load_config_from(&tmp).unwrap_err(), "league.draft_order");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_insufficient_slot_capacity() {
        let tmp = temp_project("draftlab_config_capacity");
        patch(&tmp, "league.toml", "QB = 2", "QB = 1");
        expect_field(load_config_from(&tmp).unwrap_err(), "league.max_positions");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_human_error_rate_too_high() {
        let tmp = temp_project("draftlab_config_error_rate");
        patch(&tmp, "simulation.toml", "human_error_rate = 0.3", "human_error_rate = 1.5");
        expect_field(load_config_from(&tmp).unwrap_err(), "simulation.human_error_rate");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_strategy_mix_not_matching_league_size() {
        let tmp = temp_project("draftlab_config_mix_size");
        patch(&tmp, "simulation.toml", "value = 3", "value = 4");
        expect_field(load_config_from(&tmp).unwrap_err(), "strategies");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_strategy_mix_without_helper() {
        let tmp = temp_project("draftlab_config_mix_helper");
        patch(&tmp, "simulation.toml", "value = 3\ndraft_helper = 1", "value = 4");
        expect_field(load_config_from(&tmp).unwrap_err(), "strategies");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_strategy() {
        let tmp = temp_project("draftlab_config_mix_unknown");
        patch(&tmp, "simulation.toml", "aggressive = 2", "reckless = 2");
        expect_field(load_config_from(&tmp).unwrap_err(), "strategies.reckless");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_top_configs_percentage() {
        let tmp = temp_project("draftlab_config_top_pct");
        patch(
            &tmp,
            "simulation.toml",
            "top_configs_percentage = 0.2",
            "top_configs_percentage = 0.0",
        );
        expect_field(load_config_from(&tmp).unwrap_err(), "optimizer.top_configs_percentage");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_inverted_multiplier_band() {
        let tmp = temp_project("draftlab_config_band");
        patch(&tmp, "simulation.toml", "min_multiplier = 0.70", "min_multiplier = 1.70");
        expect_field(load_config_from(&tmp).unwrap_err(), "scoring.min_multiplier");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_missing_required_parameter() {
        let tmp = temp_project("draftlab_config_missing_param");
        patch(&tmp, "parameters.toml", "BASE_BYE_PENALTY = 20.0\n", "");
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, message } => {
                assert_eq!(field, "parameters");
                assert!(message.contains("BASE_BYE_PENALTY"));
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_search_over_unknown_parameter() {
        let tmp = temp_project("draftlab_config_search_unknown");
        patch(
            &tmp,
            "parameters.toml",
            "[search]\n",
            "[search]\nPOS_NEEDED_SCORE = [10.0, 20.0]\n",
        );
        expect_field(load_config_from(&tmp).unwrap_err(), "search.POS_NEEDED_SCORE");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_parameters_toml() {
        let tmp = temp_project("draftlab_config_no_params");
        fs::remove_file(tmp.join("config/parameters.toml")).unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("parameters.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_project("draftlab_config_parse_error");
        fs::write(tmp.join("config/league.toml"), "[league\nname = ").unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("league.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = std::env::temp_dir().join("draftlab_config_ensure_copies");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        let root = project_root();
        for file in ["league.toml", "simulation.toml", "parameters.toml"] {
            fs::copy(root.join("defaults").join(file), defaults_dir.join(file)).unwrap();
        }
        fs::write(defaults_dir.join("local.toml.example"), "# template\n").unwrap();

        assert!(!tmp.join("config").exists());

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 3);
        assert!(tmp.join("config/league.toml").exists());
        assert!(!tmp.join("config/local.toml.example").exists());

        let config = load_config_from(&tmp).expect("copied defaults should load");
        assert_eq!(config.league.num_teams, 10);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = std::env::temp_dir().join("draftlab_config_ensure_skips");
        let _ = fs::remove_dir_all(&tmp);

        let defaults_dir = tmp.join("defaults");
        let config_dir = tmp.join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();

        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), defaults_dir.join("league.toml")).unwrap();
        fs::copy(
            root.join("defaults/simulation.toml"),
            defaults_dir.join("simulation.toml"),
        )
        .unwrap();
        fs::write(config_dir.join("league.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(&tmp).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(copied[0].ends_with("simulation.toml"));

        let content = fs::read_to_string(config_dir.join("league.toml")).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = std::env::temp_dir().join("draftlab_config_both_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        match &err {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
