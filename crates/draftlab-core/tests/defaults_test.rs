// Checks on the shipped default configuration files.

use std::fs;
use std::path::PathBuf;

use draftlab_core::config::{ensure_config_files, load_config_from};
use draftlab_core::sim::league::LeagueSimulation;
use draftlab_core::valuation::params::{baseline_map, REQUIRED_KEYS};
use draftlab_core::valuation::projections::load_players;

fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Every defaults file must be valid TOML.
#[test]
fn defaults_are_valid_toml() {
    for file in ["league.toml", "simulation.toml", "parameters.toml"] {
        let path = project_root().join("defaults").join(file);
        let content = fs::read_to_string(&path).unwrap_or_else(|_| panic!("{file} should exist"));
        let parsed: Result<toml::Value, _> = toml::from_str(&content);
        assert!(parsed.is_ok(), "{file} is not valid TOML: {:?}", parsed.err());
    }
}

#[test]
fn fresh_project_bootstraps_from_defaults() {
    let tmp = std::env::temp_dir().join(format!("draftlab_bootstrap_{}", std::process::id()));
    let _ = fs::remove_dir_all(&tmp);
    fs::create_dir_all(tmp.join("defaults")).unwrap();
    for file in ["league.toml", "simulation.toml", "parameters.toml"] {
        fs::copy(
            project_root().join("defaults").join(file),
            tmp.join("defaults").join(file),
        )
        .unwrap();
    }
    fs::write(tmp.join("defaults").join("local.toml.example"), "# sample").unwrap();

    let copied = ensure_config_files(&tmp).unwrap();
    assert_eq!(copied.len(), 3);
    assert!(!tmp.join("config").join("local.toml.example").exists());
    // A second pass leaves existing files alone
    assert!(ensure_config_files(&tmp).unwrap().is_empty());

    let config = load_config_from(&tmp).unwrap();
    assert_eq!(config.league.num_teams, 10);
    assert_eq!(config.league.draft_order.len(), config.league.max_players);
    assert_eq!(
        config.strategy_mix.values().sum::<usize>(),
        config.league.num_teams
    );
    for key in REQUIRED_KEYS {
        assert!(config.parameters.contains(key), "missing {key}");
    }
    assert_eq!(config.parameters.as_map(), &baseline_map());

    let players = load_players(&project_root().join(&config.data_paths.players)).unwrap();
    assert!(LeagueSimulation::from_config(&config, players).is_ok());

    let _ = fs::remove_dir_all(&tmp);
}
