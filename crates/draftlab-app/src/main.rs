// draftlab entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config (copying defaults on first run)
// 3. Load the player pool
// 4. Build the league simulation and the search space
// 5. Run the two-phase optimizer on the worker pool
// 6. Build and write the analysis report

use std::path::Path;

use draftlab_core::config;
use draftlab_core::sim::analyzer;
use draftlab_core::sim::league::LeagueSimulation;
use draftlab_core::sim::optimizer::{ConfigOptimizer, SearchSpace};
use draftlab_core::sim::runner::ParallelRunner;
use draftlab_core::valuation::projections;

use anyhow::Context;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("draftlab starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, {} rounds",
        config.league.name, config.league.num_teams, config.league.max_players
    );

    // 3. Load the player pool
    let players_path = Path::new(&config.data_paths.players);
    let players = projections::load_players(players_path)
        .with_context(|| format!("failed to load players from {}", players_path.display()))?;
    info!("Loaded {} players", players.len());

    // 4. League and search space
    let league = LeagueSimulation::from_config(&config, players)
        .context("invalid simulation setup")?;
    let space = SearchSpace::from_config(&config);
    info!(
        "Search space: {} dimensions, {} grid points, fine grain {}",
        space.values.len(),
        space.combination_count(),
        if config.optimizer.fine_grain { "on" } else { "off" }
    );

    // 5. Optimize
    let runner = ParallelRunner::new(config.simulation.max_workers);
    let optimizer = ConfigOptimizer::new(runner, config.optimizer.clone(), config.simulation.seed);
    let result = optimizer
        .run(&space, |task| league.simulate(task))
        .context("optimization failed")?;

    // 6. Report
    let report = analyzer::build_report(&result);
    let report_path = Path::new(&config.data_paths.report);
    analyzer::write_report(&report, report_path).context("failed to write report")?;

    match &report.optimal {
        Some(best) => {
            println!(
                "Best configuration: {:.1}% wins, {:.1} points/season over {} simulations",
                best.mean_win_percentage * 100.0,
                best.mean_total_points,
                best.simulations
            );
            println!("{}", serde_json::to_string_pretty(&best.parameters)?);
        }
        None => println!("No configuration completed a simulation"),
    }
    println!(
        "{} simulations, {} failed. Report written to {}",
        result.total_simulations,
        result.failed_tasks,
        report_path.display()
    );

    info!("draftlab finished");
    Ok(())
}

/// Initialize tracing to write to a log file.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("draftlab.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("draftlab=info,draftlab_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
