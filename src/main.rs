use std::path::PathBuf;

use arbloop::arb::path::EvaluateOptions;
use arbloop::bootstrap::{load_scenario, Scenario};
use arbloop::chain::Ledger;
use arbloop::config::Config;
use arbloop::engine::ArbEngine;
use arbloop::utils::logger::setup_logger;
use clap::{Parser, Subcommand};
use eyre::{eyre, Error, Result};
use log::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the engine settings and quote every path from reserves
    Info {
        /// Scenario file, defaults to ARBLOOP_SCENARIO
        scenario: Option<PathBuf>,
    },
    /// Dry run every path and print the per-hop trace
    Simulate {
        /// Scenario file, defaults to ARBLOOP_SCENARIO
        scenario: Option<PathBuf>,
        /// Stop each path after this hop
        #[arg(long)]
        stop_after: Option<usize>,
    },
    /// Execute every path atomically as the engine owner
    Execute {
        /// Scenario file, defaults to ARBLOOP_SCENARIO
        scenario: Option<PathBuf>,
    },
}

/// Loads the scenario and applies the environment overrides
fn prepare(config: &Config, scenario: Option<PathBuf>) -> Result<Scenario, Error> {
    let path = scenario
        .or_else(|| config.scenario.clone())
        .ok_or_else(|| eyre!("no scenario given and ARBLOOP_SCENARIO is not set"))?;
    let mut scenario = load_scenario(&path)?;
    scenario.config.apply_overrides(config);
    Ok(scenario)
}

/// Prints the engine settings and a reserves-only quote of every path
fn show_info(scenario: &Scenario) -> Result<(), Error> {
    let engine = ArbEngine::new(scenario.config.clone())?;
    let config = engine.config();
    println!("base token:     {}", config.base_token);
    println!("engine:         {}", config.address);
    println!("owner:          {}", config.owner);
    println!("allocation:     {:?}", config.allocation);
    println!("profit check:   {:?}", config.profit_check);
    println!("risk:           {:?}", config.risk);
    println!("mev protection: {:?}", config.mev);

    for (i, (request, _)) in scenario.paths.iter().enumerate() {
        match engine.path_metrics(&scenario.chain, &request.hops, request.amount_in) {
            Ok(metrics) => println!(
                "path {i}: {} -> {} (impact {} ppm, score {})",
                request.amount_in,
                metrics.expected_out,
                metrics.price_impact_ppm,
                metrics.optimality_score
            ),
            Err(e) => println!("path {i}: cannot quote: {e}"),
        }
    }
    Ok(())
}

fn simulate(mut scenario: Scenario, stop_after: Option<usize>) -> Result<(), Error> {
    let engine = ArbEngine::new(scenario.config.clone())?;
    let options = EvaluateOptions { stop_after };
    for (i, (request, _)) in scenario.paths.iter().enumerate() {
        match engine.evaluate(&mut scenario.chain, request, options) {
            Ok(trace) => {
                println!("path {i}: {trace}");
                for hop in &trace.hops {
                    println!("  {hop}");
                }
                if trace.completed {
                    println!(
                        "  profit {} ({} bips)",
                        trace.profit(),
                        trace.profit_margin()
                    );
                }
            }
            Err(e) => println!("path {i}: rejected: {e}"),
        }
    }
    Ok(())
}

fn execute(mut scenario: Scenario) -> Result<(), Error> {
    let mut engine = ArbEngine::new(scenario.config.clone())?;
    let owner = engine.owner();
    match engine.execute_batch(
        &mut scenario.chain,
        owner,
        &scenario.paths,
        scenario.deadline,
    ) {
        Ok(outputs) => {
            for (i, ((request, recipient), out)) in
                scenario.paths.iter().zip(&outputs).enumerate()
            {
                println!("path {i}: {} -> {out} paid to {recipient}", request.amount_in);
            }
            let config = engine.config();
            println!(
                "engine balance: {}",
                scenario.chain.balance_of(config.base_token, config.address)
            );
            info!("Executed {} path(s)", outputs.len());
        }
        Err(e) => {
            error!("Execution rejected: {e}");
            return Err(e.into());
        }
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    setup_logger().map_err(|e| eyre!("failed to set up logger: {e}"))?;

    let config = Config::from_env()?;
    let cli = Cli::parse();
    match cli.command {
        Commands::Info { scenario } => show_info(&prepare(&config, scenario)?),
        Commands::Simulate {
            scenario,
            stop_after,
        } => simulate(prepare(&config, scenario)?, stop_after),
        Commands::Execute { scenario } => execute(prepare(&config, scenario)?),
    }
}
