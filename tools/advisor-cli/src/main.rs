//! Squad Advisor CLI
//!
//! Front end over the engine crates:
//! - score: points for one player's match statistics
//! - subs: automatic substitutions and the gameweek total
//! - optimize: fresh squad build or transfer suggestions
//! - plan: multi-gameweek transfer and chip plan

mod config;
mod logging;
mod render;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use chip_tracker::ChipTracker;
use gameweek_planner::{GameweekPlanner, PlanState};
use points_engine::{Appearances, ScoringCalculator, SubstitutionResolver};
use squad_model::{
    ChipKind, Gameweek, Lineup, MatchStats, PlayerCatalogue, PlayerId, Position, Price, Squad,
};
use squad_optimizer::{Objective, OptimizeRequest, SquadOptimizer, ValueTable};
use transfer_ledger::TransferLedger;

use config::AdvisorConfig;

#[derive(Parser)]
#[command(name = "advisor-cli")]
#[command(about = "Squad advisor - scoring, substitutions, squad optimisation and transfer planning")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Points for one player's match statistics
    Score {
        /// Playing position (GK, DEF, MID, FWD)
        #[arg(short, long, value_parser = parse_position)]
        position: Position,

        /// JSON file with the match statistics
        #[arg(short, long)]
        stats: PathBuf,
    },

    /// Resolve automatic substitutions and the gameweek total
    Subs {
        /// Player catalogue JSON with match histories
        #[arg(long)]
        catalogue: PathBuf,

        /// Lineup JSON (starters, bench, captain, vice_captain)
        #[arg(long)]
        lineup: PathBuf,

        #[arg(short, long)]
        gameweek: Gameweek,

        #[arg(long, value_parser = parse_chip)]
        chip: Option<ChipKind>,
    },

    /// Build a fresh squad, or suggest transfers for an existing one
    Optimize {
        /// Player catalogue JSON with projections
        #[arg(long)]
        catalogue: PathBuf,

        /// Current squad JSON; omit for a fresh build
        #[arg(long)]
        squad: Option<PathBuf>,

        #[arg(short, long)]
        gameweek: Gameweek,

        /// Gameweeks of projections to optimise over
        #[arg(short, long, default_value = "1")]
        window: u16,

        /// Budget in tenths for a fresh build
        #[arg(short, long)]
        budget: Option<i32>,

        /// Free transfers banked before this gameweek
        #[arg(short, long, default_value = "1")]
        free_transfers: u8,

        /// Player ids that must stay in the squad
        #[arg(short, long)]
        lock: Vec<u32>,

        #[arg(long, value_parser = parse_chip)]
        chip: Option<ChipKind>,
    },

    /// Plan transfers and chips over the next gameweeks
    Plan {
        #[arg(long)]
        catalogue: PathBuf,

        #[arg(long)]
        squad: PathBuf,

        /// Open gameweek (next deadline)
        #[arg(short, long)]
        gameweek: Gameweek,

        #[arg(short, long, default_value = "1")]
        free_transfers: u8,

        #[arg(long, default_value = "5")]
        horizon: u16,

        /// Chips already played, as kind@gameweek (e.g. wildcard@3)
        #[arg(long, value_parser = parse_used_chip)]
        used: Vec<(ChipKind, Gameweek)>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn parse_position(s: &str) -> Result<Position, String> {
    s.parse::<Position>().map_err(|e| e.to_string())
}

fn parse_chip(s: &str) -> Result<ChipKind, String> {
    match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
        "wildcard" | "wc" => Ok(ChipKind::Wildcard),
        "freehit" | "fh" => Ok(ChipKind::FreeHit),
        "benchboost" | "bb" => Ok(ChipKind::BenchBoost),
        "triplecaptain" | "tc" => Ok(ChipKind::TripleCaptain),
        other => Err(format!("unknown chip '{other}'")),
    }
}

fn parse_used_chip(s: &str) -> Result<(ChipKind, Gameweek), String> {
    let (kind, gameweek) =
        s.split_once('@').ok_or_else(|| format!("expected kind@gameweek, got '{s}'"))?;
    let gameweek = gameweek.parse().map_err(|_| format!("invalid gameweek in '{s}'"))?;
    Ok((parse_chip(kind)?, gameweek))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn read_catalogue(path: &Path) -> Result<PlayerCatalogue> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    PlayerCatalogue::from_json_str(&content)
        .with_context(|| format!("Invalid catalogue {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AdvisorConfig::load(cli.config.as_deref())?;
    logging::initialize_logging(&config.logging.level, &config.logging.format)?;

    match cli.command {
        Commands::Score { position, stats } => run_score(&config, cli.json, position, &stats),
        Commands::Subs { catalogue, lineup, gameweek, chip } => {
            run_subs(&config, cli.json, &catalogue, &lineup, gameweek, chip)
        }
        Commands::Optimize {
            catalogue,
            squad,
            gameweek,
            window,
            budget,
            free_transfers,
            lock,
            chip,
        } => {
            let catalogue = read_catalogue(&catalogue)?;
            let squad: Option<Squad> = squad.as_deref().map(read_json).transpose()?;
            let options = OptimizeOptions {
                gameweek,
                window,
                budget: budget.map(Price::from_tenths),
                free_transfers,
                locked: lock.into_iter().map(PlayerId).collect(),
                chip,
            };
            run_optimize(&config, cli.json, &catalogue, squad.as_ref(), &options)
        }
        Commands::Plan { catalogue, squad, gameweek, free_transfers, horizon, used } => {
            let catalogue = read_catalogue(&catalogue)?;
            let squad: Squad = read_json(&squad)?;
            run_plan(&config, cli.json, &catalogue, squad, gameweek, free_transfers, horizon, &used)
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn run_score(config: &AdvisorConfig, json: bool, position: Position, stats: &Path) -> Result<()> {
    let stats: MatchStats = read_json(stats)?;
    let calculator = ScoringCalculator::new(config.scoring.clone())?;
    let breakdown = calculator.breakdown(position, &stats)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&breakdown)?);
    } else {
        render::breakdown(position, &breakdown);
    }
    Ok(())
}

fn run_subs(
    config: &AdvisorConfig,
    json: bool,
    catalogue: &Path,
    lineup: &Path,
    gameweek: Gameweek,
    chip: Option<ChipKind>,
) -> Result<()> {
    let catalogue = read_catalogue(catalogue)?;
    let lineup: Lineup = read_json(lineup)?;
    let appearances = Appearances::from_catalogue(&catalogue, gameweek);
    let resolved = SubstitutionResolver::new(config.squad.formation).resolve(&lineup, &appearances)?;

    let calculator = ScoringCalculator::new(config.scoring.clone())?;
    let mut points = BTreeMap::new();
    for id in lineup.player_ids() {
        points.insert(id, calculator.compute_player_points(catalogue.player(id)?, gameweek)?);
    }
    let total = resolved.gameweek_points(&points, chip);
    info!(gameweek, total, substitutions = resolved.substitutions.len(), "gameweek resolved");

    if json {
        let output = serde_json::json!({ "lineup": resolved, "points": points, "total": total });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        render::final_lineup(&catalogue, &resolved, &points, total);
    }
    Ok(())
}

struct OptimizeOptions {
    gameweek: Gameweek,
    window: u16,
    budget: Option<Price>,
    free_transfers: u8,
    locked: Vec<PlayerId>,
    chip: Option<ChipKind>,
}

fn run_optimize(
    config: &AdvisorConfig,
    json: bool,
    catalogue: &PlayerCatalogue,
    squad: Option<&Squad>,
    options: &OptimizeOptions,
) -> Result<()> {
    if options.window == 0 {
        bail!("window must be at least one gameweek");
    }
    let objective = Objective::window(options.gameweek, options.window).with_chip(options.chip);
    let table = ValueTable::build(catalogue, &objective.gameweeks);
    let optimizer = SquadOptimizer::new(config.squad, config.optimizer.clone())?;

    let mut ledger =
        TransferLedger::with_balance(config.ledger, options.gameweek, options.free_transfers)?;
    if let Some(chip) = options.chip {
        ledger.apply_chip_override(chip);
    }
    let request = match squad {
        Some(squad) => {
            OptimizeRequest::transfers(catalogue, &table, squad, Some(&ledger), objective)
        }
        None => {
            let budget = options.budget.unwrap_or(config.squad.budget_cap);
            OptimizeRequest::fresh(catalogue, &table, budget, objective)
        }
    }
    .with_locked(options.locked.iter().copied());

    let selection = optimizer.optimize(&request)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
    } else {
        render::selection(catalogue, &selection, options.gameweek);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_plan(
    config: &AdvisorConfig,
    json: bool,
    catalogue: &PlayerCatalogue,
    squad: Squad,
    gameweek: Gameweek,
    free_transfers: u8,
    horizon: u16,
    used: &[(ChipKind, Gameweek)],
) -> Result<()> {
    let mut chips = ChipTracker::new(config.calendar.clone());
    for (kind, played) in used {
        chips.commit(*kind, *played).with_context(|| format!("Cannot record {kind}@{played}"))?;
    }
    let state = PlanState {
        squad,
        ledger: TransferLedger::with_balance(config.ledger, gameweek, free_transfers)?,
        chips,
    };
    let planner =
        GameweekPlanner::new(config.squad, config.optimizer.clone(), config.planner.clone())?;
    let plan = planner.plan(state, catalogue, horizon)?;

    if json {
        println!("{}", plan.to_json()?);
    } else {
        render::plan(catalogue, &plan);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_names() {
        assert_eq!(parse_chip("Wildcard"), Ok(ChipKind::Wildcard));
        assert_eq!(parse_chip("free-hit"), Ok(ChipKind::FreeHit));
        assert_eq!(parse_chip("BB"), Ok(ChipKind::BenchBoost));
        assert_eq!(parse_chip("triple_captain"), Ok(ChipKind::TripleCaptain));
        assert!(parse_chip("power-play").is_err());
    }

    #[test]
    fn test_used_chip_syntax() {
        assert_eq!(parse_used_chip("fh@12"), Ok((ChipKind::FreeHit, 12)));
        assert!(parse_used_chip("fh12").is_err());
        assert!(parse_used_chip("fh@x").is_err());
    }

    #[test]
    fn test_cli_parses_plan_arguments() {
        let cli = Cli::try_parse_from([
            "advisor-cli",
            "plan",
            "--catalogue",
            "players.json",
            "--squad",
            "squad.json",
            "-g",
            "7",
            "--used",
            "wildcard@3",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Plan { gameweek, horizon, used, .. } => {
                assert_eq!(gameweek, 7);
                assert_eq!(horizon, 5);
                assert_eq!(used, vec![(ChipKind::Wildcard, 3)]);
            }
            _ => panic!("expected plan command"),
        }
    }
}
