//! Headless match runner
//!
//! Pits two AI factions against each other on a generated map and prints a
//! summary of the match.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use strategos::core::types::{FactionId, Vec2};
use strategos::strategy::AggressionPosture;
use strategos::world::{BuildingKind, Stockpile, UnitKind, World};
use strategos::{AiConfig, AiCore, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Headless Strategos runner - AI vs AI on a generated map
#[derive(Parser, Debug)]
#[command(name = "strategos")]
#[command(about = "Run two AI factions against each other and report the outcome")]
struct Args {
    /// TOML config; command-line values override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Map width in tiles
    #[arg(long)]
    width: Option<u32>,

    /// Map height in tiles
    #[arg(long)]
    height: Option<u32>,

    /// Terrain seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 3000)]
    ticks: u64,

    /// Milliseconds per tick
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Posture for both factions: aggressive, balanced or defensive
    #[arg(long)]
    posture: Option<String>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Serialize)]
struct FactionSummary {
    faction: u8,
    phase: String,
    units: usize,
    buildings: usize,
    oil: f32,
    steel: f32,
}

#[derive(Serialize)]
struct MatchSummary {
    seed: u64,
    ticks: u64,
    elapsed_ms: u64,
    units_killed: usize,
    buildings_destroyed: usize,
    rejected_mutations: usize,
    factions: Vec<FactionSummary>,
}

const STARTING_ENGINEERS: usize = 4;
const STARTING_STOCKPILE: Stockpile = Stockpile::new(400.0, 300.0);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("strategos=info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(summary) => {
            print_summary(&summary, &args.format);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<AiConfig> {
    let mut config = match &args.config {
        Some(path) => AiConfig::load(path)?,
        None => AiConfig::default(),
    };
    if let Some(width) = args.width {
        config.terrain.width = width;
    }
    if let Some(height) = args.height {
        config.terrain.height = height;
    }
    if let Some(seed) = args.seed {
        config.terrain.seed = seed;
    }
    if let Some(name) = &args.posture {
        match AggressionPosture::parse(name) {
            Some(posture) => config.strategy.posture = posture,
            None => warn!("unknown posture '{}', keeping {:?}", name, config.strategy.posture),
        }
    }
    Ok(config)
}

fn run(args: &Args) -> Result<MatchSummary> {
    let config = load_config(args)?;
    let seed = config.terrain.seed;
    let w = config.terrain.width as f32;
    let h = config.terrain.height as f32;
    let spawns = [Vec2::new(w * 0.15, h * 0.15), Vec2::new(w * 0.85, h * 0.85)];

    let mut core = AiCore::new(config, &spawns)?;
    let mut world = World::new();
    world.set_terrain(core.grid().clone());
    let factions = [FactionId(0), FactionId(1)];
    for (faction, spawn) in factions.iter().zip(spawns) {
        seed_faction(&mut world, *faction, spawn);
        core.add_faction(*faction);
    }

    let mut summary = MatchSummary {
        seed,
        ticks: 0,
        elapsed_ms: 0,
        units_killed: 0,
        buildings_destroyed: 0,
        rejected_mutations: 0,
        factions: Vec::new(),
    };

    for tick in 0..args.ticks {
        let snapshot = world.snapshot();
        let view = snapshot.view();
        let mut mutations = core.update(&view, args.tick_ms)?;
        mutations.extend(core.run_strategic_decisions(&view));

        let report = world.apply(&mutations);
        summary.units_killed += report.units_killed;
        summary.buildings_destroyed += report.buildings_destroyed;
        summary.rejected_mutations += report.rejected;
        world.advance(args.tick_ms);
        summary.ticks = tick + 1;

        let alive = factions.iter().filter(|f| world.building_count(**f) > 0).count();
        if alive < 2 {
            info!(tick, "a faction lost its last building");
            break;
        }
    }

    summary.elapsed_ms = core.now_ms();
    summary.factions = factions
        .iter()
        .map(|f| {
            let stockpile = world.stockpile(*f);
            FactionSummary {
                faction: f.0,
                phase: core
                    .planner(*f)
                    .map(|p| format!("{:?}", p.phase()))
                    .unwrap_or_default(),
                units: world.unit_count(*f),
                buildings: world.building_count(*f),
                oil: stockpile.oil,
                steel: stockpile.steel,
            }
        })
        .collect();
    Ok(summary)
}

fn seed_faction(world: &mut World, faction: FactionId, spawn: Vec2) {
    world.spawn_building(faction, BuildingKind::Headquarters, spawn, true);
    for i in 0..STARTING_ENGINEERS {
        let angle = i as f32 * std::f32::consts::TAU / STARTING_ENGINEERS as f32;
        let offset = Vec2::new(angle.cos() * 4.0, angle.sin() * 4.0);
        world.spawn_unit(faction, UnitKind::Engineer, spawn + offset);
    }
    world.set_stockpile(faction, STARTING_STOCKPILE);
}

fn print_summary(summary: &MatchSummary, format: &str) {
    if format == "json" {
        match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("error: {err}"),
        }
        return;
    }

    println!("=== Strategos match (seed {}) ===", summary.seed);
    println!("Ticks: {} ({} ms)", summary.ticks, summary.elapsed_ms);
    println!(
        "Kills: {} units, {} buildings ({} mutations rejected)",
        summary.units_killed, summary.buildings_destroyed, summary.rejected_mutations
    );
    for f in &summary.factions {
        println!(
            "Faction {}: phase {}, {} units, {} buildings, oil {:.0}, steel {:.0}",
            f.faction, f.phase, f.units, f.buildings, f.oil, f.steel
        );
    }
}
