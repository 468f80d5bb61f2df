//! Headless cave encounter
//!
//! Plays a seeded encounter with a scripted party and prints every combat
//! event, as text or as JSON lines.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crpg_core::driver::{DriveOutcome, FixedDelay, Immediate, Pacer, drive_boss_turn};
use crpg_core::status::BuffId;
use crpg_core::{
    Attributes, Boss, BossKind, Cell, CombatConfig, CombatEvent, GameRng, Player, PlayerId, TurnEngine,
};

/// Corruption RPG cave encounter, played by a script
#[derive(Parser, Debug)]
#[command(name = "crpg-sim")]
#[command(author, version, about = "Simulate a boss encounter and print the combat log", long_about = None)]
struct Args {
    /// RNG seed
    #[arg(short = 's', long = "seed", default_value_t = 42)]
    seed: u64,

    /// Party size
    #[arg(short = 'p', long = "players", default_value_t = 2)]
    players: u32,

    /// Stop after this many rounds
    #[arg(short = 'r', long = "rounds", default_value_t = 20)]
    rounds: u32,

    /// Boss to fight (bear, dragon)
    #[arg(short = 'b', long = "boss", default_value = "bear")]
    boss: BossKind,

    /// JSON file overriding combat tuning
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Pause between boss steps, in milliseconds
    #[arg(long = "delay-ms", default_value_t = 0)]
    delay_ms: u64,

    /// Print events as JSON lines
    #[arg(long = "json")]
    json: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    BossDefeated,
    PartyDefeated,
    RoundLimit,
    Aborted,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let default = if args.verbose { "crpg=debug" } else { "crpg=info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?)
        .init();

    let config = match &args.config {
        Some(path) => CombatConfig::load(path)?,
        None => CombatConfig::default(),
    };
    config.validate()?;

    let mut rng = GameRng::new(args.seed);
    let boss = Boss::spawn(args.boss, Cell::new(8, 8), &mut rng);
    let party = build_party(args.players.max(1));
    info!(seed = args.seed, boss = %boss.name, players = party.len(), "encounter starting");

    let mut engine = TurnEngine::new(party, boss, config, rng);
    let json = args.json;
    engine.subscribe(Box::new(move |event: &CombatEvent| print_event(event, json)));

    engine.start();
    engine.flush_events();

    let mut pacer: Box<dyn Pacer> = if args.delay_ms > 0 {
        Box::new(FixedDelay(Duration::from_millis(args.delay_ms)))
    } else {
        Box::new(Immediate)
    };

    let ending = loop {
        if let Some(ending) = check_ending(&engine, args.rounds) {
            break ending;
        }
        if engine.boss_turn_pending() {
            let outcome = drive_boss_turn(&mut engine, pacer.as_mut());
            engine.flush_events();
            if let DriveOutcome::Aborted { .. } = outcome {
                break Ending::Aborted;
            }
            continue;
        }
        let Some(idx) = engine.state().active_player() else {
            warn!("no active player and no boss turn pending");
            break Ending::Aborted;
        };
        play_turn(&mut engine, idx);
        engine.flush_events();
    };

    let state = engine.state();
    info!(
        ?ending,
        round = state.round,
        boss_hp = state.boss.hp,
        "encounter finished"
    );
    if json {
        println!("{}", serde_json::to_string(&engine.snapshot())?);
    } else {
        println!("Result: {ending:?} after {} round(s)", state.round);
    }
    Ok(())
}

/// Alternate Flame elementalists and warriors, lined up on the west wall
fn build_party(n: u32) -> Vec<Player> {
    (0..n)
        .map(|i| {
            let id = PlayerId(i + 1);
            let pos = Cell::new(1, 2 + 2 * i as i32);
            if i % 2 == 0 {
                let attrs = Attributes {
                    pow: 12,
                    def: 10,
                    sup: 8,
                };
                Player::new(id, format!("Pyro{}", i + 1), "ELEMENTALIST", "Flame", attrs).at(pos)
            } else {
                Player::new(id, format!("Brute{}", i + 1), "WARRIOR", "Brutality", Attributes::default())
                    .at(pos)
            }
        })
        .collect()
}

fn check_ending(engine: &TurnEngine, max_rounds: u32) -> Option<Ending> {
    let state = engine.state();
    if !state.is_active() {
        Some(Ending::Aborted)
    } else if !state.boss.is_alive() {
        Some(Ending::BossDefeated)
    } else if state.party_defeated() {
        Some(Ending::PartyDefeated)
    } else if state.round > max_rounds {
        Some(Ending::RoundLimit)
    } else {
        None
    }
}

/// Walk toward the boss, prime Inferno every other round, cast Burn, end turn.
///
/// Rejections are part of the log; the script just carries on.
fn play_turn(engine: &mut TurnEngine, idx: usize) {
    if engine.state().players[idx].is_alive() {
        if engine.roll_movement().is_ok() {
            if let Some(dest) = closest_destination(engine) {
                let _ = engine.move_to(dest);
            }
        }

        let state = engine.state();
        let holding = state.players[idx].buffs.has(BuffId::Inferno);
        if !holding && state.round % 2 == 0 {
            let _ = engine.toggle_inferno();
        }

        let origin = engine.state().players[idx].pos;
        let metric = engine.config().range_metric;
        let target = engine
            .state()
            .boss
            .footprint
            .cells()
            .min_by_key(|&cell| metric.distance(origin, cell));
        if let Some(target) = target {
            let _ = engine.cast_burn(target);
        }
    }
    if let Err(err) = engine.manual_end_turn() {
        warn!(%err, "manual end turn refused");
    }
}

/// Reachable cell closest to the boss by the range metric
fn closest_destination(engine: &TurnEngine) -> Option<Cell> {
    let state = engine.state();
    let metric = engine.config().range_metric;
    let footprint = state.boss.footprint;
    let distance = |cell: Cell| {
        footprint
            .cells()
            .map(|c| metric.distance(cell, c))
            .min()
            .unwrap_or(i32::MAX)
    };
    engine
        .reachable_destinations()
        .into_iter()
        .min_by_key(|d| (distance(d.cell), d.cost))
        .map(|d| d.cell)
}

fn print_event(event: &CombatEvent, json: bool) {
    if !json {
        println!("{event}");
        return;
    }
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(err) => warn!(%err, "could not serialize event"),
    }
}
