//! Headless Battle Simulator
//!
//! Runs AI vs AI battles and prints the battle report as JSON or text.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hex_tactics::battle::{
    Abilities, AiPersonality, BattleAi, BattleReport, CombatResolver, CreatureProfile, HexCoord,
    Roster, StackSpec, TacticalAi,
};
use hex_tactics::core::BattleConfig;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Headless Battle Simulator - AI vs AI stack combat
#[derive(Parser, Debug)]
#[command(name = "battle_sim")]
#[command(about = "Run an AI vs AI hex battle and report the outcome")]
struct Args {
    /// Battle rules TOML (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Attacker roster TOML (built-in roster when omitted)
    #[arg(long)]
    attacker: Option<PathBuf>,

    /// Defender roster TOML (built-in roster when omitted)
    #[arg(long)]
    defender: Option<PathBuf>,

    /// AI personality TOML used by both sides
    #[arg(long)]
    personality: Option<PathBuf>,

    /// Maximum rounds before the battle is called a draw
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every battle event to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct SimResult {
    seed: u64,
    commands: usize,
    report: BattleReport,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hex_tactics=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let seed = args.seed.unwrap_or_else(rand::random);

    let config = match &args.config {
        Some(path) => BattleConfig::load(path).map_err(|e| format!("{:?}: {}", path, e))?,
        None => BattleConfig::default(),
    };
    let max_rounds = args.max_rounds.unwrap_or(config.turns.max_rounds);

    let attacker = load_roster(args.attacker.as_ref(), default_attacker)?;
    let defender = load_roster(args.defender.as_ref(), default_defender)?;
    let personality = match &args.personality {
        Some(path) => AiPersonality::load(path).map_err(|e| format!("{:?}: {}", path, e))?,
        None => AiPersonality::default(),
    };

    let obstacles = [HexCoord::new(8, 3), HexCoord::new(8, 4), HexCoord::new(7, 7)];
    let mut resolver = CombatResolver::initialize_battle(
        &attacker,
        &defender,
        obstacles,
        config,
        ChaCha8Rng::seed_from_u64(seed),
    )
    .map_err(|e| e.to_string())?;

    let mut ais = [
        TacticalAi::new(personality.clone()),
        TacticalAi::new(personality),
    ];
    let mut commands = 0;

    while !resolver.is_finished() {
        if resolver.state().round > max_rounds {
            resolver.declare_draw().map_err(|e| e.to_string())?;
            break;
        }

        let Some(actor) = resolver.current_actor().and_then(|id| resolver.state().unit(id)) else {
            break;
        };
        let side = actor.side;
        let ai = &mut ais[side.index()];

        let Some(command) =
            ai.choose_action(resolver.state(), resolver.config(), resolver.pathfinder())
        else {
            break;
        };
        let events = resolver
            .execute_action(command)
            .map_err(|e| format!("{} rejected: {}", command.kind, e))?;
        commands += 1;

        if args.verbose {
            for event in events.iter() {
                eprintln!("  [round {}] {}", event.round, event.description);
            }
        }
    }

    let report = resolver.report();
    match args.format.as_str() {
        "text" => print_text(seed, &report),
        _ => {
            let result = SimResult {
                seed,
                commands,
                report,
            };
            let json = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn load_roster(path: Option<&PathBuf>, fallback: fn() -> Roster) -> Result<Roster, String> {
    match path {
        Some(path) => Roster::load(path).map_err(|e| format!("{:?}: {}", path, e)),
        None => Ok(fallback()),
    }
}

fn print_text(seed: u64, report: &BattleReport) {
    println!("Seed: {}", seed);
    match report.outcome {
        Some(outcome) => println!(
            "Outcome: {} ({:?}) after {} rounds",
            outcome
                .winner
                .map(|s| s.to_string())
                .unwrap_or_else(|| "nobody".to_string()),
            outcome.reason,
            report.rounds
        ),
        None => println!("Outcome: unfinished"),
    }
    for side in [&report.attacker, &report.defender] {
        println!("{}:", side.side);
        for survivor in &side.survivors {
            println!("  {:<12} {:>4} left", survivor.name, survivor.count);
        }
        println!("  lost {} individuals", side.individuals_lost);
    }
    println!("Experience: {}", report.experience);
}

fn default_attacker() -> Roster {
    Roster::new(vec![
        StackSpec::new(CreatureProfile::new("Pikeman", 4, 5, 4, 10, 1, 3), 20, 0),
        StackSpec::new(
            CreatureProfile::new("Archer", 6, 3, 4, 10, 2, 3).with_shots(12),
            12,
            2,
        ),
        StackSpec::new(
            CreatureProfile::new("Griffin", 8, 8, 6, 25, 3, 6)
                .double_wide()
                .with_abilities(Abilities {
                    flying: true,
                    ..Abilities::default()
                }),
            6,
            3,
        ),
        StackSpec::new(
            CreatureProfile::new("Cavalier", 15, 15, 7, 100, 15, 25)
                .double_wide()
                .with_fortune(1, 0)
                .with_abilities(Abilities {
                    jousting: true,
                    ..Abilities::default()
                }),
            2,
            6,
        ),
    ])
}

fn default_defender() -> Roster {
    Roster::new(vec![
        StackSpec::new(CreatureProfile::new("Imp", 2, 3, 5, 4, 1, 2), 40, 0),
        StackSpec::new(
            CreatureProfile::new("Gog", 6, 4, 4, 13, 2, 4).with_shots(12),
            10,
            2,
        ),
        StackSpec::new(
            CreatureProfile::new("Hell Hound", 10, 6, 7, 25, 2, 7)
                .double_wide()
                .with_fortune(0, 1),
            8,
            3,
        ),
        StackSpec::new(CreatureProfile::new("Pit Fiend", 13, 13, 6, 45, 13, 17), 3, 5),
    ])
}

