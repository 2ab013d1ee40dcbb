use anyhow::{bail, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;

use ticket_to_ride_engine::scoring::FinalScores;
use ticket_to_ride_engine::session::{GameConfig, MAX_PLAYERS, MIN_PLAYERS};
use ticket_to_ride_sessions::bot::play_session;
use ticket_to_ride_sessions::{
    JsonFileStore, MemoryStore, SessionId, SessionRegistry, SnapshotStore,
};

/// Plays Ticket to Ride games between random bots, all sessions in parallel.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of sessions played concurrently
    #[arg(short, long, default_value_t = 4)]
    sessions: usize,

    /// Players per session
    #[arg(short, long, default_value_t = 3)]
    players: usize,

    /// Seed of the first session, the others use the following seeds
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Safety net against games that never end
    #[arg(long, default_value_t = 20_000)]
    max_actions: usize,

    /// Directory where snapshots are written. Kept in memory when omitted.
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct SessionResult {
    session: SessionId,
    seed: u64,
    scores: FinalScores,
}

/// Consecutive seeds starting at `first`, wrapping around past `u64::MAX`.
fn session_seeds(first: u64, count: usize) -> impl Iterator<Item = u64> {
    (0..count as u64).map(move |offset| first.wrapping_add(offset))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = std::str::FromStr::from_str(&args.log_level).unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&args.players) {
        bail!(
            "A game needs between {} and {} players, not {}",
            MIN_PLAYERS,
            MAX_PLAYERS,
            args.players
        );
    }

    let store: Box<dyn SnapshotStore> = match &args.store_dir {
        Some(dir) => {
            log::info!("Writing snapshots to {}", dir.display());
            Box::new(JsonFileStore::new(dir)?)
        }
        None => Box::new(MemoryStore::new()),
    };
    let registry = SessionRegistry::new(store);

    let names: Vec<String> = (0..args.players)
        .map(|index| format!("bot {}", index + 1))
        .collect();
    let mut sessions = Vec::with_capacity(args.sessions);
    for seed in session_seeds(args.seed, args.sessions) {
        let config = GameConfig {
            seed,
            ..GameConfig::default()
        };
        sessions.push((registry.create(names.clone(), config)?, seed));
    }

    log::info!("Playing {} session(s)...", sessions.len());

    let results: Vec<Result<SessionResult>> = std::thread::scope(|scope| {
        let handles: Vec<_> = sessions
            .iter()
            .map(|&(session, seed)| {
                let registry = &registry;
                let max_actions = args.max_actions;
                scope.spawn(move || -> Result<SessionResult> {
                    let mut rng = ChaCha8Rng::seed_from_u64(seed);
                    let scores = play_session(registry, &session, &mut rng, max_actions)?;
                    Ok(SessionResult {
                        session,
                        seed,
                        scores,
                    })
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(_) => bail!("A session thread panicked"),
            })
            .collect()
    });
    let results = results.into_iter().collect::<Result<Vec<_>>>()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for result in &results {
        println!("Session {} (seed {})", result.session, result.seed);
        for (rank, score) in result.scores.ranking.iter().enumerate() {
            let winner = if result.scores.winners.contains(&score.player) {
                " *"
            } else {
                ""
            };
            println!(
                "  {}. {:<8} {:>4} pts (routes {}, tickets {} with {} completed, longest path {}){}",
                rank + 1,
                score.name,
                score.total,
                score.route_points,
                score.ticket_points,
                score.completed_tickets,
                score.longest_path,
                winner
            );
        }
    }

    log::info!("Simulation finished");

    Ok(())
}
