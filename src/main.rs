// Tournament driver for the Isolation agent
//
// Usage:
//   cargo run --release -- [options]
//
// Options:
//   --config <path>   Path to Isolation.toml (default: Isolation.toml)
//   --games <n>       Override [tournament] games
//   --seed <n>        Override [tournament] seed
//   --help            Show usage

use log::{error, info};
use std::env;
use std::process;
use std::time::Instant;

use isolation_agent::config::Config;
use isolation_agent::debug_logger::DebugLogger;
use isolation_agent::game::run_tournament;
use isolation_agent::simple_profiler;

fn print_usage() {
    eprintln!("Isolation Agent Tournament");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  isolation [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --config <path>   Path to Isolation.toml (default: Isolation.toml)");
    eprintln!("  --games <n>       Number of games to play");
    eprintln!("  --seed <n>        Seed for random openings");
    eprintln!("  --help            Show this help message");
    eprintln!();
    eprintln!("Set ISOLATION_PROFILE=1 for a performance report on stderr.");
}

struct Args {
    config_path: Option<String>,
    games: Option<usize>,
    seed: Option<u64>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config_path: None,
        games: None,
        seed: None,
    };
    let mut iter = env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                args.config_path = Some(iter.next().ok_or("--config requires a path")?);
            }
            "--games" => {
                let value = iter.next().ok_or("--games requires a number")?;
                args.games = Some(
                    value
                        .parse()
                        .map_err(|e| format!("Invalid game count '{}': {}", value, e))?,
                );
            }
            "--seed" => {
                let value = iter.next().ok_or("--seed requires a number")?;
                args.seed = Some(
                    value
                        .parse()
                        .map_err(|e| format!("Invalid seed '{}': {}", value, e))?,
                );
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
    }

    Ok(args)
}

fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            process::exit(2);
        }
    };

    // An explicit config path must load; the default path may fall back
    let mut config = match &args.config_path {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid configuration '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => Config::load_or_default(),
    };

    if let Some(games) = args.games {
        config.tournament.games = games;
    }
    if let Some(seed) = args.seed {
        config.tournament.seed = seed;
    }

    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path);
    let start = Instant::now();

    match run_tournament(&config, &logger) {
        Ok(report) => {
            info!(
                "Agent ({} {}) vs opponent ({} {}): {} - {}",
                config.agent.method,
                config.agent.heuristic.kind.as_str(),
                config.opponent.method,
                config.opponent.heuristic.kind.as_str(),
                report.agent_wins,
                report.opponent_wins
            );
            simple_profiler::print_report(start.elapsed().as_millis() as u64);
        }
        Err(e) => {
            error!("Could not start tournament: {}", e);
            process::exit(1);
        }
    }
}
