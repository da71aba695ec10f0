//! fen4term - a console front-end for four-player chess engines
//!
//! Starts the engine, forwards typed commands to it and prints everything it
//! says. Board updates (`FEN4:` lines) are drawn as a 14x14 grid.
//!
//! # Quick Start
//!
//! ```text
//! fen4term                       # engine from ~/.fen4term/config.toml
//! fen4term -e ./build/src/athena # explicit engine
//! ```
//!
//! Type `:help` at the prompt for the shortcut list.

mod console;

use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;

use crossterm::style::Stylize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fen4term::config::Config;
use fen4term::{render_result, EngineConfig, EngineSession};

use crate::console::{parse_input, ConsoleAction, HELP};

/// Command line overrides
#[derive(Debug, Default)]
struct Args {
    engine: Option<PathBuf>,
    engine_args: Vec<String>,
    poll_interval_ms: Option<u64>,
    go_depth: Option<u32>,
    write_config: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    eprintln!("fen4term {} - console front-end for FEN4 chess engines", VERSION);
    eprintln!();
    eprintln!("Usage: fen4term [OPTIONS] [-- ENGINE_ARGS...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e, --engine <PATH>   Engine executable");
    eprintln!("  -i, --interval <MS>   Output poll interval (default 50)");
    eprintln!("  -d, --depth <N>       Depth used by :go (default 10)");
    eprintln!("      --write-config    Save the effective configuration and exit");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("{}", HELP);
    eprintln!();
    eprintln!("Configuration: ~/.fen4term/config.toml");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                eprintln!("fen4term {}", VERSION);
                std::process::exit(0);
            }
            "-e" | "--engine" => {
                i += 1;
                let path = args.get(i).ok_or("Missing engine path")?;
                parsed.engine = Some(PathBuf::from(path));
            }
            "-i" | "--interval" => {
                i += 1;
                let value = args.get(i).ok_or("Missing interval")?;
                let ms = value
                    .parse()
                    .map_err(|_| format!("Invalid interval: {}", value))?;
                parsed.poll_interval_ms = Some(ms);
            }
            "-d" | "--depth" => {
                i += 1;
                let value = args.get(i).ok_or("Missing depth")?;
                let depth = value
                    .parse()
                    .map_err(|_| format!("Invalid depth: {}", value))?;
                parsed.go_depth = Some(depth);
            }
            "--write-config" => {
                parsed.write_config = true;
            }
            "--" => {
                parsed.engine_args = args[i + 1..].to_vec();
                break;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

fn apply_args(config: &mut Config, args: Args) {
    if let Some(engine) = args.engine {
        config.engine = engine;
    }
    if !args.engine_args.is_empty() {
        config.args = args.engine_args;
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(depth) = args.go_depth {
        config.go_depth = depth;
    }
}

/// Log to `~/.fen4term/fen4term.log`, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    let log_path = Config::config_dir()
        .map(|dir| dir.join("fen4term.log"))
        .unwrap_or_else(|| PathBuf::from("fen4term.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn print_log_line(line: &str) {
    if line.starts_with(">>> ") {
        println!("{}", line.cyan());
    } else if line.starts_with("Failed to send") || line.starts_with("Could not start") {
        println!("{}", line.red());
    } else if line.starts_with("Started engine") || line == "Engine output closed" {
        println!("{}", line.yellow());
    } else {
        println!("{}", line);
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("fen4term starting...");

    let write_config = args.write_config;
    let mut config = Config::load();
    apply_args(&mut config, args);

    if write_config {
        config.save().map_err(anyhow::Error::msg)?;
        eprintln!("Configuration saved");
        return Ok(());
    }

    run(config)
}

fn run(config: Config) -> anyhow::Result<()> {
    let mut session = EngineSession::new(config.engine_config());
    session.on_log(print_log_line);
    session.on_board(|result| {
        let text = render_result(result);
        match result {
            Ok(_) => print!("{}", text.bold()),
            Err(_) => print!("{}", text.red()),
        }
    });
    session.on_exit(|| {
        println!("{}", "Engine has exited; :restart to start it again".yellow());
    });

    // Spawn failures are already reported through the log sink.
    let _ = session.start();

    // stdin blocks, so it gets its own thread; the loop below never waits on it.
    let (input_tx, input_rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in io::stdin().lines() {
                let Ok(line) = line else { break };
                if input_tx.send(line).is_err() {
                    break;
                }
            }
        })?;

    let interval = config.poll_interval();
    'tick: loop {
        loop {
            match input_rx.try_recv() {
                Ok(line) => match parse_input(&line, config.go_depth) {
                    ConsoleAction::Send(commands) => {
                        for command in &commands {
                            // Failures are logged by the session.
                            let _ = session.send_command(command);
                        }
                    }
                    ConsoleAction::Restart => {
                        let _ = session.start();
                    }
                    ConsoleAction::ShowEngine => {
                        println!("Engine: {}", session.config().program.display());
                    }
                    ConsoleAction::SwitchEngine(program) => {
                        let config = EngineConfig {
                            program,
                            ..session.config().clone()
                        };
                        session.set_config(config);
                        let _ = session.start();
                    }
                    ConsoleAction::Exit => break 'tick,
                    ConsoleAction::Help => println!("{}", HELP),
                    ConsoleAction::Nothing => {}
                    ConsoleAction::Unknown(input) => {
                        println!("{}", format!("Unknown shortcut: {} (try :help)", input).red());
                    }
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'tick,
            }
        }

        session.poll();
        thread::sleep(interval);
    }

    session.stop();
    session.poll();
    info!("fen4term exiting");
    Ok(())
}
