//! Console input handling
//!
//! Plain lines are sent to the engine verbatim. Lines starting with `:` are
//! shortcuts for the common protocol commands and console controls.

use std::path::PathBuf;

use fen4term::EngineCommand;

/// What the console should do with one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    /// Send these commands in order
    Send(Vec<EngineCommand>),
    /// Stop and respawn the engine
    Restart,
    /// Print the configured engine
    ShowEngine,
    /// Start a different engine executable
    SwitchEngine(PathBuf),
    /// Leave the console
    Exit,
    Help,
    /// Blank input
    Nothing,
    /// Unrecognized `:` shortcut
    Unknown(String),
}

pub const HELP: &str = "\
Shortcuts:
  :uci                 uci
  :isready             isready
  :new                 ucinewgame
  :startpos            position startpos, then d
  :go [DEPTH]          go depth DEPTH (default from config)
  :board               d
  :stop                stop
  :restart             restart the engine
  :engine [PATH]       show the engine, or switch to PATH and start it
  :quit, :exit         stop the engine and exit
  :help                this text
Anything else is sent to the engine as typed.";

/// Interpret one line of console input.
pub fn parse_input(line: &str, go_depth: u32) -> ConsoleAction {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleAction::Nothing;
    }

    let Some(shortcut) = line.strip_prefix(':') else {
        return ConsoleAction::Send(vec![EngineCommand::Raw(line.to_string())]);
    };

    let mut words = shortcut.split_whitespace();
    let name = words.next().unwrap_or("").to_lowercase();
    match name.as_str() {
        "uci" => ConsoleAction::Send(vec![EngineCommand::Uci]),
        "isready" => ConsoleAction::Send(vec![EngineCommand::IsReady]),
        "new" | "ucinewgame" => ConsoleAction::Send(vec![EngineCommand::UciNewGame]),
        "startpos" => ConsoleAction::Send(vec![
            EngineCommand::StartPosition,
            EngineCommand::Display,
        ]),
        "go" => match words.next().map(str::parse::<u32>) {
            None => ConsoleAction::Send(vec![EngineCommand::GoDepth(go_depth)]),
            Some(Ok(depth)) if depth > 0 => ConsoleAction::Send(vec![EngineCommand::GoDepth(depth)]),
            Some(_) => ConsoleAction::Unknown(line.to_string()),
        },
        "board" | "d" => ConsoleAction::Send(vec![EngineCommand::Display]),
        "stop" => ConsoleAction::Send(vec![EngineCommand::Stop]),
        "restart" => ConsoleAction::Restart,
        "engine" => match words.next() {
            None => ConsoleAction::ShowEngine,
            Some(_) => {
                // Keep spaces inside the path.
                let path = shortcut.trim_start().get(name.len()..).unwrap_or("").trim();
                ConsoleAction::SwitchEngine(PathBuf::from(path))
            }
        },
        "quit" | "exit" | "q" => ConsoleAction::Exit,
        "help" | "h" | "?" => ConsoleAction::Help,
        _ => ConsoleAction::Unknown(line.to_string()),
    }
}
