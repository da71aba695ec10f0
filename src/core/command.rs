//! Engine protocol commands
//!
//! Every command is a single line of text. `EngineCommand` covers the ones
//! the console offers as shortcuts; anything else goes through `Raw`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Uci,
    IsReady,
    UciNewGame,
    /// `position startpos`
    StartPosition,
    /// `d`: ask the engine to print the current position (and its FEN4 line)
    Display,
    GoDepth(u32),
    Stop,
    Quit,
    Raw(String),
}

impl EngineCommand {
    /// The protocol line, without terminator.
    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Uci => f.write_str("uci"),
            EngineCommand::IsReady => f.write_str("isready"),
            EngineCommand::UciNewGame => f.write_str("ucinewgame"),
            EngineCommand::StartPosition => f.write_str("position startpos"),
            EngineCommand::Display => f.write_str("d"),
            EngineCommand::GoDepth(depth) => write!(f, "go depth {}", depth),
            EngineCommand::Stop => f.write_str("stop"),
            EngineCommand::Quit => f.write_str("quit"),
            EngineCommand::Raw(line) => f.write_str(line),
        }
    }
}

impl From<&str> for EngineCommand {
    fn from(line: &str) -> Self {
        EngineCommand::Raw(line.to_string())
    }
}
