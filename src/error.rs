//! Error types for engine sessions.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The engine process could not be created.
    #[error("Could not start engine {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A command could not be delivered. The session keeps its state;
    /// further sends fail the same way until it is restarted.
    #[error("Failed to send {command:?}: {source}")]
    Write {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    pub(crate) fn not_running(command: &str) -> Self {
        SessionError::Write {
            command: command.to_string(),
            source: io::Error::new(io::ErrorKind::NotConnected, "engine is not running"),
        }
    }

    /// True for failures reported by `send`.
    pub fn is_write(&self) -> bool {
        matches!(self, SessionError::Write { .. })
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
