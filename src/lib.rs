//! fen4term - engine session core for four-player chess engines
//!
//! Runs an external engine speaking a UCI-style line protocol, collects its
//! output on a background thread and hands it to a single-threaded caller
//! through a non-blocking pump. `FEN4:<payload>` lines are decoded into a
//! 14x14 [`Board`].
//!
//! ```no_run
//! use fen4term::{EngineConfig, EngineSession};
//!
//! let mut session = EngineSession::new(EngineConfig::new("./build/src/athena"));
//! session.on_log(|line| println!("{}", line));
//! session.on_board(|result| print!("{}", fen4term::render_result(result)));
//! session.start().ok();
//! session.send("uci").ok();
//! loop {
//!     session.poll();
//!     std::thread::sleep(fen4term::DEFAULT_POLL_INTERVAL);
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;

pub use crate::core::command::EngineCommand;
pub use crate::core::fen4::{
    decode, render_result, Board, DecodeResult, Square, StructureError, BOARD_SIZE,
};
pub use crate::core::pump::{OutputPump, TagEvent, TagRule, BOARD_TAG, DEFAULT_POLL_INTERVAL};
pub use crate::core::session::{EngineConfig, EngineSession, SessionState};
pub use crate::error::SessionError;
