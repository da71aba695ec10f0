//! Engine session core.
//!
//! - **channel**: line framing over the engine's stdin/stdout
//! - **queue**: FIFO between the reader thread and the pump
//! - **session**: process lifecycle, reader thread, command sending
//! - **pump**: non-blocking dispatch of queued lines to sinks and tag rules
//! - **fen4**: FEN4 board decoding and rendering
//! - **command**: protocol command vocabulary
//!
//! # Architecture
//!
//! ```text
//! EngineSession
//! ├── EngineProcess (child, LineWriter on stdin)
//! ├── reader thread (LineReader on stdout+stderr) ──> QueueProducer
//! ├── OutputQueue
//! └── OutputPump
//!     ├── log sinks
//!     └── TagRule "FEN4" ──> fen4::decode ──> board sinks
//! ```

pub mod channel;
pub mod command;
pub mod fen4;
pub mod pump;
pub mod queue;
pub mod session;
