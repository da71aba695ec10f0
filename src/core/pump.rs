//! Output pump
//!
//! Called from the owner's event loop on a fixed tick. Each step drains every
//! line queued by the reader, forwards it to the log sinks and runs it
//! through an ordered list of tag rules. A rule fires on lines of the form
//! `<TAG>:<payload>`; the first matching rule wins. Lines no rule claims are
//! only logged.

use std::time::Duration;

use super::fen4::{self, DecodeResult};
use super::queue::OutputQueue;

/// Tag of the board update line, `FEN4:<payload>`.
pub const BOARD_TAG: &str = "FEN4";

/// Default pump cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What a tag rule produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    Board(DecodeResult),
}

/// Maps one tag to a handler for its payload.
pub struct TagRule {
    tag: String,
    handler: fn(&str) -> TagEvent,
}

impl TagRule {
    pub fn new(tag: impl Into<String>, handler: fn(&str) -> TagEvent) -> Self {
        Self {
            tag: tag.into(),
            handler,
        }
    }

    /// `FEN4:<payload>` -> board decode.
    pub fn board() -> Self {
        Self::new(BOARD_TAG, |payload| TagEvent::Board(fen4::decode(payload)))
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Payload of `line` if it carries this rule's tag. Surrounding
    /// whitespace on the line and on the payload is ignored.
    pub fn payload<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.trim()
            .strip_prefix(self.tag.as_str())?
            .strip_prefix(':')
            .map(str::trim)
    }

    pub fn apply(&self, line: &str) -> Option<TagEvent> {
        self.payload(line).map(self.handler)
    }
}

type LogSink = Box<dyn FnMut(&str)>;
type BoardSink = Box<dyn FnMut(&DecodeResult)>;
type ExitSink = Box<dyn FnMut()>;

/// Dispatches engine output to registered sinks.
pub struct OutputPump {
    rules: Vec<TagRule>,
    log_sinks: Vec<LogSink>,
    board_sinks: Vec<BoardSink>,
    exit_sinks: Vec<ExitSink>,
}

impl Default for OutputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPump {
    /// A pump with the board rule installed.
    pub fn new() -> Self {
        Self {
            rules: vec![TagRule::board()],
            log_sinks: Vec::new(),
            board_sinks: Vec::new(),
            exit_sinks: Vec::new(),
        }
    }

    /// Append a rule; earlier rules take precedence.
    pub fn add_rule(&mut self, rule: TagRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[TagRule] {
        &self.rules
    }

    /// Receive every engine line and session diagnostic.
    pub fn on_log(&mut self, sink: impl FnMut(&str) + 'static) {
        self.log_sinks.push(Box::new(sink));
    }

    /// Receive every decoded board or its diagnostic.
    pub fn on_board(&mut self, sink: impl FnMut(&DecodeResult) + 'static) {
        self.board_sinks.push(Box::new(sink));
    }

    /// Notified once when the engine's output stream ends without a stop.
    pub fn on_exit(&mut self, sink: impl FnMut() + 'static) {
        self.exit_sinks.push(Box::new(sink));
    }

    /// Forward a line to the log sinks.
    pub fn log(&mut self, line: &str) {
        for sink in &mut self.log_sinks {
            sink(line);
        }
    }

    /// Log one line and run the first rule that claims it.
    pub fn handle_line(&mut self, line: &str) {
        self.log(line);

        let event = self.rules.iter().find_map(|rule| rule.apply(line));
        if let Some(TagEvent::Board(result)) = event {
            if let Err(e) = &result {
                tracing::debug!("board payload rejected: {}", e);
            }
            for sink in &mut self.board_sinks {
                sink(&result);
            }
        }
    }

    /// Drain the queue and dispatch every line in arrival order. Never
    /// waits for output. Returns the number of lines delivered.
    pub fn step(&mut self, queue: &mut OutputQueue) -> usize {
        let drained = queue.drain();
        let count = drained.lines.len();

        for line in &drained.lines {
            self.handle_line(line);
        }

        if drained.ended {
            tracing::info!("engine output closed");
            self.log("Engine output closed");
            for sink in &mut self.exit_sinks {
                sink();
            }
        }

        count
    }
}
