//! Output queue between the reader thread and the pump
//!
//! A thin wrapper over `std::sync::mpsc`: unbounded, FIFO, one producer and
//! one consumer. The producer going away is how the consumer learns that the
//! engine's output stream has ended.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Create a connected producer/consumer pair.
pub fn output_queue() -> (QueueProducer, OutputQueue) {
    let (tx, rx) = mpsc::channel();
    (
        QueueProducer { tx },
        OutputQueue {
            rx,
            closed: false,
            stopped: false,
        },
    )
}

/// Producer half, owned by the reader thread.
pub struct QueueProducer {
    tx: Sender<String>,
}

impl QueueProducer {
    /// Push a line. Returns false once the consumer is gone.
    pub fn push(&self, line: String) -> bool {
        self.tx.send(line).is_ok()
    }
}

/// Result of one drain.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Drained {
    /// Lines in arrival order.
    pub lines: Vec<String>,
    /// This drain observed the producer hanging up on its own. Reported once
    /// per queue, after every line the producer pushed, and never for a
    /// queue marked stopped.
    pub ended: bool,
}

/// Consumer half, drained by the pump.
pub struct OutputQueue {
    rx: Receiver<String>,
    closed: bool,
    stopped: bool,
}

impl OutputQueue {
    /// Take every line currently queued without waiting for more.
    pub fn drain(&mut self) -> Drained {
        let mut lines = Vec::new();
        let mut ended = false;
        loop {
            match self.rx.try_recv() {
                Ok(line) => lines.push(line),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    ended = !self.closed && !self.stopped;
                    self.closed = true;
                    break;
                }
            }
        }
        Drained { lines, ended }
    }

    /// True once a drain has observed the producer hanging up.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The owner ended the producer's stream itself; its hang-up is expected
    /// and will not be reported as `ended`.
    pub fn mark_stopped(&mut self) {
        self.stopped = true;
    }
}
