//! Engine session management
//!
//! Owns the engine process, the reader thread draining its output and the
//! pump that hands that output to the caller.
//!
//! ```text
//! send() ──> LineWriter ──> engine stdin
//! engine stdout+stderr ──> reader thread ──> OutputQueue ──> poll() ──> sinks
//! ```
//!
//! Only the reader thread blocks. Everything else runs on the caller's
//! thread and returns promptly.

use std::io::{self, PipeReader};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::channel::{LineReader, LineWriter};
use super::command::EngineCommand;
use super::fen4::DecodeResult;
use super::pump::{OutputPump, TagRule};
use super::queue::{output_queue, OutputQueue, QueueProducer};
use crate::error::{Result, SessionError};

/// Session lifecycle. Only `Running` accepts commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Running,
    Stopping,
    Stopped,
}

/// How to launch the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Engine executable
    pub program: PathBuf,
    /// Extra command line arguments
    pub args: Vec<String>,
    /// Echo each sent command to the log sinks as `>>> cmd`
    pub echo_commands: bool,
}

impl EngineConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            echo_commands: true,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// A running engine process and its streams.
struct EngineProcess {
    child: Child,
    writer: LineWriter<ChildStdin>,
    reader_thread: JoinHandle<()>,
}

impl EngineProcess {
    fn spawn(config: &EngineConfig, producer: QueueProducer) -> io::Result<Self> {
        // stdout and stderr share one pipe so the reader sees a single stream.
        let (output_read, output_write) = io::pipe()?;
        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(output_write.try_clone()?)
            .stderr(output_write)
            .spawn()?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "engine stdin unavailable",
            ));
        };

        let reader_thread = match spawn_reader(LineReader::new(output_read), producer) {
            Ok(handle) => handle,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        Ok(Self {
            child,
            writer: LineWriter::new(stdin),
            reader_thread,
        })
    }

    /// Ask the engine to quit, then terminate it. Errors are ignored.
    fn terminate(mut self) {
        let _ = self.writer.send_line(&EngineCommand::Quit.line());

        if !matches!(self.child.try_wait(), Ok(Some(_))) {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();

        self.join_reader();
    }

    /// The reader finishes by itself once the output pipe reaches end of data.
    fn join_reader(self) {
        if self.reader_thread.is_finished() {
            let _ = self.reader_thread.join();
        }
    }
}

/// Read lines until end of data or a read error, pushing each one.
fn spawn_reader(
    reader: LineReader<PipeReader>,
    producer: QueueProducer,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("engine-reader".to_string())
        .spawn(move || {
            for line in reader {
                match line {
                    Ok(line) => {
                        if !producer.push(line) {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("engine read error: {}", e);
                        break;
                    }
                }
            }
            debug!("engine reader exiting");
        })
}

/// A session with one external engine.
pub struct EngineSession {
    config: EngineConfig,
    state: SessionState,
    process: Option<EngineProcess>,
    queue: Option<OutputQueue>,
    /// Queues of replaced engines, drained until their readers finish.
    retired: Vec<OutputQueue>,
    pump: OutputPump,
}

impl EngineSession {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: SessionState::NotStarted,
            process: None,
            queue: None,
            retired: Vec::new(),
            pump: OutputPump::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Launch settings for the next `start()`. A running engine is not affected.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// True once the current engine's output stream has been seen to end.
    pub fn has_exited(&self) -> bool {
        self.queue.as_ref().is_some_and(OutputQueue::is_closed)
    }

    /// OS process id of the engine until it is stopped or reaped.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(|p| p.child.id())
    }

    /// Register a sink for engine lines and session diagnostics.
    pub fn on_log(&mut self, sink: impl FnMut(&str) + 'static) {
        self.pump.on_log(sink);
    }

    /// Register a sink for decoded boards (or their diagnostics).
    pub fn on_board(&mut self, sink: impl FnMut(&DecodeResult) + 'static) {
        self.pump.on_board(sink);
    }

    /// Register a sink notified when the engine's output ends.
    pub fn on_exit(&mut self, sink: impl FnMut() + 'static) {
        self.pump.on_exit(sink);
    }

    /// Add a tag rule after the built-in board rule.
    pub fn add_rule(&mut self, rule: TagRule) {
        self.pump.add_rule(rule);
    }

    /// Spawn the engine and start reading its output.
    ///
    /// A running session is stopped first. On failure the state is left as
    /// it was (`NotStarted` or `Stopped`) and the error is also logged once.
    pub fn start(&mut self) -> Result<()> {
        if self.state == SessionState::Running {
            self.stop();
        }
        // Lines the previous engine left behind are still delivered by poll().
        if let Some(queue) = self.queue.take() {
            if !queue.is_closed() {
                self.retired.push(queue);
            }
        }

        let (producer, queue) = output_queue();
        match EngineProcess::spawn(&self.config, producer) {
            Ok(process) => {
                info!(
                    "engine started: {} (pid {})",
                    self.config.program.display(),
                    process.child.id()
                );
                self.process = Some(process);
                self.queue = Some(queue);
                self.state = SessionState::Running;
                let line = format!("Started engine: {}", self.config.program.display());
                self.pump.log(&line);
                Ok(())
            }
            Err(source) => {
                let err = SessionError::Spawn {
                    path: self.config.program.clone(),
                    source,
                };
                warn!("{}", err);
                self.pump.log(&err.to_string());
                Err(err)
            }
        }
    }

    /// Send one command line. Valid only while `Running`.
    ///
    /// Failures are logged and returned; they never panic or block beyond
    /// the write itself.
    pub fn send(&mut self, command: &str) -> Result<()> {
        let command = command.trim_end_matches(['\r', '\n']);
        let result = match (self.state, self.process.as_mut()) {
            (SessionState::Running, Some(process)) => process
                .writer
                .send_line(command)
                .map_err(|source| SessionError::Write {
                    command: command.to_string(),
                    source,
                }),
            _ => Err(SessionError::not_running(command)),
        };

        match &result {
            Ok(()) => {
                debug!("sent {:?}", command);
                if self.config.echo_commands {
                    let line = format!(">>> {}", command);
                    self.pump.log(&line);
                }
            }
            Err(e) => {
                warn!("{}", e);
                self.pump.log(&e.to_string());
            }
        }
        result
    }

    pub fn send_command(&mut self, command: &EngineCommand) -> Result<()> {
        self.send(&command.line())
    }

    /// Stop the engine: send `quit`, then terminate the process.
    /// Idempotent; a session that is not running is left untouched.
    pub fn stop(&mut self) {
        if self.state != SessionState::Running {
            return;
        }
        self.state = SessionState::Stopping;
        if let Some(queue) = self.queue.as_mut() {
            queue.mark_stopped();
        }
        if let Some(process) = self.process.take() {
            process.terminate();
        }
        self.state = SessionState::Stopped;
        info!("engine stopped");
    }

    /// One pump step: deliver every queued line to the sinks. Never waits.
    ///
    /// Output of replaced engines comes first. Once the current engine's
    /// output has ended the process is reaped.
    pub fn poll(&mut self) -> usize {
        let mut count = 0;
        for queue in &mut self.retired {
            count += self.pump.step(queue);
        }
        self.retired.retain(|queue| !queue.is_closed());

        if let Some(queue) = self.queue.as_mut() {
            count += self.pump.step(queue);
        }
        if self.has_exited() {
            self.reap();
        }
        count
    }

    /// Collect an engine that went away by itself. The state stays `Running`
    /// until the caller stops or restarts; `send` reports it as not running.
    fn reap(&mut self) {
        let Some(process) = self.process.as_mut() else {
            return;
        };
        match process.child.try_wait() {
            Ok(Some(status)) => {
                info!("engine exited: {}", status);
                if let Some(process) = self.process.take() {
                    process.join_reader();
                }
            }
            Ok(None) => {}
            Err(e) => warn!("engine wait failed: {}", e),
        }
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        self.stop();
    }
}
