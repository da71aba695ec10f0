//! Engine session tests against real child processes.
#![cfg(unix)]

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use fen4term::{DecodeResult, EngineCommand, EngineConfig, EngineSession, SessionState};

const EMPTY_BOARD: &str = "14/14/14/14/14/14/14/14/14/14/14/14/14/14";
const TIMEOUT: Duration = Duration::from_secs(10);

struct Recorder {
    logs: Rc<RefCell<Vec<String>>>,
    boards: Rc<RefCell<Vec<DecodeResult>>>,
    exits: Rc<RefCell<usize>>,
}

impl Recorder {
    fn attach(session: &mut EngineSession) -> Self {
        let recorder = Self {
            logs: Rc::new(RefCell::new(Vec::new())),
            boards: Rc::new(RefCell::new(Vec::new())),
            exits: Rc::new(RefCell::new(0)),
        };
        let logs = recorder.logs.clone();
        session.on_log(move |line| logs.borrow_mut().push(line.to_string()));
        let boards = recorder.boards.clone();
        session.on_board(move |result| boards.borrow_mut().push(result.clone()));
        let exits = recorder.exits.clone();
        session.on_exit(move || *exits.borrow_mut() += 1);
        recorder
    }

    /// Engine output only, without session notices and echoed commands.
    fn engine_lines(&self) -> Vec<String> {
        self.logs
            .borrow()
            .iter()
            .filter(|l| {
                !l.starts_with(">>> ")
                    && !l.starts_with("Started engine")
                    && l.as_str() != "Engine output closed"
            })
            .cloned()
            .collect()
    }
}

fn shell(script: &str) -> EngineConfig {
    EngineConfig::new("sh").arg("-c").arg(script)
}

/// Tick the pump until `done` holds or the timeout expires.
fn pump_until(session: &mut EngineSession, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < TIMEOUT {
        session.poll();
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

/// Tick the pump while `busy` holds for the session or until the timeout expires.
fn pump_while(session: &mut EngineSession, busy: impl Fn(&EngineSession) -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < TIMEOUT {
        session.poll();
        if !busy(session) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

fn count_lines(recorder: &Recorder, prefix: &str) -> usize {
    recorder
        .logs
        .borrow()
        .iter()
        .filter(|l| l.starts_with(prefix))
        .count()
}

#[test]
fn test_board_line_is_decoded() {
    let mut session = EngineSession::new(EngineConfig::new("cat"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    assert_eq!(session.state(), SessionState::Running);
    session.send(&format!("FEN4: {}", EMPTY_BOARD)).unwrap();

    let boards = recorder.boards.clone();
    assert!(pump_until(&mut session, || !boards.borrow().is_empty()));

    let boards = recorder.boards.borrow();
    let board = boards[0].as_ref().unwrap();
    assert_eq!(board.squares().len(), 196);
    assert_eq!(board.piece_count(), 0);

    let logs = recorder.logs.borrow();
    assert_eq!(logs[0], "Started engine: cat");
    assert_eq!(logs[1], format!(">>> FEN4: {}", EMPTY_BOARD));
    assert_eq!(logs[2], format!("FEN4: {}", EMPTY_BOARD));
}

#[test]
fn test_malformed_board_does_not_stop_the_pump() {
    let mut session = EngineSession::new(EngineConfig::new("cat"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    session.send("FEN4:14/14/14").unwrap();
    session.send_command(&EngineCommand::IsReady).unwrap();

    let logs = recorder.logs.clone();
    assert!(pump_until(&mut session, || logs
        .borrow()
        .iter()
        .any(|l| l == "isready")));

    let boards = recorder.boards.borrow();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].as_ref().unwrap_err().reason(), "rank count");
}

#[test]
fn test_output_order_is_preserved() {
    let script = r#"i=1; while [ $i -le 500 ]; do echo "line $i"; i=$((i+1)); done"#;
    let mut session = EngineSession::new(shell(script));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    let exits = recorder.exits.clone();
    assert!(pump_until(&mut session, || *exits.borrow() > 0));

    let expected: Vec<String> = (1..=500).map(|i| format!("line {}", i)).collect();
    assert_eq!(recorder.engine_lines(), expected);
    assert!(session.has_exited());
    // Exit is observable but does not change the session state.
    assert_eq!(session.state(), SessionState::Running);
}

#[test]
fn test_stderr_and_empty_lines_are_delivered() {
    let mut session = EngineSession::new(shell(r#"printf 'a\n\nb\n'; echo oops 1>&2"#));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    let exits = recorder.exits.clone();
    assert!(pump_until(&mut session, || *exits.borrow() > 0));

    assert_eq!(recorder.engine_lines(), vec!["a", "", "b", "oops"]);
    assert_eq!(*recorder.exits.borrow(), 1);
}

#[test]
fn test_send_after_stop_is_write_error() {
    let mut session = EngineSession::new(EngineConfig::new("cat"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);

    let before = recorder.logs.borrow().len();
    let err = session.send("go depth 10").unwrap_err();
    assert!(err.is_write());

    let logs = recorder.logs.borrow();
    assert_eq!(logs.len(), before + 1);
    assert!(logs[before].starts_with("Failed to send \"go depth 10\""));
}

#[test]
fn test_stop_is_idempotent() {
    let mut session = EngineSession::new(EngineConfig::new("cat"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    session.stop();
    let after_first = recorder.logs.borrow().len();
    session.stop();

    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(recorder.logs.borrow().len(), after_first);
    assert!(!session.is_running());
}

#[test]
fn test_send_after_engine_exit_fails_without_crash() {
    let mut session = EngineSession::new(shell("exit 0"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    let exits = recorder.exits.clone();
    assert!(pump_until(&mut session, || *exits.borrow() > 0));

    // The exit may be seen a tick before the process can be collected.
    assert!(pump_while(&mut session, |s| s.pid().is_some()));
    assert!(session.send("uci").unwrap_err().is_write());
    assert_eq!(session.state(), SessionState::Running);

    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);
}

#[test]
fn test_exited_engine_is_reaped() {
    let mut session = EngineSession::new(shell("exit 3"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    let pid = session.pid().unwrap();
    let exits = recorder.exits.clone();
    assert!(pump_until(&mut session, || *exits.borrow() > 0));
    assert!(pump_while(&mut session, |s| s.pid().is_some()));

    // An unreaped zombie keeps its /proc entry.
    if cfg!(target_os = "linux") {
        assert!(!std::path::Path::new(&format!("/proc/{}", pid)).exists());
    }
    assert_eq!(session.state(), SessionState::Running);
    assert_eq!(*recorder.exits.borrow(), 1);
}

#[test]
fn test_start_restarts_running_session() {
    let mut session = EngineSession::new(EngineConfig::new("cat"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    session.start().unwrap();
    assert_eq!(session.state(), SessionState::Running);

    let started = recorder
        .logs
        .borrow()
        .iter()
        .filter(|l| l.starts_with("Started engine"))
        .count();
    assert_eq!(started, 2);

    session.send("readyok").unwrap();
    let logs = recorder.logs.clone();
    assert!(pump_until(&mut session, || logs
        .borrow()
        .iter()
        .any(|l| l == "readyok")));
    // The replaced engine was stopped on purpose, so no exit is reported.
    assert_eq!(*recorder.exits.borrow(), 0);
}

#[test]
fn test_stopped_engine_reports_no_exit() {
    let mut session = EngineSession::new(EngineConfig::new("cat"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    session.stop();
    assert!(pump_while(&mut session, |s| !s.has_exited()));

    assert_eq!(*recorder.exits.borrow(), 0);
    assert_eq!(count_lines(&recorder, "Engine output closed"), 0);
}

#[test]
fn test_restart_delivers_output_of_replaced_engine() {
    // The background writer outlives the killed shell and keeps the old pipe open.
    let mut session = EngineSession::new(shell("(sleep 0.3; echo late) & echo up; exec cat"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    let logs = recorder.logs.clone();
    assert!(pump_until(&mut session, || logs.borrow().iter().any(|l| l == "up")));
    session.set_config(EngineConfig::new("cat"));
    session.start().unwrap();
    session.send("fresh").unwrap();

    let logs = recorder.logs.clone();
    assert!(pump_until(&mut session, || {
        let logs = logs.borrow();
        logs.iter().any(|l| l == "late") && logs.iter().any(|l| l == "fresh")
    }));
    assert_eq!(*recorder.exits.borrow(), 0);
}

#[test]
fn test_failed_start_leaves_session_unusable() {
    let mut session = EngineSession::new(EngineConfig::new("/nonexistent/engine"));
    let recorder = Recorder::attach(&mut session);

    assert!(session.start().is_err());
    assert_eq!(session.state(), SessionState::NotStarted);
    assert!(session.send("uci").unwrap_err().is_write());
    assert_eq!(recorder.logs.borrow().len(), 2);
    assert_eq!(session.poll(), 0);
}

#[test]
fn test_failed_restart_after_stop_stays_stopped() {
    let mut session = EngineSession::new(EngineConfig::new("cat"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    session.stop();
    session.set_config(EngineConfig::new("/nonexistent/engine"));

    assert!(session.start().is_err());
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.pid(), None);
    assert_eq!(count_lines(&recorder, "Could not start engine"), 1);
    assert!(session.send("uci").unwrap_err().is_write());
}

#[test]
fn test_failed_restart_of_running_session_stops_it() {
    let mut session = EngineSession::new(EngineConfig::new("cat"));
    let recorder = Recorder::attach(&mut session);

    session.start().unwrap();
    let old_pid = session.pid().unwrap();
    session.set_config(EngineConfig::new("/nonexistent/engine"));

    assert!(session.start().is_err());
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.pid(), None);
    if cfg!(target_os = "linux") {
        assert!(!std::path::Path::new(&format!("/proc/{}", old_pid)).exists());
    }
    assert_eq!(count_lines(&recorder, "Started engine"), 1);
    assert_eq!(count_lines(&recorder, "Could not start engine"), 1);
    assert!(session.send("uci").unwrap_err().is_write());

    // The old engine's output still drains, without an exit report.
    for _ in 0..10 {
        session.poll();
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(*recorder.exits.borrow(), 0);
}
