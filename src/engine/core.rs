// src/engine/core.rs

//! Pure core run state machine.
//!
//! This module contains a synchronous, deterministic core that consumes
//! [`RunEvent`]s and produces:
//! - updated per-test records and aggregate counters
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible
//! for reading events from channels, the marker files, and signalling
//! child process groups. The core has no channels, no Tokio types, and
//! performs no IO, so its semantics are unit-testable in isolation.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::engine::{AbortSignal, RunEvent, TestName, TestOutcome};
use crate::report::Summary;

/// Lifecycle of one test inside the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Pending,
    Running,
    Passed,
    Failed,
}

/// Bookkeeping for one test, fed by supervisor events.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub status: RecordStatus,
    /// Process group of the running child; diagnostic only, the live kill
    /// index is owned by the exec layer.
    pub pgid: Option<i32>,
    /// Set once, when the record reaches a terminal status.
    pub outcome: Option<TestOutcome>,
}

/// Commands for the IO shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreCommand {
    /// Deliver `signal` to every live child process group and stop
    /// admitting tests.
    FanOutKill { signal: AbortSignal },
}

/// Result of feeding one event into the core.
#[derive(Debug)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// When false, the shell stops consuming events and finishes the run.
    pub keep_running: bool,
}

/// Core state for one engine invocation.
#[derive(Debug)]
pub struct CoreRun {
    records: HashMap<TestName, ExecutionRecord>,
    total: usize,
    finished: usize,
    failed: usize,
    /// Set at most once; the sole authority that suppresses the summary.
    shutting_down: Option<AbortSignal>,
    fatal: Option<String>,
}

impl CoreRun {
    pub fn new(tests: impl IntoIterator<Item = TestName>) -> Self {
        let records: HashMap<_, _> = tests
            .into_iter()
            .map(|name| {
                (
                    name,
                    ExecutionRecord {
                        status: RecordStatus::Pending,
                        pgid: None,
                        outcome: None,
                    },
                )
            })
            .collect();
        let total = records.len();

        Self {
            records,
            total,
            finished: 0,
            failed: 0,
            shutting_down: None,
            fatal: None,
        }
    }

    /// Whether every admitted test has reached a terminal status.
    pub fn is_complete(&self) -> bool {
        self.finished == self.total
    }

    pub fn abort_signal(&self) -> Option<AbortSignal> {
        self.shutting_down
    }

    pub fn fatal_error(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    /// Aggregate counts; meaningful once [`Self::is_complete`] holds.
    pub fn summary(&self) -> Summary {
        Summary {
            total: self.total,
            failed: self.failed,
        }
    }

    /// Read-only view of one test's status (for tests and diagnostics).
    pub fn record_status(&self, test: &str) -> Option<RecordStatus> {
        self.records.get(test).map(|record| record.status)
    }

    /// Handle a single event, updating state and returning the resulting
    /// commands for the IO shell.
    pub fn step(&mut self, event: RunEvent) -> CoreStep {
        let commands = match event {
            RunEvent::TestStarted { test, pgid } => {
                self.handle_started(&test, pgid);
                Vec::new()
            }
            RunEvent::TestFinished { test, outcome } => {
                self.handle_finished(&test, outcome);
                Vec::new()
            }
            RunEvent::ShutdownRequested { signal } => self.handle_shutdown(signal),
            RunEvent::Fatal { message } => self.handle_fatal(message),
        };

        CoreStep {
            commands,
            keep_running: self.keep_running(),
        }
    }

    fn keep_running(&self) -> bool {
        self.shutting_down.is_none() && self.fatal.is_none() && !self.is_complete()
    }

    fn handle_started(&mut self, test: &str, pgid: i32) {
        match self.records.get_mut(test) {
            Some(record) => {
                debug!(test, pgid, "test started");
                record.status = RecordStatus::Running;
                record.pgid = Some(pgid);
            }
            None => warn!(test, "start event for unknown test; ignoring"),
        }
    }

    fn handle_finished(&mut self, test: &str, outcome: TestOutcome) {
        let Some(record) = self.records.get_mut(test) else {
            warn!(test, "finish event for unknown test; ignoring");
            return;
        };
        if matches!(record.status, RecordStatus::Passed | RecordStatus::Failed) {
            warn!(test, "duplicate finish event; ignoring");
            return;
        }

        record.outcome = Some(outcome);
        record.status = if outcome.is_failure() {
            self.failed += 1;
            RecordStatus::Failed
        } else {
            RecordStatus::Passed
        };
        self.finished += 1;

        debug!(
            test,
            ?outcome,
            finished = self.finished,
            total = self.total,
            "test finished"
        );
    }

    fn handle_shutdown(&mut self, signal: AbortSignal) -> Vec<CoreCommand> {
        if self.shutting_down.is_some() {
            debug!(signal = signal.name(), "already shutting down; ignoring repeat");
            return Vec::new();
        }
        self.shutting_down = Some(signal);
        vec![CoreCommand::FanOutKill { signal }]
    }

    fn handle_fatal(&mut self, message: String) -> Vec<CoreCommand> {
        if self.fatal.is_some() {
            return Vec::new();
        }
        warn!(error = %message, "fatal engine error; aborting run");
        self.fatal = Some(message);
        // Running tests must not be orphaned by the error exit.
        vec![CoreCommand::FanOutKill {
            signal: AbortSignal::Term,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core(names: &[&str]) -> CoreRun {
        CoreRun::new(names.iter().map(|n| n.to_string()))
    }

    fn finish(core: &mut CoreRun, test: &str, outcome: TestOutcome) -> CoreStep {
        core.step(RunEvent::TestFinished {
            test: test.to_string(),
            outcome,
        })
    }

    #[test]
    fn zero_tests_is_complete_from_the_start() {
        let core = core(&[]);
        assert!(core.is_complete());
        assert_eq!(core.summary(), Summary { total: 0, failed: 0 });
    }

    #[test]
    fn all_passing_run_counts_up_and_stops() {
        let mut core = core(&["a.sh", "b.sh"]);
        assert!(!core.is_complete());

        let step = core.step(RunEvent::TestStarted {
            test: "a.sh".to_string(),
            pgid: 100,
        });
        assert!(step.commands.is_empty());
        assert!(step.keep_running);
        assert_eq!(core.record_status("a.sh"), Some(RecordStatus::Running));

        let step = finish(&mut core, "a.sh", TestOutcome::Passed);
        assert!(step.keep_running);

        let step = finish(&mut core, "b.sh", TestOutcome::Passed);
        assert!(!step.keep_running);
        assert!(core.is_complete());
        assert_eq!(core.summary(), Summary { total: 2, failed: 0 });
    }

    #[test]
    fn failures_and_signal_deaths_both_count_as_failed() {
        let mut core = core(&["a.sh", "b.sh", "c.sh"]);

        finish(&mut core, "a.sh", TestOutcome::Failed(1));
        finish(&mut core, "b.sh", TestOutcome::Signaled(9));
        let step = finish(&mut core, "c.sh", TestOutcome::Passed);

        assert!(!step.keep_running);
        assert_eq!(core.summary(), Summary { total: 3, failed: 2 });
        assert_eq!(core.record_status("a.sh"), Some(RecordStatus::Failed));
        assert_eq!(core.record_status("b.sh"), Some(RecordStatus::Failed));
        assert_eq!(core.record_status("c.sh"), Some(RecordStatus::Passed));
    }

    #[test]
    fn shutdown_fans_out_once_and_stops_the_run() {
        let mut core = core(&["a.sh", "b.sh"]);
        core.step(RunEvent::TestStarted {
            test: "a.sh".to_string(),
            pgid: 100,
        });

        let step = core.step(RunEvent::ShutdownRequested {
            signal: AbortSignal::Term,
        });
        assert_eq!(
            step.commands,
            vec![CoreCommand::FanOutKill {
                signal: AbortSignal::Term
            }]
        );
        assert!(!step.keep_running);
        assert_eq!(core.abort_signal(), Some(AbortSignal::Term));

        // The transition fires exactly once.
        let step = core.step(RunEvent::ShutdownRequested {
            signal: AbortSignal::Int,
        });
        assert!(step.commands.is_empty());
        assert_eq!(core.abort_signal(), Some(AbortSignal::Term));
    }

    #[test]
    fn completions_after_shutdown_do_not_resume_the_run() {
        let mut core = core(&["a.sh"]);
        core.step(RunEvent::ShutdownRequested {
            signal: AbortSignal::Int,
        });

        let step = finish(&mut core, "a.sh", TestOutcome::Signaled(2));
        assert!(!step.keep_running);
        assert_eq!(core.abort_signal(), Some(AbortSignal::Int));
    }

    #[test]
    fn fatal_errors_kill_running_tests_and_stop_the_run() {
        let mut core = core(&["a.sh"]);
        let step = core.step(RunEvent::Fatal {
            message: "disk gone".to_string(),
        });
        assert_eq!(
            step.commands,
            vec![CoreCommand::FanOutKill {
                signal: AbortSignal::Term
            }]
        );
        assert!(!step.keep_running);
        assert_eq!(core.fatal_error(), Some("disk gone"));
    }

    #[test]
    fn unknown_and_duplicate_events_are_ignored() {
        let mut core = core(&["a.sh"]);

        core.step(RunEvent::TestStarted {
            test: "ghost.sh".to_string(),
            pgid: 1,
        });
        finish(&mut core, "ghost.sh", TestOutcome::Passed);
        assert!(!core.is_complete());

        finish(&mut core, "a.sh", TestOutcome::Failed(3));
        finish(&mut core, "a.sh", TestOutcome::Passed);
        assert_eq!(core.summary(), Summary { total: 1, failed: 1 });
    }
}
