// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{CoreCommand, CoreRun, RunEvent};
use crate::errors::{CheckrunError, Result};
use crate::exec::ExecutorBackend;
use crate::exec::groups::ProcessGroupIndex;
use crate::markers::MarkerStore;
use crate::registry::TestSpec;
use crate::report::{RunVerdict, Summary};
use crate::signals;

/// Drives the run in response to `RunEvent`s and delegates actual test
/// execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around [`CoreRun`], which contains all the run
/// semantics. The shell reads events from the channel, executes the core's
/// commands, and owns the one place where the marker files are removed --
/// reached on the normal, signaled, and fatal paths alike.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRun,
    event_rx: mpsc::Receiver<RunEvent>,
    executor: E,
    markers: Arc<MarkerStore>,
    groups: Arc<ProcessGroupIndex>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRun,
        event_rx: mpsc::Receiver<RunEvent>,
        executor: E,
        markers: Arc<MarkerStore>,
        groups: Arc<ProcessGroupIndex>,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            markers,
            groups,
        }
    }

    /// Main event loop.
    ///
    /// - Hands the whole registry to the executor (the job budget paces the
    ///   actual admissions).
    /// - Consumes `RunEvent`s and feeds them into the core.
    /// - Executes the commands returned by the core.
    /// - Finishes by removing the marker files and converting the core's
    ///   end state into a [`RunVerdict`].
    pub async fn run(mut self, tests: Vec<TestSpec>) -> Result<RunVerdict> {
        info!(total = tests.len(), "checkrun engine started");

        self.executor.submit(tests).await?;

        while !self.core.is_complete() {
            let event = match self.event_rx.recv().await {
                Some(event) => event,
                None => {
                    warn!("runtime event channel closed unexpectedly");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                self.execute_command(command);
            }

            if !step.keep_running {
                break;
            }
        }

        self.finish()
    }

    fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::FanOutKill { signal } => {
                info!(signal = signal.name(), "fanning signal out to live test process groups");
                self.groups.abort(signals::os_signal(signal));
            }
        }
    }

    /// Single exit point: markers are removed here no matter how the run
    /// ended. Children are never waited for on the abort paths.
    fn finish(self) -> Result<RunVerdict> {
        if let Some(message) = self.core.fatal_error() {
            let message = message.to_string();
            if let Err(err) = self.markers.cleanup() {
                warn!(error = %err, "marker cleanup failed during fatal shutdown");
            }
            return Err(CheckrunError::Bookkeeping(message));
        }

        self.markers.cleanup()?;

        if let Some(signal) = self.core.abort_signal() {
            info!(signal = signal.name(), "run aborted; suppressing summary");
            return Ok(RunVerdict::Interrupted(signal));
        }

        if self.core.is_complete() {
            let summary: Summary = self.core.summary();
            info!(total = summary.total, failed = summary.failed, "run complete");
            return Ok(RunVerdict::Completed(summary));
        }

        Err(CheckrunError::Other(anyhow::anyhow!(
            "event channel closed before every test finished"
        )))
    }
}
