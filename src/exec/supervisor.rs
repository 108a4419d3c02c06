// src/exec/supervisor.rs

//! Individual test process supervision.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use anyhow::Context;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::engine::{RunEvent, TestOutcome};
use crate::errors::Result;
use crate::exec::groups::ProcessGroupIndex;
use crate::jobs::JobToken;
use crate::markers::MarkerStore;
use crate::registry::TestSpec;

/// Run a single test process to its terminal status.
///
/// Holds `token` for the whole lifetime of the child, so the concurrency
/// budget slot frees exactly when the terminal status has been recorded.
/// A bookkeeping error here is not a test failure; it aborts the whole run
/// via [`RunEvent::Fatal`].
pub async fn run_test(
    spec: TestSpec,
    token: JobToken,
    run_dir: PathBuf,
    markers: Arc<MarkerStore>,
    groups: Arc<ProcessGroupIndex>,
    runtime_tx: mpsc::Sender<RunEvent>,
) {
    let name = spec.name.clone();
    if let Err(err) = run_test_inner(spec, run_dir, &markers, &groups, &runtime_tx).await {
        error!(test = %name, error = %err, "test supervision failed");
        let _ = runtime_tx
            .send(RunEvent::Fatal {
                message: err.to_string(),
            })
            .await;
    }
    drop(token);
}

async fn run_test_inner(
    spec: TestSpec,
    run_dir: PathBuf,
    markers: &MarkerStore,
    groups: &ProcessGroupIndex,
    runtime_tx: &mpsc::Sender<RunEvent>,
) -> Result<()> {
    // Recorded before the spawn so outer tooling can observe that the run
    // is underway even if the child never comes up.
    markers.mark_executed(&spec.name)?;

    info!(
        test = %spec.name,
        program = %spec.program.display(),
        "starting test process"
    );

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&run_dir)
        .stdin(Stdio::null())
        // Own group: the engine's signals are never implicitly forwarded;
        // the abort path signals recorded groups explicitly.
        .process_group(0)
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            // The identifier resolved earlier, so this is a property of the
            // test (say, a missing interpreter), not of the engine: count it
            // as a failure and keep the run going.
            warn!(test = %spec.name, error = %err, "failed to spawn test");
            markers.mark_failed(&spec.name)?;
            let _ = runtime_tx
                .send(RunEvent::TestFinished {
                    test: spec.name.clone(),
                    outcome: TestOutcome::Failed(-1),
                })
                .await;
            return Ok(());
        }
    };

    let pgid = child
        .id()
        .with_context(|| format!("no pid for freshly spawned test '{}'", spec.name))?
        as i32;

    if !groups.register(&spec.name, pgid) {
        // The run began aborting while we were spawning; `register` has
        // already signalled the fresh group. Reap it and bow out without
        // reporting a start.
        debug!(test = %spec.name, "test spawned into an aborting run");
        let _ = child.wait().await;
        return Ok(());
    }

    let _ = runtime_tx
        .send(RunEvent::TestStarted {
            test: spec.name.clone(),
            pgid,
        })
        .await;

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for test '{}'", spec.name))?;
    groups.deregister(&spec.name);

    let outcome = classify(status);
    info!(test = %spec.name, ?outcome, "test process exited");

    if outcome.is_failure() {
        markers.mark_failed(&spec.name)?;
    }

    let _ = runtime_tx
        .send(RunEvent::TestFinished {
            test: spec.name.clone(),
            outcome,
        })
        .await;

    Ok(())
}

/// Exit code 0 passes; any other exit fails; a signal death is a failure
/// too (an engine-initiated abort never reaches this point, its supervisor
/// bows out at registration).
fn classify(status: ExitStatus) -> TestOutcome {
    use std::os::unix::process::ExitStatusExt;

    match status.code() {
        Some(0) => TestOutcome::Passed,
        Some(code) => TestOutcome::Failed(code),
        None => TestOutcome::Signaled(status.signal().unwrap_or(0)),
    }
}
