// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod jobs;
pub mod logging;
pub mod markers;
pub mod registry;
pub mod report;
pub mod signals;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::resolve_invocation;
use crate::engine::{CoreRun, RunEvent, Runtime};
use crate::errors::Result;
use crate::exec::{DispatcherContext, ProcessGroupIndex, RealExecutorBackend};
use crate::jobs::pool_for;
use crate::markers::MarkerStore;
use crate::registry::resolve_tests;
use crate::report::RunVerdict;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - invocation resolution (CLI, environment, descriptor file)
/// - the test registry (fails fast on unresolvable identifiers)
/// - the job pool / marker store / process-group index
/// - executor and signal listener
/// - the runtime event loop
pub async fn run(args: CliArgs) -> Result<RunVerdict> {
    let invocation = resolve_invocation(&args)?;
    info!(
        run_dir = %invocation.run_dir.display(),
        tests = invocation.tests.len(),
        "starting test run"
    );

    // Resolve every identifier before anything executes.
    let tests = resolve_tests(&invocation.run_dir, &invocation.tests)?;

    let pool = pool_for(invocation.budget);
    let markers = Arc::new(MarkerStore::new(&invocation.run_dir));
    let groups = Arc::new(ProcessGroupIndex::new());

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RunEvent>(64);

    // SIGTERM / SIGINT -> run-wide abort.
    signals::spawn_signal_listener(rt_tx.clone())?;

    let executor = RealExecutorBackend::new(DispatcherContext {
        pool,
        markers: Arc::clone(&markers),
        groups: Arc::clone(&groups),
        run_dir: invocation.run_dir.clone(),
        runtime_tx: rt_tx.clone(),
    });

    let core = CoreRun::new(tests.iter().map(|spec| spec.name.clone()));
    let runtime = Runtime::new(core, rt_rx, executor, markers, groups);
    runtime.run(tests).await
}
