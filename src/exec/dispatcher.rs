// src/exec/dispatcher.rs

//! Admission loop that feeds tests to supervisors under the job budget.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::engine::RunEvent;
use crate::exec::groups::ProcessGroupIndex;
use crate::exec::supervisor::run_test;
use crate::jobs::JobPool;
use crate::markers::MarkerStore;
use crate::registry::TestSpec;

/// Everything the dispatcher and its supervisors share.
pub struct DispatcherContext {
    pub pool: Arc<dyn JobPool>,
    pub markers: Arc<MarkerStore>,
    pub groups: Arc<ProcessGroupIndex>,
    pub run_dir: PathBuf,
    pub runtime_tx: mpsc::Sender<RunEvent>,
}

/// Spawn the background admission loop.
///
/// Tests are admitted strictly in submission order. Each admission first
/// takes one token from the job pool, so at most budget-many supervisors
/// are alive at any moment; a freed slot re-admits the next pending test
/// immediately. Admissions stop for good once the run is aborting.
pub fn spawn_dispatcher(ctx: DispatcherContext) -> mpsc::UnboundedSender<TestSpec> {
    let (tx, mut rx) = mpsc::unbounded_channel::<TestSpec>();

    tokio::spawn(async move {
        debug!("dispatcher started");

        while let Some(spec) = rx.recv().await {
            if ctx.groups.is_aborting() {
                debug!("run is aborting; no further admissions");
                break;
            }

            let token = match ctx.pool.acquire().await {
                Ok(token) => token,
                Err(err) => {
                    error!(error = %err, "failed to acquire a job slot");
                    let _ = ctx
                        .runtime_tx
                        .send(RunEvent::Fatal {
                            message: format!("failed to acquire a job slot: {err}"),
                        })
                        .await;
                    break;
                }
            };

            // The abort may have landed while we were waiting for the slot.
            if ctx.groups.is_aborting() {
                debug!("run began aborting while waiting for a job slot");
                break;
            }

            debug!(test = %spec.name, "admitting test");
            tokio::spawn(run_test(
                spec,
                token,
                ctx.run_dir.clone(),
                Arc::clone(&ctx.markers),
                Arc::clone(&ctx.groups),
                ctx.runtime_tx.clone(),
            ));
        }

        debug!("dispatcher finished");
    });

    tx
}
