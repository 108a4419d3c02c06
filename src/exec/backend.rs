// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of spawning processes
//! itself. This keeps the production executor (dispatcher + supervisors)
//! swappable for a fake in tests that exercises the engine semantics
//! without real child processes.

use std::future::Future;
use std::pin::Pin;

use anyhow::anyhow;
use tokio::sync::mpsc;

use crate::errors::Result;
use crate::exec::dispatcher::{DispatcherContext, spawn_dispatcher};
use crate::registry::TestSpec;

/// Trait abstracting how admitted tests are executed.
///
/// Production code uses [`RealExecutorBackend`]; tests can provide their
/// own implementation that emits `RunEvent`s directly.
pub trait ExecutorBackend: Send {
    /// Hand the given tests over for execution, in order.
    ///
    /// The implementation is free to:
    /// - spawn OS processes under the job budget (production)
    /// - simulate starts and completions (tests)
    fn submit(
        &mut self,
        tests: Vec<TestSpec>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Wraps the background admission loop in
/// [`spawn_dispatcher`](crate::exec::dispatcher::spawn_dispatcher): `submit`
/// just forwards specs over the queue, and the dispatcher paces them
/// against the job pool.
pub struct RealExecutorBackend {
    tx: mpsc::UnboundedSender<TestSpec>,
}

impl RealExecutorBackend {
    /// Create a new real executor backend. This spawns the background
    /// admission loop immediately.
    pub fn new(ctx: DispatcherContext) -> Self {
        let tx = spawn_dispatcher(ctx);
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn submit(
        &mut self,
        tests: Vec<TestSpec>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();
        Box::pin(async move {
            for spec in tests {
                tx.send(spec)
                    .map_err(|_| anyhow!("dispatcher is no longer running"))?;
            }
            Ok(())
        })
    }
}
