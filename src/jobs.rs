// src/jobs.rs

//! Concurrency-budget capability.
//!
//! The dispatcher acquires one [`JobToken`] before admitting each test and
//! the token releases its slot when dropped, after the test's terminal
//! status has been recorded. Two implementations exist:
//!
//! - [`SemaphorePool`]: a local counting semaphore, used for explicit
//!   `--jobs` budgets and for the default serial mode.
//! - [`MakeJobserverPool`]: a cooperative GNU make jobserver client, used
//!   when the engine is invoked from `make -j` and should share the build's
//!   global job pool instead of bringing its own.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::info;

use crate::errors::Result;

/// A held slot in the run's concurrency budget.
///
/// Dropping the token releases the slot exactly once, whichever pool it
/// came from.
pub struct JobToken {
    _kind: TokenKind,
}

enum TokenKind {
    Slot(OwnedSemaphorePermit),
    External(jobserver::Acquired),
}

impl fmt::Debug for JobToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self._kind {
            TokenKind::Slot(_) => "slot",
            TokenKind::External(_) => "external",
        };
        f.debug_struct("JobToken").field("kind", &kind).finish()
    }
}

/// Trait abstracting where concurrency slots come from.
///
/// Production code picks an implementation in [`pool_for`]; tests can
/// provide their own.
pub trait JobPool: Send + Sync {
    /// Wait until a slot is available and take it.
    fn acquire(&self) -> Pin<Box<dyn Future<Output = Result<JobToken>> + Send + '_>>;
}

/// Explicitly requested concurrency budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobBudget {
    /// `--jobs N`
    Slots(usize),
    /// `--jobs` with no value
    Unlimited,
}

/// Counting-semaphore budget local to this engine process.
pub struct SemaphorePool {
    semaphore: Arc<Semaphore>,
}

impl SemaphorePool {
    pub fn bounded(slots: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(slots.max(1))),
        }
    }

    pub fn serial() -> Self {
        Self::bounded(1)
    }

    pub fn unbounded() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
        }
    }
}

impl JobPool for SemaphorePool {
    fn acquire(&self) -> Pin<Box<dyn Future<Output = Result<JobToken>> + Send + '_>> {
        let semaphore = Arc::clone(&self.semaphore);
        Box::pin(async move {
            let permit = semaphore
                .acquire_owned()
                .await
                .context("job semaphore closed")?;
            Ok(JobToken {
                _kind: TokenKind::Slot(permit),
            })
        })
    }
}

/// Cooperative GNU make jobserver pool.
///
/// A process invoked from `make -j` owns one implicit slot that never
/// touches the shared pipe; every further slot is a token read from the
/// jobserver, written back when the token is dropped.
pub struct MakeJobserverPool {
    client: jobserver::Client,
    implicit: Arc<Semaphore>,
}

impl MakeJobserverPool {
    /// Connect to the jobserver advertised in `MAKEFLAGS`.
    ///
    /// Returns `None` when the engine was not started under `make -j`.
    ///
    /// # Safety
    /// Called once during startup, before anything could have closed or
    /// reused the descriptors make handed down.
    pub fn from_env() -> Option<Self> {
        let client = unsafe { jobserver::Client::from_env() }?;
        Some(Self {
            client,
            implicit: Arc::new(Semaphore::new(1)),
        })
    }
}

impl JobPool for MakeJobserverPool {
    fn acquire(&self) -> Pin<Box<dyn Future<Output = Result<JobToken>> + Send + '_>> {
        let client = self.client.clone();
        let implicit = Arc::clone(&self.implicit);
        Box::pin(async move {
            if let Ok(permit) = Arc::clone(&implicit).try_acquire_owned() {
                return Ok(JobToken {
                    _kind: TokenKind::Slot(permit),
                });
            }

            // The jobserver read blocks, so it must not run on the async
            // executor threads.
            let acquired = tokio::task::spawn_blocking(move || client.acquire())
                .await
                .context("jobserver acquire task failed")?
                .context("acquiring jobserver token")?;
            Ok(JobToken {
                _kind: TokenKind::External(acquired),
            })
        })
    }
}

/// Pick the pool for one invocation.
///
/// An explicit budget always wins. Without one, a jobserver inherited from
/// make is used cooperatively; failing that, execution is serial, matching
/// a plain `make` without `-j`.
pub fn pool_for(budget: Option<JobBudget>) -> Arc<dyn JobPool> {
    match budget {
        Some(JobBudget::Slots(n)) => {
            info!(jobs = n, "using a fixed concurrency budget");
            Arc::new(SemaphorePool::bounded(n))
        }
        Some(JobBudget::Unlimited) => {
            info!("running with an unlimited concurrency budget");
            Arc::new(SemaphorePool::unbounded())
        }
        None => match MakeJobserverPool::from_env() {
            Some(pool) => {
                info!("sharing the make jobserver job pool");
                Arc::new(pool)
            }
            None => Arc::new(SemaphorePool::serial()),
        },
    }
}
