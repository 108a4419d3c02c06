// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the configured tests as
//! child processes, each in its own process group, and reporting back to
//! the orchestration runtime via `RunEvent`s.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend` the runtime uses in production, which tests can
//!   replace with a fake implementation.
//! - [`dispatcher`] owns the admission loop that paces tests against the
//!   job budget.
//! - [`supervisor`] handles an individual test process.
//! - [`groups`] tracks live child process groups for signal fan-out.

pub mod backend;
pub mod dispatcher;
pub mod groups;
pub mod supervisor;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use dispatcher::DispatcherContext;
pub use groups::ProcessGroupIndex;
