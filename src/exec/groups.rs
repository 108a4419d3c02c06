// src/exec/groups.rs

//! Index of live child process groups.
//!
//! Every test runs in its own process group, detached from the engine's, so
//! a signal delivered to the engine is never implicitly forwarded; the
//! abort path walks this index and signals each group explicitly, reaching
//! the test's descendants as well as the test itself.
//!
//! The index is a weak lookup table, not an ownership relation: supervisors
//! register a group after spawn and deregister it after reaping. The
//! aborting flag lives under the same mutex, which closes the race between
//! a concurrent spawn and the fan-out: a child is either registered before
//! the fan-out walks the table (and gets signalled by it), or its
//! registration observes the flag and [`ProcessGroupIndex::register`]
//! signals the fresh group itself, telling the caller the run is over.

use std::collections::HashMap;
use std::sync::Mutex;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::debug;

use crate::engine::TestName;

#[derive(Debug, Default)]
pub struct ProcessGroupIndex {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    aborting: Option<Signal>,
    groups: HashMap<TestName, Pid>,
}

impl ProcessGroupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly spawned child's process group.
    ///
    /// Returns `false` if the run is already aborting; the group has then
    /// been signalled here and the caller must not treat the test as
    /// started.
    pub fn register(&self, test: &str, pgid: i32) -> bool {
        let mut inner = self.inner.lock().expect("process group index poisoned");
        let pid = Pid::from_raw(pgid);

        if let Some(sig) = inner.aborting {
            debug!(test, pgid, "spawned into an aborting run; signalling group");
            let _ = signal::killpg(pid, sig);
            return false;
        }

        inner.groups.insert(test.to_string(), pid);
        true
    }

    /// Forget a group once its leader has been reaped.
    pub fn deregister(&self, test: &str) {
        let mut inner = self.inner.lock().expect("process group index poisoned");
        inner.groups.remove(test);
    }

    pub fn is_aborting(&self) -> bool {
        let inner = self.inner.lock().expect("process group index poisoned");
        inner.aborting.is_some()
    }

    /// Fan `sig` out to every live child process group and refuse further
    /// registrations. The first call wins; repeats are no-ops.
    ///
    /// A group that already died delivers ESRCH, which is not an error
    /// here.
    pub fn abort(&self, sig: Signal) {
        let mut inner = self.inner.lock().expect("process group index poisoned");
        if inner.aborting.is_some() {
            return;
        }
        inner.aborting = Some(sig);

        for (test, pid) in inner.groups.drain() {
            debug!(test = %test, pgid = pid.as_raw(), ?sig, "signalling test process group");
            let _ = signal::killpg(pid, sig);
        }
    }
}
