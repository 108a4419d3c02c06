// src/markers.rs

//! On-disk bookkeeping of begun and failed tests.
//!
//! Two marker files live in the run directory while the engine is alive:
//! one listing every test that has begun executing, one listing every test
//! that failed. Outer tooling polls the executed marker to detect that the
//! run is underway; humans can inspect the failed marker mid-run. Both are
//! removed unconditionally before the engine exits, on every path --
//! normal completion, failure, and signaled abort alike. A marker that
//! survives the process is a bug.
//!
//! Appends from concurrent supervisors are serialized through one mutex so
//! entries never interleave; each append is one line, written and flushed
//! before the call returns.

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::errors::{CheckrunError, Result};

/// File listing tests that have begun executing.
pub const EXECUTED_MARKER: &str = ".checkrun_executed_tests";
/// File listing tests that failed.
pub const FAILED_MARKER: &str = ".checkrun_failed_tests";

/// Marker-file store for one run directory.
#[derive(Debug)]
pub struct MarkerStore {
    dir: PathBuf,
    /// `true` once [`Self::cleanup`] has run. Guarded by the same mutex as
    /// the appends: a supervisor whose child died in the abort fan-out may
    /// still try to record a failure while the engine is on its way out,
    /// and such a late append must not recreate a removed marker.
    closed: Mutex<bool>,
}

impl MarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            closed: Mutex::new(false),
        }
    }

    pub fn executed_path(&self) -> PathBuf {
        self.dir.join(EXECUTED_MARKER)
    }

    pub fn failed_path(&self) -> PathBuf {
        self.dir.join(FAILED_MARKER)
    }

    /// Record that `test` has begun executing. Called before the test
    /// process is spawned.
    pub fn mark_executed(&self, test: &str) -> Result<()> {
        self.append(&self.executed_path(), test)
    }

    /// Record that `test` reached a failed terminal status.
    pub fn mark_failed(&self, test: &str) -> Result<()> {
        self.append(&self.failed_path(), test)
    }

    fn append(&self, path: &Path, test: &str) -> Result<()> {
        let closed = self.closed.lock().expect("marker store lock poisoned");
        if *closed {
            debug!(test, "marker store already cleaned up; dropping append");
            return Ok(());
        }

        let mut line = String::with_capacity(test.len() + 1);
        let _ = writeln!(line, "{test}");

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| bookkeeping(path, &err))?;
        file.write_all(line.as_bytes())
            .map_err(|err| bookkeeping(path, &err))?;
        file.flush().map_err(|err| bookkeeping(path, &err))?;

        Ok(())
    }

    /// Remove both markers and refuse further appends. Idempotent: missing
    /// files are fine, including a run in which no test ever started. Any
    /// other IO failure is a real error -- the no-residue guarantee depends
    /// on these removals.
    pub fn cleanup(&self) -> Result<()> {
        let mut closed = self.closed.lock().expect("marker store lock poisoned");
        *closed = true;

        for path in [self.executed_path(), self.failed_path()] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed marker file"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(bookkeeping(&path, &err)),
            }
        }
        Ok(())
    }
}

fn bookkeeping(path: &Path, err: &io::Error) -> CheckrunError {
    CheckrunError::Bookkeeping(format!("{}: {err}", path.display()))
}
