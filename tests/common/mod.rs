#![allow(dead_code)]

//! Helpers for driving the real `checkrun` binary in integration tests.

use std::path::Path;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

pub use checkrun_test_utils::builders::TestDir;
pub use checkrun_test_utils::init_tracing;

use checkrun::markers::{EXECUTED_MARKER, FAILED_MARKER};

/// Path of the compiled `checkrun` binary under test.
pub fn checkrun_bin() -> &'static str {
    env!("CARGO_BIN_EXE_checkrun")
}

/// Base command for one engine invocation.
///
/// The engine's own environment surface is cleared first: these tests run
/// the engine from inside a build of the engine, and an inherited `TESTS`
/// or `CHECKRUN_*` variable would leak into the child invocation.
pub fn checkrun_command(cwd: &Path) -> Command {
    let mut cmd = Command::new(checkrun_bin());
    cmd.current_dir(cwd)
        .env_remove("TESTS")
        .env_remove("CHECKRUN_FILE")
        .env_remove("CHECKRUN_DIR")
        .env_remove("CHECKRUN_LOG")
        .env_remove("MAKEFLAGS")
        .env_remove("MFLAGS")
        .env_remove("CARGO_MAKEFLAGS");
    cmd
}

/// Run to completion and capture output.
pub fn run_checkrun(cwd: &Path, args: &[&str]) -> Output {
    checkrun_command(cwd)
        .args(args)
        .output()
        .expect("run checkrun binary")
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Assert that neither marker file survived anywhere under `dir`.
pub fn assert_no_markers(dir: &Path) {
    for entry in walk(dir) {
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert_ne!(name, EXECUTED_MARKER, "leftover marker: {}", entry.display());
        assert_ne!(name, FAILED_MARKER, "leftover marker: {}", entry.display());
    }
}

fn walk(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return found;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            found.extend(walk(&path));
        } else {
            found.push(path);
        }
    }
    found
}

/// Poll `cond` until it holds or the timeout elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    cond()
}

/// Whether a process with the given pid still exists.
pub fn pid_alive(pid: i32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

/// Read a pid recorded by an indefinite fixture test, if it has been fully
/// written yet.
pub fn try_read_pid(path: &Path) -> Option<i32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Read a pid recorded by an indefinite fixture test.
pub fn read_pid(path: &Path) -> i32 {
    try_read_pid(path).expect("pid file should hold a pid")
}
