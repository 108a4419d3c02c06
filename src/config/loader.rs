// src/config/loader.rs

//! Descriptor loading and invocation resolution.
//!
//! An invocation can name its tests and directories three equivalent ways:
//!
//! 1. in place: run inside the test directory, next to `Checkrun.toml`;
//! 2. `--dir <d>`: tests live (and run) in `<d>`;
//! 3. `--file <path>`: explicit descriptor path; tests are resolved in the
//!    descriptor's directory regardless of the working directory.
//!
//! The test list itself has a precedence chain: CLI arguments beat the
//! `TESTS` environment variable, which beats the descriptor's `tests`
//! array. A set-but-empty `TESTS` means "zero tests", it does not fall
//! through. All environment variables used here can be cleared or
//! overridden by a caller that itself runs under checkrun.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::model::{Checkfile, RawCheckfile};
use crate::errors::{CheckrunError, Result};
use crate::jobs::JobBudget;

/// Default descriptor filename, looked up in the run directory.
pub const DESCRIPTOR_FILE: &str = "Checkrun.toml";

/// Whitespace-separated test identifiers.
pub const TESTS_ENV: &str = "TESTS";
/// Descriptor path, equivalent to `--file`.
pub const FILE_ENV: &str = "CHECKRUN_FILE";
/// Run directory, equivalent to `--dir`.
pub const DIR_ENV: &str = "CHECKRUN_DIR";

/// Load a descriptor from a given path and return the raw `RawCheckfile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to
/// get the validated form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawCheckfile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|err| {
        CheckrunError::Config(format!("cannot read {}: {err}", path.display()))
    })?;

    let raw: RawCheckfile = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load a descriptor from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Checkfile> {
    let raw = load_from_path(&path)?;
    Checkfile::try_from(raw)
}

/// Everything the engine needs to know about one invocation, resolved from
/// CLI arguments, environment variables and the optional descriptor file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Canonical directory the tests are resolved in, run in, and whose
    /// tree holds the marker files.
    pub run_dir: PathBuf,
    /// Test identifiers in admission order.
    pub tests: Vec<String>,
    /// Explicitly requested budget, if any. `None` defers to a jobserver
    /// inherited from make, or serial execution.
    pub budget: Option<JobBudget>,
}

/// Resolve the invocation from CLI arguments and the live environment.
pub fn resolve_invocation(args: &CliArgs) -> Result<Invocation> {
    resolve_with(
        args,
        std::env::var_os(TESTS_ENV),
        std::env::var_os(FILE_ENV),
        std::env::var_os(DIR_ENV),
    )
}

/// Pure resolution core, separated so the precedence rules are testable
/// without touching the process environment.
fn resolve_with(
    args: &CliArgs,
    env_tests: Option<OsString>,
    env_file: Option<OsString>,
    env_dir: Option<OsString>,
) -> Result<Invocation> {
    let file_arg = args
        .file
        .clone()
        .or_else(|| nonempty_path(env_file));
    let dir_arg = args.dir.clone().or_else(|| nonempty_path(env_dir));

    let run_dir_base = match (&dir_arg, &file_arg) {
        (Some(dir), _) => dir.clone(),
        (None, Some(file)) => match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
        (None, None) => PathBuf::from("."),
    };
    let run_dir = fs::canonicalize(&run_dir_base).map_err(|err| {
        CheckrunError::Config(format!(
            "run directory {}: {err}",
            run_dir_base.display()
        ))
    })?;

    // An explicit descriptor must exist; the default one is optional.
    let descriptor = match &file_arg {
        Some(file) => Some(load_and_validate(file)?),
        None => {
            let default = run_dir.join(DESCRIPTOR_FILE);
            if default.is_file() {
                Some(load_and_validate(&default)?)
            } else {
                None
            }
        }
    };

    let tests = if !args.tests.is_empty() {
        args.tests.clone()
    } else if let Some(raw) = env_tests {
        raw.to_string_lossy()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    } else {
        descriptor
            .as_ref()
            .map(|checkfile| checkfile.tests.clone())
            .unwrap_or_default()
    };

    let budget = match args.jobs {
        Some(Some(0)) => {
            return Err(CheckrunError::Config(
                "jobs must be at least 1".to_string(),
            ));
        }
        Some(Some(n)) => Some(JobBudget::Slots(n)),
        Some(None) => Some(JobBudget::Unlimited),
        None => descriptor
            .as_ref()
            .and_then(|checkfile| checkfile.jobs)
            .map(JobBudget::Slots),
    };

    debug!(
        run_dir = %run_dir.display(),
        tests = tests.len(),
        ?budget,
        "resolved invocation"
    );

    Ok(Invocation {
        run_dir,
        tests,
        budget,
    })
}

fn nonempty_path(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}
