// src/registry.rs

//! Test registry: resolving caller-supplied identifiers into runnable
//! commands.
//!
//! Resolution happens once, up front, before any test runs. Recognized
//! script extensions dispatch through the matching interpreter; anything
//! else must carry an executable bit and is invoked directly. An identifier
//! that resolves to neither is a configuration error and fails the whole
//! invocation fast, with no side effects.

use std::collections::HashSet;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::engine::TestName;
use crate::errors::{CheckrunError, Result};

/// One runnable test, resolved from a caller-supplied identifier.
///
/// Immutable once the registry is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSpec {
    /// The identifier as the caller gave it.
    pub name: TestName,
    /// Program to execute: an interpreter, or the test file itself.
    pub program: PathBuf,
    /// Arguments; the script path when dispatching through an interpreter.
    pub args: Vec<PathBuf>,
}

impl TestSpec {
    fn resolve(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(name);
        if !path.is_file() {
            return Err(CheckrunError::Config(format!(
                "test '{name}' not found in {}",
                dir.display()
            )));
        }

        match interpreter_for(&path) {
            Some(interpreter) => Ok(Self {
                name: name.to_string(),
                program: PathBuf::from(interpreter),
                args: vec![path],
            }),
            None => {
                let mode = path
                    .metadata()
                    .map_err(|err| {
                        CheckrunError::Config(format!("test '{name}': {err}"))
                    })?
                    .permissions()
                    .mode();
                if mode & 0o111 == 0 {
                    return Err(CheckrunError::Config(format!(
                        "test '{name}' is neither a recognized script nor executable"
                    )));
                }
                Ok(Self {
                    name: name.to_string(),
                    program: path,
                    args: Vec::new(),
                })
            }
        }
    }
}

/// Interpreter dispatch table, keyed on file extension.
fn interpreter_for(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("sh") => Some("sh"),
        Some("bash") => Some("bash"),
        Some("py") => Some("python3"),
        _ => None,
    }
}

/// Resolve the whole registry up front.
///
/// Returns specs in the caller's order. Fails before any test has run if a
/// single identifier cannot be turned into a runnable command, or if the
/// same identifier appears twice (per-test bookkeeping is keyed by name).
pub fn resolve_tests(dir: &Path, names: &[String]) -> Result<Vec<TestSpec>> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(CheckrunError::Config(format!(
                "test '{name}' is listed more than once"
            )));
        }
    }

    let specs = names
        .iter()
        .map(|name| TestSpec::resolve(dir, name))
        .collect::<Result<Vec<_>>>()?;

    debug!(count = specs.len(), dir = %dir.display(), "resolved test registry");
    Ok(specs)
}
