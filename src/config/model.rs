// src/config/model.rs

//! Raw and validated descriptor file structures.

use serde::Deserialize;

use crate::errors::{CheckrunError, Result};

/// Raw deserialization target for `Checkrun.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCheckfile {
    /// Test identifiers, in execution-admission order.
    #[serde(default)]
    pub tests: Vec<String>,

    /// Default concurrency budget; overridden by `--jobs`.
    pub jobs: Option<usize>,
}

/// Validated descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkfile {
    pub tests: Vec<String>,
    pub jobs: Option<usize>,
}

impl TryFrom<RawCheckfile> for Checkfile {
    type Error = CheckrunError;

    fn try_from(raw: RawCheckfile) -> Result<Self> {
        for name in &raw.tests {
            if name.trim().is_empty() {
                return Err(CheckrunError::Config(
                    "empty test identifier in descriptor".to_string(),
                ));
            }
        }
        if raw.jobs == Some(0) {
            return Err(CheckrunError::Config(
                "jobs must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            tests: raw.tests,
            jobs: raw.jobs,
        })
    }
}
