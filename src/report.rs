// src/report.rs

//! Final aggregation and the stdout contract.
//!
//! The two summary lines and the exit codes below are a stable interface:
//! build scripts match them with `All\s*N tests passed` and
//! `Failed\s*M out of\s*N tests`. Completion order of individual tests never
//! influences them, only the final counts do.

use std::fmt;

use crate::engine::AbortSignal;

/// Aggregate counts for a run in which every admitted test reached a
/// terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub failed: usize,
}

impl Summary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// `0` when everything passed (including the empty run), `2` otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 2 }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all_passed() {
            write!(f, "All {} tests passed", self.total)
        } else {
            write!(f, "Failed {} out of {} tests", self.failed, self.total)
        }
    }
}

/// How a run ended, as seen by `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunVerdict {
    /// Every admitted test reached a terminal status; print the summary and
    /// exit with its code.
    Completed(Summary),
    /// A termination signal aborted the run. No summary is printed and the
    /// process dies by the same signal.
    Interrupted(AbortSignal),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_passed_line_and_exit_code() {
        let summary = Summary { total: 3, failed: 0 };
        assert_eq!(summary.to_string(), "All 3 tests passed");
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn empty_run_counts_as_all_passed() {
        let summary = Summary { total: 0, failed: 0 };
        assert_eq!(summary.to_string(), "All 0 tests passed");
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn failure_line_and_exit_code() {
        let summary = Summary { total: 5, failed: 2 };
        assert_eq!(summary.to_string(), "Failed 2 out of 5 tests");
        assert_eq!(summary.exit_code(), 2);
    }

    #[test]
    fn lines_match_the_documented_regexes() {
        let pass = regex::Regex::new(r"All\s*4 tests passed").unwrap();
        let fail = regex::Regex::new(r"Failed\s*1 out of\s*4 tests").unwrap();

        assert!(pass.is_match(&Summary { total: 4, failed: 0 }.to_string()));
        assert!(fail.is_match(&Summary { total: 4, failed: 1 }.to_string()));
    }
}
