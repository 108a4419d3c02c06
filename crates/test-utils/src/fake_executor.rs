//! Fake executor backend for engine tests that must not spawn processes.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use checkrun::engine::{RunEvent, TestOutcome};
use checkrun::errors::Result;
use checkrun::exec::ExecutorBackend;
use checkrun::registry::TestSpec;

/// A fake executor that:
/// - records which tests were "started"
/// - emits `TestStarted` followed by `TestFinished` with a scripted
///   outcome for each submitted test (default: passed)
/// - never emits `TestFinished` for tests placed on hold, which lets a
///   test drive the shutdown path while a test is logically running.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RunEvent>,
    outcomes: HashMap<String, TestOutcome>,
    hold: HashSet<String>,
    started: Arc<Mutex<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RunEvent>) -> Self {
        Self {
            runtime_tx,
            outcomes: HashMap::new(),
            hold: HashSet::new(),
            started: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script a terminal outcome for one test.
    pub fn with_outcome(mut self, test: &str, outcome: TestOutcome) -> Self {
        self.outcomes.insert(test.to_string(), outcome);
        self
    }

    /// Keep one test "running" forever: it starts but never finishes.
    pub fn with_held(mut self, test: &str) -> Self {
        self.hold.insert(test.to_string());
        self
    }

    /// Shared handle to the list of started test names.
    pub fn started_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.started)
    }
}

impl ExecutorBackend for FakeExecutor {
    fn submit(
        &mut self,
        tests: Vec<TestSpec>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let outcomes = self.outcomes.clone();
        let hold = self.hold.clone();
        let started = Arc::clone(&self.started);

        Box::pin(async move {
            for (i, spec) in tests.into_iter().enumerate() {
                {
                    let mut guard = started.lock().unwrap();
                    guard.push(spec.name.clone());
                }

                tx.send(RunEvent::TestStarted {
                    test: spec.name.clone(),
                    pgid: 1000 + i as i32,
                })
                .await
                .map_err(anyhow::Error::from)?;

                if hold.contains(&spec.name) {
                    continue;
                }

                let outcome = outcomes
                    .get(&spec.name)
                    .copied()
                    .unwrap_or(TestOutcome::Passed);
                tx.send(RunEvent::TestFinished {
                    test: spec.name.clone(),
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}

/// Build a `TestSpec` without touching the filesystem; the fake executor
/// never runs the program.
pub fn spec(name: &str) -> TestSpec {
    TestSpec {
        name: name.to_string(),
        program: std::path::PathBuf::from("sh"),
        args: Vec::new(),
    }
}
