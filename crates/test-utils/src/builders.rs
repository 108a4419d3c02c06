#![allow(dead_code)]

//! Fixture builders: scratch test directories populated with small test
//! programs of known behavior.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A scratch directory holding test programs for one engine invocation.
///
/// The directory is removed when the value is dropped.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create scratch test dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an arbitrary file and return its path.
    pub fn add_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write fixture file");
        path
    }

    /// Write a file and set the executable bit.
    pub fn add_executable(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.add_file(name, contents);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("chmod fixture file");
        path
    }

    /// A shell test that exits 0.
    pub fn add_passing_sh(&self, name: &str) -> PathBuf {
        self.add_file(name, "#!/bin/sh\nexit 0\n")
    }

    /// A shell test that exits 1.
    pub fn add_failing_sh(&self, name: &str) -> PathBuf {
        self.add_file(name, "#!/bin/sh\nexit 1\n")
    }

    /// A shell test that runs until killed.
    ///
    /// It starts a `sleep` child (a grandchild of the engine), records the
    /// sleep's pid in `<name>.pid` in the working directory, and waits.
    /// Tests use the pid file both to detect that the test is running and
    /// to verify that descendants were reaped after an abort.
    pub fn add_indefinite_sh(&self, name: &str) -> PathBuf {
        let body = format!(
            "#!/bin/sh\nsleep 600 &\necho $! > \"{name}.pid\"\nwait\n"
        );
        self.add_file(name, &body)
    }

    /// A python test that exits 0.
    pub fn add_passing_py(&self, name: &str) -> PathBuf {
        self.add_file(name, "import sys\nsys.exit(0)\n")
    }

    /// A python test that runs until killed, recording its `sleep` child's
    /// pid like [`Self::add_indefinite_sh`]. Python is worth covering
    /// separately: an unhandled KeyboardInterrupt exits with code 1, not a
    /// signal status.
    pub fn add_indefinite_py(&self, name: &str) -> PathBuf {
        let body = format!(
            "import pathlib\nimport subprocess\n\nchild = subprocess.Popen([\"sleep\", \"600\"])\npathlib.Path(\"{name}.pid\").write_text(str(child.pid))\nchild.wait()\n"
        );
        self.add_file(name, &body)
    }

    /// Write a `Checkrun.toml` descriptor listing the given tests.
    pub fn write_descriptor(&self, tests: &[&str], jobs: Option<usize>) -> PathBuf {
        let mut contents = String::from("tests = [");
        for (i, test) in tests.iter().enumerate() {
            if i > 0 {
                contents.push_str(", ");
            }
            contents.push_str(&format!("\"{test}\""));
        }
        contents.push_str("]\n");
        if let Some(jobs) = jobs {
            contents.push_str(&format!("jobs = {jobs}\n"));
        }
        self.add_file("Checkrun.toml", &contents)
    }

    /// Path of the pid file an indefinite test writes.
    pub fn pid_file(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{name}.pid"))
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}
