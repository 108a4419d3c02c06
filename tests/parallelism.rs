mod common;

use std::fs::OpenOptions;
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use common::{TestDir, checkrun_command, init_tracing, wait_until};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

/// Concurrency-budget behavior, observed through the pid files the
/// indefinite fixture tests write as they come up.

fn spawn_two_indefinite(dir: &TestDir, extra_args: &[&str]) -> std::process::Child {
    dir.add_indefinite_sh("indefinite_test.sh");
    dir.add_indefinite_sh("indefinite_test1.sh");

    checkrun_command(dir.path())
        .args(["indefinite_test.sh", "indefinite_test1.sh"])
        .args(extra_args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn checkrun")
}

fn terminate(child: &mut std::process::Child) {
    let _ = kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM);
    let _ = child.wait();
}

#[test]
fn a_budget_of_one_never_overlaps_tests() {
    init_tracing();
    let dir = TestDir::new();
    let mut child = spawn_two_indefinite(&dir, &["--jobs", "1"]);

    assert!(
        wait_until(Duration::from_secs(10), || {
            dir.pid_file("indefinite_test.sh").is_file()
        }),
        "first test did not start"
    );

    // The first test never finishes, so on a serial budget the second one
    // must never be admitted.
    std::thread::sleep(Duration::from_millis(1500));
    assert!(
        !dir.pid_file("indefinite_test1.sh").exists(),
        "second test ran despite a budget of one"
    );

    terminate(&mut child);
}

#[test]
fn a_budget_of_two_runs_both_simultaneously() {
    init_tracing();
    let dir = TestDir::new();
    let mut child = spawn_two_indefinite(&dir, &["--jobs", "2"]);

    assert!(
        wait_until(Duration::from_secs(10), || {
            dir.pid_file("indefinite_test.sh").is_file()
                && dir.pid_file("indefinite_test1.sh").is_file()
        }),
        "both tests should be running at once"
    );

    terminate(&mut child);
}

#[test]
fn a_bare_jobs_flag_runs_both_simultaneously() {
    init_tracing();
    let dir = TestDir::new();
    let mut child = spawn_two_indefinite(&dir, &["--jobs"]);

    assert!(
        wait_until(Duration::from_secs(10), || {
            dir.pid_file("indefinite_test.sh").is_file()
                && dir.pid_file("indefinite_test1.sh").is_file()
        }),
        "both tests should be running at once"
    );

    terminate(&mut child);
}

#[test]
fn the_descriptor_jobs_default_applies() {
    init_tracing();
    let dir = TestDir::new();
    dir.add_indefinite_sh("indefinite_test.sh");
    dir.add_indefinite_sh("indefinite_test1.sh");
    dir.write_descriptor(&["indefinite_test.sh", "indefinite_test1.sh"], Some(2));

    let mut child = checkrun_command(dir.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn checkrun");

    assert!(
        wait_until(Duration::from_secs(10), || {
            dir.pid_file("indefinite_test.sh").is_file()
                && dir.pid_file("indefinite_test1.sh").is_file()
        }),
        "descriptor jobs budget was not honored"
    );

    terminate(&mut child);
}

/// A make-style jobserver advertised via MAKEFLAGS is used cooperatively:
/// the implicit slot plus one pipe token admit exactly two tests.
#[test]
fn a_make_jobserver_in_the_environment_is_honored() {
    init_tracing();
    let dir = TestDir::new();

    // GNU make 4.4 style fifo jobserver carrying one token.
    let fifo_dir = tempfile::tempdir().expect("fifo dir");
    let fifo_path = fifo_dir.path().join("jobserver");
    nix::unistd::mkfifo(&fifo_path, nix::sys::stat::Mode::S_IRWXU).expect("mkfifo");

    // Keep a read-write handle so opens never block and tokens persist.
    let mut fifo = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&fifo_path)
        .expect("open fifo");
    fifo.write_all(b"+").expect("seed jobserver token");

    dir.add_indefinite_sh("indefinite_test.sh");
    dir.add_indefinite_sh("indefinite_test1.sh");

    let mut child = checkrun_command(dir.path())
        .args(["indefinite_test.sh", "indefinite_test1.sh"])
        .env(
            "MAKEFLAGS",
            format!("-j --jobserver-auth=fifo:{}", fifo_path.display()),
        )
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn checkrun");

    assert!(
        wait_until(Duration::from_secs(10), || {
            dir.pid_file("indefinite_test.sh").is_file()
                && dir.pid_file("indefinite_test1.sh").is_file()
        }),
        "jobserver token plus the implicit slot should admit both tests"
    );

    terminate(&mut child);
}
