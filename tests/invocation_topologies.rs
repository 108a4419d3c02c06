mod common;

use common::{TestDir, assert_no_markers, checkrun_command, init_tracing, stdout_of};

/// The three invocation topologies must be interchangeable: running inside
/// the test directory, pointing `--dir` at it from elsewhere, and pointing
/// `--file` at the descriptor from elsewhere all produce byte-identical
/// summaries and exit codes.

fn populated_dir() -> TestDir {
    let dir = TestDir::new();
    dir.add_passing_sh("passing_test.sh");
    dir.add_failing_sh("failing_test.sh");
    dir.write_descriptor(&["passing_test.sh", "failing_test.sh"], None);
    dir
}

#[test]
fn the_three_topologies_are_byte_identical() {
    init_tracing();
    let tests = populated_dir();
    let elsewhere = TestDir::new();

    let in_place = checkrun_command(tests.path())
        .output()
        .expect("run in place");

    let via_dir = checkrun_command(elsewhere.path())
        .arg("--dir")
        .arg(tests.path())
        .output()
        .expect("run via --dir");

    let via_file = checkrun_command(elsewhere.path())
        .arg("--file")
        .arg(tests.path().join("Checkrun.toml"))
        .output()
        .expect("run via --file");

    assert_eq!(in_place.status.code(), Some(2));
    assert_eq!(via_dir.status.code(), Some(2));
    assert_eq!(via_file.status.code(), Some(2));

    assert_eq!(in_place.stdout, via_dir.stdout);
    assert_eq!(in_place.stdout, via_file.stdout);
    assert!(stdout_of(&in_place).contains("Failed 1 out of 2 tests"));

    assert_no_markers(tests.path());
    assert_no_markers(elsewhere.path());
}

#[test]
fn the_dir_env_var_matches_the_flag() {
    init_tracing();
    let tests = populated_dir();
    let elsewhere = TestDir::new();

    let output = checkrun_command(elsewhere.path())
        .env("CHECKRUN_DIR", tests.path())
        .output()
        .expect("run via CHECKRUN_DIR");

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout_of(&output).contains("Failed 1 out of 2 tests"));
    assert_no_markers(tests.path());
}

#[test]
fn the_file_env_var_matches_the_flag() {
    init_tracing();
    let tests = populated_dir();
    let elsewhere = TestDir::new();

    let output = checkrun_command(elsewhere.path())
        .env("CHECKRUN_FILE", tests.path().join("Checkrun.toml"))
        .output()
        .expect("run via CHECKRUN_FILE");

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout_of(&output).contains("Failed 1 out of 2 tests"));
    assert_no_markers(tests.path());
}

#[test]
fn tests_env_overrides_the_descriptor() {
    init_tracing();
    let tests = populated_dir();

    let output = checkrun_command(tests.path())
        .env("TESTS", "passing_test.sh")
        .output()
        .expect("run with TESTS override");

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("All 1 tests passed"));
    assert_no_markers(tests.path());
}

#[test]
fn cli_arguments_override_the_tests_env() {
    init_tracing();
    let tests = populated_dir();

    let output = checkrun_command(tests.path())
        .env("TESTS", "failing_test.sh")
        .arg("passing_test.sh")
        .output()
        .expect("run with CLI override");

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("All 1 tests passed"));
    assert_no_markers(tests.path());
}

#[test]
fn an_empty_tests_env_means_zero_tests() {
    init_tracing();
    let tests = populated_dir();

    let output = checkrun_command(tests.path())
        .env("TESTS", "")
        .output()
        .expect("run with empty TESTS");

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("All 0 tests passed"));
    assert_no_markers(tests.path());
}
