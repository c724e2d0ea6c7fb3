use chrono::{Duration, NaiveDate};
use std::{
    env, fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

fn run_bin(args: &[&str]) -> Output {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_tempscope"));

    Command::new(bin)
        .args(args)
        .output()
        .expect("failed to execute command")
}

fn assert_success(args: &[&str]) {
    let output = run_bin(args);

    let stdout_str =
        std::str::from_utf8(&output.stdout).expect("failed to convert stdout to string");
    let stderr_str =
        std::str::from_utf8(&output.stderr).expect("failed to convert stderr to string");

    assert!(
        output.status.success(),
        "failed to run binary with {args:?}\nstdout:\n{stdout_str}\nstderr:\n{stderr_str}\n"
    );
}

fn write_data(test_dir: &Path) {
    let config_contents = String::new()
        + "[analysis]\n"
        + "window = 14\n"
        + "\n"
        + "[classify]\n"
        + "normal_tolerance = 8.0\n";
    fs::write(test_dir.join("config.toml"), config_contents).expect("failed to write config file");

    let start = NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date");
    let seasons = ["winter", "spring", "summer", "autumn"];
    let mut csv = String::from("city,timestamp,temperature,season\n");
    for (city, base) in [("Berlin", 10.0), ("New York", 13.0)] {
        for i_day in 0..730 {
            let date = start + Duration::days(i_day as i64);
            let season = seasons[(i_day / 91) % 4];
            let temp = base + 10.0 * ((i_day as f64) / 365.0 * std::f64::consts::TAU).sin()
                + if i_day % 97 == 0 { 25.0 } else { 0.0 };
            csv += &format!("{city},{date},{temp:.2},{season}\n");
        }
    }
    csv += "Berlin,not-a-date,0.0,winter\n";
    fs::write(test_dir.join("temperatures.csv"), csv).expect("failed to write data file");
}

#[test]
fn basic_workflow() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("basic_workflow");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");
    write_data(&test_dir);

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    assert_success(&["--data-dir", test_dir_str, "analyze", "--city", "Berlin"]);
    assert!(test_dir.join("report-Berlin.msgpack").is_file());
    assert!(!test_dir.join("report-New_York.msgpack").exists());

    assert_success(&["--data-dir", test_dir_str, "analyze"]);
    assert!(test_dir.join("report-Berlin.msgpack").is_file());
    assert!(test_dir.join("report-New_York.msgpack").is_file());

    assert_success(&[
        "--data-dir",
        test_dir_str,
        "classify",
        "--city",
        "Berlin",
        "--temp",
        "-3.5",
        "--day",
        "100",
    ]);
    assert_success(&["--data-dir", test_dir_str, "classify", "--city", "New York", "--temp", "20"]);

    assert_success(&["--data-dir", test_dir_str, "clean"]);
    assert!(!test_dir.join("report-Berlin.msgpack").exists());
    assert!(!test_dir.join("report-New_York.msgpack").exists());

    fs::remove_dir_all(&test_dir).ok();
}

#[test]
fn invalid_requests_fail() {
    let test_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("invalid_requests_fail");

    fs::remove_dir_all(&test_dir).ok();
    fs::create_dir(&test_dir).expect("failed to create test directory");

    let test_dir_str = test_dir
        .to_str()
        .expect("failed to convert test directory to string");

    // No data files yet.
    assert!(!run_bin(&["--data-dir", test_dir_str, "analyze"]).status.success());

    write_data(&test_dir);
    let output = run_bin(&["--data-dir", test_dir_str, "analyze", "--city", "Lima"]);
    assert!(!output.status.success());

    let output = run_bin(&[
        "--data-dir",
        test_dir_str,
        "classify",
        "--city",
        "Berlin",
        "--temp",
        "5",
        "--day",
        "400",
    ]);
    assert!(!output.status.success());

    fs::write(test_dir.join("config.toml"), "[analysis]\nwindow = 0\n")
        .expect("failed to write config file");
    assert!(!run_bin(&["--data-dir", test_dir_str, "analyze"]).status.success());

    fs::remove_dir_all(&test_dir).ok();
}
