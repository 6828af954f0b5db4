//! Integration tests for the trialsim binary.
//!
//! These tests verify end-to-end behavior including:
//! - Output table shape and naming
//! - Seed reproducibility across processes
//! - Configuration errors surfacing as failures

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test directory with an empty config file
fn setup_test_dir() -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "").expect("Failed to write config");
    (temp_dir, config_path)
}

fn cli(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("trialsim").expect("Failed to find trialsim binary");
    cmd.arg("--config").arg(config);
    cmd
}

fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
    csv::Reader::from_path(path)
        .expect("Failed to open table")
        .into_records()
        .map(|r| r.expect("Bad CSV row"))
        .collect()
}

#[test]
fn test_cli_help() {
    Command::cargo_bin("trialsim")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Exercise-arm body-composition trial simulator",
        ));
}

#[test]
fn test_run_writes_table_and_manifest() {
    let (temp_dir, config) = setup_test_dir();
    let out = temp_dir.path().join("data");

    cli(&config)
        .args(["run", "--weeks", "1", "--n", "2", "--arms", "control"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved:"))
        .stdout(predicate::str::contains("14 rows"));

    let table = out.join("results_w1_n2.csv");
    assert!(table.exists());

    let header = fs::read_to_string(&table).unwrap();
    assert!(header.starts_with("arm,pid,day,did_session,weight,fat_mass,ffm,balance\n"));

    let rows = read_rows(&table);
    assert_eq!(rows.len(), 14);
    assert!(rows.iter().all(|r| &r[0] == "control" && &r[3] == "0"));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("results_w1_n2.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["rows"], 14);
    assert_eq!(manifest["params"]["seed"], 42);
    assert_eq!(manifest["params"]["arms"][0], "control");
    assert_eq!(manifest["protocols"]["control"]["session_type"], "control");
    assert_eq!(
        manifest["protocols"]["sprint-interval"]["session_energy_cost"],
        170.0
    );
    assert_eq!(manifest["protocols"]["mixed"]["excess_post_exercise_energy"], 20.0);
}

#[test]
fn test_manifest_records_protocol_overrides() {
    let (temp_dir, config) = setup_test_dir();
    let out = temp_dir.path().join("data");
    fs::write(
        &config,
        "[protocols.liss]\nsession_type = \"liss\"\nsession_energy_cost = 300.0\n",
    )
    .unwrap();

    cli(&config)
        .args(["run", "--weeks", "1", "--n", "1", "--arms", "liss"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("results_w1_n1.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["protocols"]["low-intensity"]["session_energy_cost"], 300.0);
}

#[test]
fn test_energy_matched_flag_overrides_config() {
    let (temp_dir, config) = setup_test_dir();
    let plain = temp_dir.path().join("plain");
    let disabled = temp_dir.path().join("disabled");

    cli(&config)
        .args(["run", "--weeks", "1", "--n", "2", "--arms", "sit"])
        .arg("--output-dir")
        .arg(&plain)
        .assert()
        .success();

    fs::write(&config, "[run]\nenergy_matched = true\n").unwrap();
    cli(&config)
        .args(["run", "--weeks", "1", "--n", "2", "--arms", "sit"])
        .args(["--energy-matched", "false"])
        .arg("--output-dir")
        .arg(&disabled)
        .assert()
        .success();

    let a = fs::read(plain.join("results_w1_n2.csv")).unwrap();
    let b = fs::read(disabled.join("results_w1_n2.csv")).unwrap();
    assert_eq!(a, b);

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(disabled.join("results_w1_n2.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["params"]["energy_matched"], false);
}

#[test]
fn test_same_seed_identical_tables() {
    let (temp_dir, config) = setup_test_dir();
    let first = temp_dir.path().join("first");
    let second = temp_dir.path().join("second");

    for dir in [&first, &second] {
        cli(&config)
            .args(["run", "--weeks", "2", "--n", "3", "--seed", "7"])
            .args(["--arms", "control", "liss", "sit", "mixed"])
            .arg("--output-dir")
            .arg(dir)
            .assert()
            .success();
    }

    let a = fs::read(first.join("results_w2_n3.csv")).unwrap();
    let b = fs::read(second.join("results_w2_n3.csv")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_table_ordering_and_days() {
    let (temp_dir, config) = setup_test_dir();
    let out = temp_dir.path().join("data");

    cli(&config)
        .args(["run", "--weeks", "2", "--n", "2", "--arms", "mixed", "control"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let rows = read_rows(&out.join("results_w2_n2.csv"));
    assert_eq!(rows.len(), 2 * 2 * 14);

    let keys: Vec<(String, u32, u32)> = rows
        .iter()
        .map(|r| (r[0].to_string(), r[1].parse().unwrap(), r[2].parse().unwrap()))
        .collect();

    let mut expected = Vec::new();
    for arm in ["mixed", "control"] {
        for pid in 0..2 {
            for day in 1..=14 {
                expected.push((arm.to_string(), pid, day));
            }
        }
    }
    assert_eq!(keys, expected);

    for r in &rows {
        let weight: f64 = r[4].parse().unwrap();
        let fat_mass: f64 = r[5].parse().unwrap();
        let ffm: f64 = r[6].parse().unwrap();
        assert!(fat_mass >= 0.0 && ffm >= 0.0);
        assert!((weight - (fat_mass + ffm)).abs() < 1e-9);
    }
}

#[test]
fn test_unknown_arm_fails() {
    let (temp_dir, config) = setup_test_dir();
    let out = temp_dir.path().join("data");

    cli(&config)
        .args(["run", "--weeks", "1", "--n", "2", "--arms", "zumba"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown arm"));

    assert!(!out.join("results_w1_n2.csv").exists());
}

#[test]
fn test_config_file_defaults_and_overrides() {
    let (temp_dir, config) = setup_test_dir();
    let out = temp_dir.path().join("from_config");
    fs::write(
        &config,
        format!(
            "[output]\ndir = {:?}\n\n[run]\nweeks = 1\nparticipants = 3\narms = [\"sit\"]\n",
            out
        ),
    )
    .unwrap();

    cli(&config).arg("run").assert().success();

    let rows = read_rows(&out.join("results_w1_n3.csv"));
    assert_eq!(rows.len(), 21);
    assert!(rows.iter().all(|r| &r[0] == "sprint-interval"));
}

#[test]
fn test_protocol_missing_session_type_fails() {
    let (temp_dir, config) = setup_test_dir();
    fs::write(&config, "[protocols.liss]\nsession_energy_cost = 200.0\n").unwrap();

    cli(&config)
        .args(["run", "--weeks", "1", "--n", "1"])
        .arg("--output-dir")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("session_type"));
}

#[test]
fn test_mixed_protocol_override_fails() {
    let (temp_dir, config) = setup_test_dir();
    let out = temp_dir.path().join("data");
    fs::write(
        &config,
        "[protocols.mixed]\nsession_type = \"sit\"\nsession_energy_cost = 5000.0\n",
    )
    .unwrap();

    cli(&config)
        .args(["run", "--weeks", "1", "--n", "1", "--arms", "mixed"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("mixed arm"));

    assert!(!out.join("results_w1_n1.csv").exists());
}

#[test]
fn test_arms_lists_catalog() {
    let (_temp_dir, config) = setup_test_dir();

    cli(&config)
        .arg("arms")
        .assert()
        .success()
        .stdout(predicate::str::contains("control"))
        .stdout(predicate::str::contains("low-intensity"))
        .stdout(predicate::str::contains("sprint-interval"))
        .stdout(predicate::str::contains("x.x.x.."));
}
