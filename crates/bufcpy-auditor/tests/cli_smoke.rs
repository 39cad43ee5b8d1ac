// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! End-to-end runs of the auditor binary on tiny sweeps.

use assert_cmd::Command;
use predicates::prelude::*;

fn auditor(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("bufcpy-auditor").expect("binary built");
    cmd.env("BUFCPY_CONFIG_DIR", config_dir);
    cmd
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    std::str::from_utf8(stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn no_operation_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    auditor(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:").and(predicate::str::contains("Example:")));
}

#[test]
fn json_copy_round_covers_every_combination() {
    let dir = tempfile::tempdir().unwrap();
    let output = auditor(dir.path())
        .args(["--copy", "--bufsize", "64kb", "--runs", "2", "--cpu", "1,2", "--parts", "2,3"])
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let rounds = json_lines(&output.stdout);
    assert_eq!(rounds.len(), 1);
    let round = &rounds[0];
    assert_eq!(round["operation"], "copy");
    assert_eq!(round["bufsize"], 65_536);
    // 2 direct + 4 concurrent x 2 parts x 2 pools
    assert_eq!(round["trials"], 18);
    assert_eq!(round["top"].as_array().unwrap().len(), 10);
}

#[test]
fn text_sweep_reports_each_size() {
    let dir = tempfile::tempdir().unwrap();
    auditor(dir.path())
        .args(["--compare", "--bufmin", "1kb", "--bufmax", "4kb", "--step", "*2"])
        .args(["--runs", "1", "--top", "3", "--cpu", "2", "--parts", "2"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Bufcpy Auditor")
                .and(predicate::str::contains("=== compare 1.00KB ==="))
                .and(predicate::str::contains("=== compare 2.00KB ==="))
                .and(predicate::str::contains("=== compare 4.00KB ==="))
                .and(predicate::str::contains("compare winner:")),
        );
}

#[test]
fn threads_dispatch_with_eager_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let output = auditor(dir.path())
        .args(["--compare", "--bufsize", "32kb", "--runs", "1", "--parts", "4"])
        .args(["--dispatch", "threads", "--cancel", "eager", "--strategy", "partitioned/foreign"])
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let round = &json_lines(&output.stdout)[0];
    assert_eq!(round["trials"], 1);
    assert_eq!(round["winner"]["label"], "partitioned_memcmp");
    assert!(round["winner"]["cpus"].is_null());
}

#[test]
fn bad_step_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    auditor(dir.path())
        .args(["--copy", "--step", "/2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown step"));
}

#[test]
fn inverted_range_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    auditor(dir.path())
        .args(["--copy", "--bufmin", "8kb", "--bufmax", "4kb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("larger than bufmax"));
}

#[test]
fn small_additive_step_warns() {
    let dir = tempfile::tempdir().unwrap();
    auditor(dir.path())
        .args(["--copy", "--bufmin", "0", "--bufmax", "32kb", "--step", "+1kb"])
        .args(["--runs", "1", "--cpu", "1", "--parts", "2", "--json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("additive step below"));
}

#[test]
fn saved_profile_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    auditor(dir.path())
        .args(["--copy", "--bufsize", "8kb", "--runs", "1", "--cpu", "1", "--parts", "2"])
        .args(["--save-profile", "quick", "--json"])
        .assert()
        .success();
    assert!(dir.path().join("quick.json").is_file());

    let output = auditor(dir.path())
        .args(["--profile", "quick", "--json", "--top", "2"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let round = &json_lines(&output.stdout)[0];
    assert_eq!(round["bufsize"], 8192);
    assert_eq!(round["top"].as_array().unwrap().len(), 2);
}

#[test]
fn saving_without_operation_only_saves() {
    let dir = tempfile::tempdir().unwrap();
    auditor(dir.path())
        .args(["--runs", "5", "--save-profile", "defaults"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    let saved: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("defaults.json")).unwrap()).unwrap();
    assert_eq!(saved["runs"], 5);
    assert_eq!(saved["copy"], false);
}

#[test]
fn unknown_profile_fails() {
    let dir = tempfile::tempdir().unwrap();
    auditor(dir.path())
        .args(["--profile", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no saved profile named `nope`"));
}
