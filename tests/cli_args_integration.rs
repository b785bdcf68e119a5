//! Integration tests for CLI argument handling.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("avescan");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("species"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_invalid_latitude_is_rejected() {
    let mut cmd = cargo_bin_cmd!("avescan");
    cmd.arg("test.wav").arg("--lat").arg("95.0");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("latitude must be between"));
}

#[test]
fn test_invalid_confidence_is_rejected() {
    let mut cmd = cargo_bin_cmd!("avescan");
    cmd.arg("test.wav").arg("-c").arg("1.5");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("confidence must be between"));
}

#[test]
fn test_gpu_and_cpu_conflict() {
    let mut cmd = cargo_bin_cmd!("avescan");
    cmd.arg("test.wav").arg("--gpu").arg("--cpu");

    cmd.assert().failure();
}

#[test]
fn test_species_requires_location() {
    let mut cmd = cargo_bin_cmd!("avescan");
    cmd.arg("species");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--lat"));
}

#[test]
fn test_unknown_format_is_rejected() {
    let mut cmd = cargo_bin_cmd!("avescan");
    cmd.arg("test.wav").arg("--format").arg("parquet");

    cmd.assert().failure();
}
