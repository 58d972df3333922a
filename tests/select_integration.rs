//! Integration tests for the select subcommand.

#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wakeloop::manifest::DatasetManifest;

fn write_wav(dir: &Path, name: &str, seconds: f32) {
    std::fs::create_dir_all(dir).unwrap();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(dir.join(name), spec).unwrap();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let samples = (seconds * 16000.0) as usize;
    for i in 0..samples {
        #[allow(clippy::cast_possible_truncation)]
        writer.write_sample((i % 64) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn fill_source(dir: &Path, prefix: &str, count: usize) {
    for i in 0..count {
        write_wav(dir, &format!("{prefix}_{i:03}.wav"), 0.2);
    }
}

/// Build a standard pool layout: two positive sources, one negative.
fn standard_pools(root: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let pos_a = root.join("voices_a");
    let pos_b = root.join("voices_b");
    let neg = root.join("noise");
    fill_source(&pos_a, "pos", 10);
    fill_source(&pos_b, "pos", 5);
    fill_source(&neg, "neg", 12);
    (pos_a, pos_b, neg)
}

fn select_cmd(
    output: &Path,
    positives: &str,
    negatives: &str,
    extra: &[&str],
) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("wakeloop");
    cmd.arg("--quiet")
        .arg("select")
        .arg("--output-dir")
        .arg(output)
        .arg("--wake-phrase")
        .arg("hey rust")
        .arg("--positives")
        .arg(positives)
        .arg("--negatives")
        .arg(negatives)
        .args(extra);
    cmd
}

fn read_manifest(output_root: &Path) -> (PathBuf, DatasetManifest) {
    let runs = output_root.join("runs");
    let run_dir = std::fs::read_dir(&runs)
        .unwrap()
        .map(|e| e.unwrap().path())
        .next()
        .unwrap();
    let path = run_dir.join("manifest.json");
    let content = std::fs::read_to_string(&path).unwrap();
    (path, serde_json::from_str(&content).unwrap())
}

#[test]
fn test_select_writes_manifest_with_summary() {
    let root = TempDir::new().unwrap();
    let (pos_a, pos_b, neg) = standard_pools(root.path());
    let output = root.path().join("out");

    select_cmd(
        &output,
        &format!("{},{}", pos_a.display(), pos_b.display()),
        &neg.display().to_string(),
        &["--max-positives", "8", "--min-per-source", "2", "--seed", "11"],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("manifest.json"));

    let (_, manifest) = read_manifest(&output);
    assert_eq!(manifest.wake_phrase, "hey rust");
    assert_eq!(manifest.seed, 11);
    assert_eq!(manifest.summary.selected_positives, 8);
    // Unbounded negatives: everything available
    assert_eq!(manifest.summary.selected_negatives, 12);
    assert_eq!(
        manifest.samples.len(),
        manifest.summary.selected_positives + manifest.summary.selected_negatives
    );
    assert!(manifest.summary.per_source["voices_a"] >= 2);
    assert!(manifest.summary.per_source["voices_b"] >= 2);
}

#[test]
fn test_select_is_byte_identical_across_runs() {
    let root = TempDir::new().unwrap();
    let (pos_a, pos_b, neg) = standard_pools(root.path());
    let positives = format!("{},{}", pos_a.display(), pos_b.display());
    let negatives = neg.display().to_string();

    let out_first = root.path().join("first");
    let out_second = root.path().join("second");
    let extra = ["--max-positives", "9", "--max-negatives", "6", "--seed", "3"];

    select_cmd(&out_first, &positives, &negatives, &extra)
        .assert()
        .success();
    select_cmd(&out_second, &positives, &negatives, &extra)
        .assert()
        .success();

    let (first_path, _) = read_manifest(&out_first);
    let (second_path, _) = read_manifest(&out_second);
    assert_eq!(
        std::fs::read(&first_path).unwrap(),
        std::fs::read(&second_path).unwrap()
    );
}

#[test]
fn test_select_different_seeds_differ() {
    let root = TempDir::new().unwrap();
    let (pos_a, pos_b, neg) = standard_pools(root.path());
    let positives = format!("{},{}", pos_a.display(), pos_b.display());
    let negatives = neg.display().to_string();

    let out_first = root.path().join("first");
    let out_second = root.path().join("second");

    select_cmd(
        &out_first,
        &positives,
        &negatives,
        &["--max-positives", "6", "--max-negatives", "6", "--seed", "1"],
    )
    .assert()
    .success();
    select_cmd(
        &out_second,
        &positives,
        &negatives,
        &["--max-positives", "6", "--max-negatives", "6", "--seed", "2"],
    )
    .assert()
    .success();

    let (_, first) = read_manifest(&out_first);
    let (_, second) = read_manifest(&out_second);
    let first_ids: Vec<&str> = first.samples.iter().map(|s| s.clip_id.as_str()).collect();
    let second_ids: Vec<&str> = second.samples.iter().map(|s| s.clip_id.as_str()).collect();
    assert_ne!(first_ids, second_ids);
}

#[test]
fn test_floor_violation_is_fatal() {
    let root = TempDir::new().unwrap();
    let (pos_a, pos_b, neg) = standard_pools(root.path());
    let small = root.path().join("voices_small");
    fill_source(&small, "pos", 2);
    let output = root.path().join("out");

    // 10/5/2 clips with a floor of 3: the 2-clip source must fail the run.
    select_cmd(
        &output,
        &format!("{},{},{}", pos_a.display(), pos_b.display(), small.display()),
        &neg.display().to_string(),
        &["--max-positives", "12", "--min-per-source", "3"],
    )
    .assert()
    .failure()
    .stderr(
        predicate::str::contains("voices_small").and(predicate::str::contains("minimum is 3")),
    );

    // No partial manifest was written.
    assert!(!output.exists());
}

#[test]
fn test_relaxed_floor_succeeds() {
    let root = TempDir::new().unwrap();
    let (pos_a, pos_b, neg) = standard_pools(root.path());
    let small = root.path().join("voices_small");
    fill_source(&small, "pos", 2);
    let output = root.path().join("out");

    select_cmd(
        &output,
        &format!("{},{},{}", pos_a.display(), pos_b.display(), small.display()),
        &neg.display().to_string(),
        &["--max-positives", "12", "--min-per-source", "2"],
    )
    .assert()
    .success();

    let (_, manifest) = read_manifest(&output);
    assert_eq!(manifest.summary.selected_positives, 12);
    assert_eq!(manifest.summary.per_source["voices_small"], 2);
}

#[test]
fn test_contradictory_quota_fails_fast() {
    let root = TempDir::new().unwrap();
    let (pos_a, pos_b, neg) = standard_pools(root.path());
    let output = root.path().join("out");

    select_cmd(
        &output,
        &format!("{},{}", pos_a.display(), pos_b.display()),
        &neg.display().to_string(),
        &["--max-positives", "5", "--min-per-source", "3"],
    )
    .assert()
    .failure()
    .stderr(predicate::str::contains("exceeds the cap"));
}

#[test]
fn test_missing_source_dir_is_fatal() {
    let root = TempDir::new().unwrap();
    let (_, _, neg) = standard_pools(root.path());
    let output = root.path().join("out");

    select_cmd(
        &output,
        &root.path().join("does_not_exist").display().to_string(),
        &neg.display().to_string(),
        &["--max-positives", "5"],
    )
    .assert()
    .failure()
    .stderr(predicate::str::contains("does not exist"));
}
