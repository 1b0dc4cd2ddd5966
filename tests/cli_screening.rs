use std::f64::consts::PI;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_screening_cli"))
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout UTF-8");
    serde_json::from_str(stdout.trim()).expect("JSON payload on stdout")
}

#[test]
fn simulate_tremor_reports_frequency() {
    let output = cli()
        .args(["simulate-tremor", "--frequency", "5", "--amplitude", "2", "--seconds", "5"])
        .output()
        .expect("failed to run screening_cli simulate-tremor");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let json = stdout_json(&output);
    assert_eq!(json["domain"], "tremor");
    assert_eq!(json["fallback"], false);
    let frequency = json["metrics"]["frequencyHz"].as_f64().unwrap_or_default();
    assert!((4.5..=5.5).contains(&frequency), "frequency {frequency}");
}

#[test]
fn replay_and_aggregate_round_trip() {
    let dir = scratch_dir("replay_and_aggregate");
    let recording = dir.join("gait.jsonl");
    let mut lines = String::new();
    for i in 0..120 {
        let ts = i as f64 * 50.0;
        let left = if i % 10 < 5 { 0.3 } else { 0.0 };
        let right = if (i + 5) % 10 < 5 { 0.3 } else { 0.0 };
        lines.push_str(&format!(
            "{{\"timestamp_ms\":{ts},\"kind\":\"gait\",\"left\":{left},\"right\":{right}}}\n"
        ));
    }
    fs::write(&recording, lines).expect("write recording");

    let reports = dir.join("reports");
    let output = cli()
        .args(["replay", "--domain", "gait", "--input"])
        .arg(&recording)
        .arg("--out-dir")
        .arg(&reports)
        .output()
        .expect("failed to run replay");
    assert!(output.status.success(), "replay exited with {:?}", output.status.code());
    let json = stdout_json(&output);
    assert_eq!(json["domain"], "gait");
    assert!(json["metrics"]["totalSteps"].as_f64().unwrap_or_default() > 0.0);

    let stored = reports.join("gait.json");
    assert!(stored.exists(), "expected {} to be written", stored.display());

    let output = cli()
        .arg("aggregate")
        .arg(&stored)
        .output()
        .expect("failed to run aggregate");
    assert!(output.status.success());
    let summary = stdout_json(&output);
    assert_eq!(summary["overall_risk"], "incomplete");
    assert!(summary["radar"]["gait"].is_number());
}

#[test]
fn voice_wav_is_scored() {
    let dir = scratch_dir("voice_wav");
    let path = dir.join("vowel.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
    for i in 0..16_000 * 5 {
        let t = i as f64 / 16_000.0;
        let value = 0.3 * (2.0 * PI * 150.0 * t).sin();
        writer
            .write_sample((value * i16::MAX as f64) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");

    let output = cli()
        .arg("voice")
        .arg("--wav")
        .arg(&path)
        .output()
        .expect("failed to run voice");
    assert!(output.status.success(), "voice exited with {:?}", output.status.code());
    let json = stdout_json(&output);
    assert_eq!(json["domain"], "voice");
    assert_eq!(json["fallback"], false);
    assert!(json["metrics"]["frames"].as_f64().unwrap_or_default() > 0.0);
}

#[test]
fn invalid_config_exits_with_error() {
    let dir = scratch_dir("invalid_config");
    let config = dir.join("config.json");
    fs::write(&config, r#"{"gait": {"slow_cadence": 130.0, "fast_cadence": 120.0}}"#)
        .expect("write config");

    let output = cli()
        .arg("--config")
        .arg(&config)
        .arg("simulate-tremor")
        .output()
        .expect("failed to run with invalid config");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("gait.fast_cadence"), "unexpected stderr: {stderr}");
}

#[test]
fn missing_wav_exits_with_error() {
    let output = cli()
        .args(["voice", "--wav", "/nonexistent/vowel.wav"])
        .output()
        .expect("failed to run voice");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_config_exits_with_error() {
    let output = cli()
        .args(["--config", "/nonexistent/screening.json", "simulate-tremor"])
        .output()
        .expect("failed to run with missing config");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("reading config"), "unexpected stderr: {stderr}");
}

#[test]
fn malformed_config_exits_with_error() {
    let dir = scratch_dir("malformed_config");
    let config = dir.join("config.json");
    fs::write(&config, "{ not json").expect("write config");

    let output = cli()
        .arg("--config")
        .arg(&config)
        .arg("simulate-tremor")
        .output()
        .expect("failed to run with malformed config");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("parsing config"), "unexpected stderr: {stderr}");
}

#[test]
fn telemetry_snapshot_is_written() {
    let dir = scratch_dir("telemetry_snapshot");
    let path = dir.join("telemetry.json");
    let output = cli()
        .args(["simulate-tremor", "--seconds", "2", "--telemetry"])
        .arg(&path)
        .output()
        .expect("failed to run simulate-tremor");
    assert!(output.status.success(), "CLI exited with {:?}", output.status.code());

    let snapshot: Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read telemetry")).expect("telemetry JSON");
    assert!(snapshot["total_events"].as_u64().unwrap_or_default() >= 2);
    let kinds: Vec<&str> = snapshot["recent"]
        .as_array()
        .expect("recent events")
        .iter()
        .filter_map(|event| event["type"].as_str())
        .collect();
    assert_eq!(kinds.first(), Some(&"session_started"));
    assert!(kinds.contains(&"session_finalized"), "events: {kinds:?}");
}
