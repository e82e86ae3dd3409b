//! Integration tests for nuclear-cli.
//!
//! Tests invoke the built `nuclear` binary and check files and output.

use std::path::Path;
use std::process::Command;

use nuclear_io::{WavSpec, read_wav_interleaved, write_wav_interleaved};
use tempfile::TempDir;

/// Helper to get the path to the `nuclear` binary built by cargo.
fn nuclear_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_nuclear"))
}

/// Writes a config with the given period to `dir` and returns its path.
fn write_config(dir: &Path, period: u32) -> std::path::PathBuf {
    let path = dir.join("lattice.toml");
    std::fs::write(
        &path,
        format!("name = \"test\"\nperiod_frames = {period}\n\n[threads]\nname_prefix = \"t\"\n"),
    )
    .unwrap();
    path
}

fn stereo_ramp(frames: usize) -> Vec<f32> {
    (0..frames * 2)
        .map(|i| ((i % 200) as f32 / 100.0) - 1.0)
        .collect()
}

// ---------------------------------------------------------------------------
// `nuclear process`
// ---------------------------------------------------------------------------

#[test]
fn cli_process_passthrough_preserves_samples() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    let config = write_config(dir.path(), 64);
    let samples = stereo_ramp(1000);
    write_wav_interleaved(&input, &samples, WavSpec::default()).unwrap();

    let result = nuclear_bin()
        .arg("process")
        .arg(&input)
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("failed to run nuclear process");
    assert!(
        result.status.success(),
        "nuclear process failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let (processed, spec) = read_wav_interleaved(&output).unwrap();
    assert_eq!(spec.channels, 2);
    assert_eq!(processed, samples);
}

#[test]
fn cli_process_widens_with_silent_channels() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    let config = write_config(dir.path(), 32);
    let samples = stereo_ramp(100);
    write_wav_interleaved(&input, &samples, WavSpec::default()).unwrap();

    let result = nuclear_bin()
        .args(["process", "--out-channels", "4", "--config"])
        .arg(&config)
        .arg(&input)
        .arg(&output)
        .output()
        .unwrap();
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let (processed, spec) = read_wav_interleaved(&output).unwrap();
    assert_eq!(spec.channels, 4);
    for (frame, out) in processed.chunks(4).enumerate() {
        assert_eq!(&out[..2], &samples[frame * 2..frame * 2 + 2]);
        assert_eq!(&out[2..], &[0.0, 0.0]);
    }
}

#[test]
fn cli_process_applies_gain() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    let config = write_config(dir.path(), 16);
    let samples = vec![0.5f32; 64];
    write_wav_interleaved(&input, &samples, WavSpec::default()).unwrap();

    let result = nuclear_bin()
        .args(["process", "--gain-db", "-6.0206", "--config"])
        .arg(&config)
        .arg(&input)
        .arg(&output)
        .output()
        .unwrap();
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let (processed, _) = read_wav_interleaved(&output).unwrap();
    assert!(processed.iter().all(|&s| (s - 0.25).abs() < 1e-4));
}

#[test]
fn cli_process_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let result = nuclear_bin()
        .arg("process")
        .arg(dir.path().join("nope.wav"))
        .arg(dir.path().join("out.wav"))
        .output()
        .unwrap();
    assert!(!result.status.success());
}

// ---------------------------------------------------------------------------
// `nuclear stress`
// ---------------------------------------------------------------------------

#[test]
fn cli_stress_json_is_parseable() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 32);
    let result = nuclear_bin()
        .args(["stress", "--lanes", "3", "--ticks", "50", "--json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let report: serde_json::Value = serde_json::from_slice(&result.stdout).expect("stdout is JSON");
    assert_eq!(report["lanes"], 3);
    assert_eq!(report["threads"], 7);
    assert_eq!(report["ticks"], 50);
    assert_eq!(report["mismatched_ticks"], 0);
    assert!(report["latency_us"]["max"].as_f64().unwrap() >= 0.0);
}

// ---------------------------------------------------------------------------
// `nuclear config`
// ---------------------------------------------------------------------------

#[test]
fn cli_config_init_then_validate() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sub").join("lattice.toml");

    let init = nuclear_bin().args(["config", "init"]).arg(&path).output().unwrap();
    assert!(init.status.success(), "{}", String::from_utf8_lossy(&init.stderr));
    assert!(path.exists());

    let again = nuclear_bin().args(["config", "init"]).arg(&path).output().unwrap();
    assert!(!again.status.success(), "init must not overwrite without --force");

    let forced = nuclear_bin()
        .args(["config", "init", "--force"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(forced.status.success());

    let validate = nuclear_bin().args(["config", "validate"]).arg(&path).output().unwrap();
    assert!(validate.status.success());
    assert!(String::from_utf8_lossy(&validate.stdout).contains("is valid"));
}

#[test]
fn cli_config_validate_rejects_bad_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "out_channels = 500\n").unwrap();

    let result = nuclear_bin().args(["config", "validate"]).arg(&path).output().unwrap();
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("out_channels"));
}

#[test]
fn cli_config_show_prints_toml() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), 128);
    let result = nuclear_bin().args(["config", "show"]).arg(&config).output().unwrap();
    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("period_frames = 128"));
    assert!(stdout.contains("name_prefix = \"t\""));
}
