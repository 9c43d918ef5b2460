use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn polymix() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("polymix"))
}

fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
    let data_len = (samples.len() * 2) as u32;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
    bytes.extend_from_slice(&(channels * 2).to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    fs::write(path, bytes).unwrap();
}

#[test]
fn render_tone_writes_requested_length() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tone.raw");
    polymix()
        .args(["render", "--tone", "440", "--ms", "100", "--out"])
        .arg(&out)
        .assert()
        .success();

    let bytes = fs::read(&out).unwrap();
    assert_eq!(bytes.len(), 19_200);
    assert!(bytes.iter().any(|byte| *byte != 0));
}

#[test]
fn render_follows_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("settings.json");
    fs::write(
        &settings,
        r#"{"channels": 1, "sample_format": "u8", "master_volume": 0}"#,
    )
    .unwrap();
    let out = dir.path().join("mono.raw");
    polymix()
        .args(["render", "--tone", "220", "--ms", "100", "--settings"])
        .arg(&settings)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let bytes = fs::read(&out).unwrap();
    assert_eq!(bytes.len(), 4_800);
    assert!(bytes.iter().all(|byte| *byte == 0x80));
}

#[test]
fn render_mixes_wav_files() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("input.wav");
    write_wav(&wav, 48_000, 2, &vec![4_000i16; 9_600]);
    let out = dir.path().join("file.raw");
    polymix()
        .args(["render", "--ms", "50", "--file"])
        .arg(&wav)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let bytes = fs::read(&out).unwrap();
    assert_eq!(bytes.len(), 9_600);
    assert_eq!(&bytes[0..2], &4_000i16.to_le_bytes());
}

#[test]
fn render_applies_post_mix_effects() {
    let dir = tempfile::tempdir().unwrap();
    let effects = dir.path().join("effects.json");
    fs::write(
        &effects,
        r#"[{"GainSettings": {"enabled": true, "gain": 0.0}}]"#,
    )
    .unwrap();
    let out = dir.path().join("silent.raw");
    polymix()
        .args(["render", "--tone", "440", "--ms", "20", "--effects-json"])
        .arg(&effects)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let bytes = fs::read(&out).unwrap();
    assert_eq!(bytes.len(), 3_840);
    assert!(bytes.iter().all(|byte| *byte == 0));
}

#[test]
fn render_without_sources_fails() {
    let dir = tempfile::tempdir().unwrap();
    polymix()
        .args(["render", "--out"])
        .arg(dir.path().join("empty.raw"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to render"));
}

#[test]
fn render_rejects_invalid_settings() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("settings.json");
    fs::write(&settings, r#"{"channels": 0}"#).unwrap();
    polymix()
        .args(["render", "--tone", "440", "--settings"])
        .arg(&settings)
        .arg("--out")
        .arg(dir.path().join("bad.raw"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("settings"));
}
