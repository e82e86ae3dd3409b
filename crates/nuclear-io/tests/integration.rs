//! Integration tests for nuclear-io WAV helpers.

use nuclear_io::{Error, WavFormat, WavSpec, read_wav_info, read_wav_interleaved, write_wav_interleaved};
use tempfile::TempDir;

fn ramp(frames: usize, channels: usize) -> Vec<f32> {
    (0..frames * channels)
        .map(|i| {
            let channel = i % channels;
            let frame = i / channels;
            (frame as f32 / frames as f32) * if channel % 2 == 0 { 0.5 } else { -0.5 }
        })
        .collect()
}

#[test]
fn float_multichannel_is_preserved_exactly() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("six.wav");
    let spec = WavSpec {
        channels: 6,
        sample_rate: 48000,
        bits_per_sample: 32,
    };
    let samples = ramp(480, 6);

    write_wav_interleaved(&path, &samples, spec).unwrap();
    let (loaded, loaded_spec) = read_wav_interleaved(&path).unwrap();

    assert_eq!(loaded_spec, spec);
    assert_eq!(loaded, samples);
}

#[test]
fn pcm16_is_preserved_within_quantisation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stereo16.wav");
    let spec = WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
    };
    let samples = ramp(256, 2);

    write_wav_interleaved(&path, &samples, spec).unwrap();
    let (loaded, _) = read_wav_interleaved(&path).unwrap();

    assert_eq!(loaded.len(), samples.len());
    for (a, b) in loaded.iter().zip(&samples) {
        assert!((a - b).abs() < 1.0 / 16384.0, "{a} vs {b}");
    }
}

#[test]
fn info_reports_frames_and_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("info.wav");
    let spec = WavSpec {
        channels: 4,
        sample_rate: 48000,
        bits_per_sample: 24,
    };
    write_wav_interleaved(&path, &ramp(4800, 4), spec).unwrap();

    let info = read_wav_info(&path).unwrap();
    assert_eq!(info.channels, 4);
    assert_eq!(info.num_frames, 4800);
    assert_eq!(info.format, WavFormat::Pcm);
    assert!((info.duration_secs - 0.1).abs() < 1e-9);
}

#[test]
fn ragged_buffer_is_rejected_before_creating_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ragged.wav");
    let spec = WavSpec {
        channels: 3,
        ..WavSpec::default()
    };
    let result = write_wav_interleaved(&path, &[0.0; 7], spec);
    assert!(matches!(result, Err(Error::Shape(_))));
    assert!(!path.exists());
}

#[test]
fn unsupported_bit_depth_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("eight.wav");
    let spec = WavSpec {
        bits_per_sample: 8,
        ..WavSpec::default()
    };
    assert!(matches!(
        write_wav_interleaved(&path, &[0.0; 4], spec),
        Err(Error::UnsupportedFormat(_))
    ));
}
