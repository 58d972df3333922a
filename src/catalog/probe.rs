//! Clip metadata probing.
//!
//! Reads duration, sample rate, and channel count without decoding the
//! full stream. WAV headers go through hound; everything else goes through
//! a symphonia format probe.

use crate::error::{Error, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Probed audio metadata for one clip.
#[derive(Debug, Clone, Copy)]
pub struct ClipMeta {
    /// Duration in seconds.
    pub duration_seconds: f64,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Probe a clip's audio metadata.
///
/// Failures are recoverable at the catalog layer: the clip is skipped with
/// a warning rather than aborting the scan.
pub fn probe_clip(path: &Path) -> Result<ClipMeta> {
    let is_wav = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
    if is_wav {
        probe_wav(path)
    } else {
        probe_compressed(path)
    }
}

/// Probe a WAV header with hound.
fn probe_wav(path: &Path) -> Result<ClipMeta> {
    let reader = hound::WavReader::open(path).map_err(|e| Error::ClipProbe {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    let spec = reader.spec();

    if spec.sample_rate == 0 {
        return Err(Error::ClipProbe {
            path: path.to_path_buf(),
            source: "zero sample rate".into(),
        });
    }

    Ok(ClipMeta {
        duration_seconds: f64::from(reader.duration()) / f64::from(spec.sample_rate),
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Probe a compressed format (FLAC, MP3) with symphonia.
fn probe_compressed(path: &Path) -> Result<ClipMeta> {
    let file = File::open(path).map_err(|e| Error::ClipProbe {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::ClipProbe {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::ClipProbe {
            path: path.to_path_buf(),
            source: "no audio tracks".into(),
        })?;

    let params = &track.codec_params;
    let sample_rate = params.sample_rate.ok_or_else(|| Error::ClipProbe {
        path: path.to_path_buf(),
        source: "missing sample rate".into(),
    })?;
    let n_frames = params.n_frames.ok_or_else(|| Error::ClipProbe {
        path: path.to_path_buf(),
        source: "missing frame count".into(),
    })?;
    let channels = params
        .channels
        .map_or(1, symphonia::core::audio::Channels::count);

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    Ok(ClipMeta {
        duration_seconds: n_frames as f64 / f64::from(sample_rate),
        sample_rate,
        channels: channels as u16,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_probe_wav_duration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..22050 {
            writer.write_sample(0i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let meta = probe_clip(&path).unwrap();
        assert!((meta.duration_seconds - 1.0).abs() < 1e-6);
        assert_eq!(meta.sample_rate, 22050);
        assert_eq!(meta.channels, 2);
    }

    #[test]
    fn test_probe_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();

        assert!(matches!(
            probe_clip(&path),
            Err(Error::ClipProbe { .. })
        ));
    }
}
