//! The finalized recording artifact.
//!
//! A completed capture session yields a [`RecordedArtifact`]: the accumulated
//! mono PCM samples serialized into an in-memory WAV container, exposed as
//! raw bytes, prefix-free base64, or a data URL. The artifact also writes the
//! local playback preview consumed by `bedtime replay`.

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::io::Cursor;
use std::path::Path;

use super::device::CaptureError;

/// Prefix used for the self-describing data-URL form of the artifact.
const WAV_DATA_URL_PREFIX: &str = "data:audio/wav;base64,";

/// A finalized recording: WAV container bytes built from mono i16 PCM.
pub struct RecordedArtifact {
    wav_bytes: Vec<u8>,
    duration_secs: f32,
}

impl RecordedArtifact {
    /// Serializes mono samples into a 16-bit PCM WAV container in memory.
    ///
    /// # Errors
    /// - `Encoding` if no samples were captured or the container cannot be
    ///   written
    pub fn from_samples(samples: &[i16], sample_rate: u32) -> Result<Self, CaptureError> {
        if samples.is_empty() {
            return Err(CaptureError::Encoding("no samples captured".into()));
        }

        let wav_spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut wav_bytes = Vec::new();
        {
            let cursor = Cursor::new(&mut wav_bytes);
            let mut writer = hound::WavWriter::new(cursor, wav_spec)
                .map_err(|e| CaptureError::Encoding(e.to_string()))?;

            for &sample in samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| CaptureError::Encoding(e.to_string()))?;
            }

            writer
                .finalize()
                .map_err(|e| CaptureError::Encoding(e.to_string()))?;
        }

        let duration_secs = samples.len() as f32 / sample_rate as f32;
        tracing::info!(
            "Artifact finalized: {:.2}s ({} samples at {}Hz, {} bytes)",
            duration_secs,
            samples.len(),
            sample_rate,
            wav_bytes.len()
        );

        Ok(Self {
            wav_bytes,
            duration_secs,
        })
    }

    /// The raw WAV container bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.wav_bytes
    }

    /// Recording length in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    /// The artifact as prefix-free base64, the form delivered to the
    /// completion callback.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.wav_bytes)
    }

    /// The artifact as a self-describing data URL.
    pub fn to_data_url(&self) -> String {
        format!("{}{}", WAV_DATA_URL_PREFIX, self.to_base64())
    }

    /// Writes the artifact to disk, used for the local playback preview.
    ///
    /// # Errors
    /// - If the file cannot be written
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.wav_bytes)
            .map_err(|e| anyhow!("failed to write preview {}: {e}", path.display()))?;
        tracing::debug!("Playback preview written: {}", path.display());
        Ok(())
    }
}

/// Strips the data-URL prefix from a payload, if present.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    match payload.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_recording_is_an_encoding_error() {
        match RecordedArtifact::from_samples(&[], 16000) {
            Err(CaptureError::Encoding(_)) => {}
            _ => panic!("expected Encoding error for empty samples"),
        }
    }

    #[test]
    fn test_wav_container_round_trip() {
        let samples: Vec<i16> = (0..1600).map(|i| (i % 100) as i16).collect();
        let artifact = RecordedArtifact::from_samples(&samples, 16000).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(artifact.bytes())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
        assert!((artifact.duration_secs() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_base64_forms_agree() {
        let artifact = RecordedArtifact::from_samples(&[1, 2, 3, 4], 8000).unwrap();

        let payload = artifact.to_base64();
        assert!(!payload.contains(','));

        let data_url = artifact.to_data_url();
        assert!(data_url.starts_with("data:audio/wav;base64,"));
        assert_eq!(strip_data_url_prefix(&data_url), payload);
        assert_eq!(strip_data_url_prefix(&payload), payload);

        let decoded = STANDARD.decode(&payload).unwrap();
        assert_eq!(decoded, artifact.bytes());
    }

    #[test]
    fn test_write_wav_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preview.wav");

        let artifact = RecordedArtifact::from_samples(&[0, 1, 2], 8000).unwrap();
        artifact.write_wav(&path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), artifact.bytes());
    }
}
