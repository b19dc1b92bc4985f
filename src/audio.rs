//! Synthesized audio references and their durations.
//!
//! The TTS engine lives outside this crate. What arrives here is its
//! outcome: a reference to the produced clip plus the clip length, or a
//! failure. WAV clips can be measured directly from their headers.

use crate::error::{LipSyncError, Result};
use base64::Engine;
use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Where the synthesized clip can be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioRef {
    /// A file written by the TTS engine.
    Path(PathBuf),
    /// An in-memory clip, serialized as base64.
    Bytes(#[serde(serialize_with = "serialize_base64")] Bytes),
}

fn serialize_base64<S: Serializer>(
    bytes: &Bytes,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// What the TTS subsystem reports once synthesis finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// Audio was produced. `duration_ms` is as reported upstream and is
    /// validated by the pipeline.
    Synthesized { audio: AudioRef, duration_ms: i64 },
    /// Synthesis failed; there is nothing to animate.
    Failed { reason: String },
}

impl SynthesisOutcome {
    /// Outcome for a WAV file, measured from its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a WAV file.
    pub fn from_wav_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let duration_ms = wav_file_duration_ms(&path)?;
        Ok(Self::Synthesized {
            audio: AudioRef::Path(path),
            duration_ms,
        })
    }

    /// Outcome for an in-memory WAV clip.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a WAV stream.
    pub fn from_wav_bytes(bytes: Bytes) -> Result<Self> {
        let duration_ms = wav_bytes_duration_ms(&bytes)?;
        Ok(Self::Synthesized {
            audio: AudioRef::Bytes(bytes),
            duration_ms,
        })
    }
}

fn duration_from_header<R: std::io::Read>(reader: &hound::WavReader<R>) -> Result<i64> {
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(LipSyncError::Audio("WAV header has a zero sample rate".into()));
    }
    let frames = u64::from(reader.duration());
    let ms = (frames * 1_000 + u64::from(spec.sample_rate) / 2) / u64::from(spec.sample_rate);
    Ok(ms as i64)
}

/// Clip length of a WAV file in milliseconds, rounded to nearest.
///
/// # Errors
///
/// Returns an error if the file cannot be read as WAV.
pub fn wav_file_duration_ms(path: &Path) -> Result<i64> {
    let reader = hound::WavReader::open(path)?;
    duration_from_header(&reader)
}

/// Clip length of an in-memory WAV stream in milliseconds.
///
/// # Errors
///
/// Returns an error if the bytes cannot be read as WAV.
pub fn wav_bytes_duration_ms(bytes: &[u8]) -> Result<i64> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    duration_from_header(&reader)
}
