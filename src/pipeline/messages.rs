//! Types handed back to the caller once a reply has been voiced.

use crate::audio::AudioRef;
use crate::sync::SyncTrack;
use serde::{Deserialize, Serialize};

/// How a request's track was produced. Fixed for the whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Phoneme-based timing from a loaded G2P backend.
    Phonemic,
    /// Word/syllable timing from text alone.
    Fallback,
}

impl SyncMode {
    /// Label for status output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Phonemic => "PHONEME-BASED",
            Self::Fallback => "TIMING-BASED",
        }
    }
}

/// Speech audio paired with its lip-sync track.
///
/// `lipsync` is `None` when the track could not be built; the audio is
/// still delivered in that case. `audio` is `None` only when synthesis
/// itself failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechResponse {
    pub audio: Option<AudioRef>,
    pub lipsync: Option<SyncTrack>,
    pub mode: SyncMode,
    /// Why lip sync or audio is missing, for the caller's logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl SpeechResponse {
    /// Whether the front-end has anything to animate.
    pub fn has_animation(&self) -> bool {
        self.lipsync.is_some()
    }
}
