//! Request-level orchestration of the lip-sync stages.
//!
//! ```text
//! text ─┬─ Phonemic: phonemize → estimate → assemble ─┐
//!       └─ Fallback: fallback_track ───────────────────┴─► SyncTrack
//! ```
//!
//! The mode is chosen once, when [`LipSyncPipeline::begin`] snapshots the
//! phonemizer capability. Nothing after that point looks at the live flag.

use super::messages::{SpeechResponse, SyncMode};
use crate::audio::SynthesisOutcome;
use crate::config::{FallbackConfig, SeleneConfig};
use crate::duration::{estimate, validate_total};
use crate::error::{LipSyncError, Result};
use crate::fallback::fallback_track;
use crate::phonemize::{Phonemization, PhonemizerCapability, PhonemizerSnapshot};
use crate::startup::{InitializedLipSync, LipSyncTables};
use crate::sync::{SyncTrack, assemble};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared, read-only lip-sync pipeline.
///
/// Cheap to clone; safe to use from many threads at once.
#[derive(Debug, Clone)]
pub struct LipSyncPipeline {
    tables: Arc<LipSyncTables>,
    phonemizer: PhonemizerCapability,
    fallback: FallbackConfig,
    merge_repeats: bool,
}

impl LipSyncPipeline {
    /// Create a pipeline from pre-built tables and an injected capability.
    pub fn new(tables: Arc<LipSyncTables>, phonemizer: PhonemizerCapability) -> Self {
        Self {
            tables,
            phonemizer,
            fallback: FallbackConfig::default(),
            merge_repeats: true,
        }
    }

    /// Create a pipeline from startup state and the config it came from.
    pub fn with_models(config: &SeleneConfig, models: InitializedLipSync) -> Self {
        Self {
            tables: models.tables,
            phonemizer: models.phonemizer,
            fallback: config.fallback.clone(),
            merge_repeats: config.timing.merge_repeats,
        }
    }

    /// The capability this pipeline consults at request start.
    pub fn phonemizer(&self) -> &PhonemizerCapability {
        &self.phonemizer
    }

    /// Start a request, locking its mode.
    pub fn begin(&self) -> SyncRequest<'_> {
        SyncRequest {
            pipeline: self,
            phonemizer: self.phonemizer.snapshot(),
        }
    }

    /// Start a request that ignores the phonemizer.
    pub fn begin_fallback(&self) -> SyncRequest<'_> {
        SyncRequest {
            pipeline: self,
            phonemizer: PhonemizerSnapshot::Unavailable,
        }
    }

    /// Build a track for `text` spoken over `total_duration_ms`.
    ///
    /// # Errors
    ///
    /// See [`SyncRequest::run`].
    pub fn sync(&self, text: &str, total_duration_ms: i64) -> Result<SyncTrack> {
        self.begin().run(text, total_duration_ms)
    }

    /// Pair a synthesis outcome with its track.
    ///
    /// Lip-sync failures never cost the caller the audio: the response
    /// carries the audio with `lipsync: None` and a warning.
    pub fn respond(&self, text: &str, outcome: SynthesisOutcome) -> SpeechResponse {
        self.begin().respond(text, outcome)
    }
}

/// One in-flight request with its mode fixed.
pub struct SyncRequest<'a> {
    pipeline: &'a LipSyncPipeline,
    phonemizer: PhonemizerSnapshot,
}

impl SyncRequest<'_> {
    pub fn mode(&self) -> SyncMode {
        if self.phonemizer.is_available() {
            SyncMode::Phonemic
        } else {
            SyncMode::Fallback
        }
    }

    /// Produce the track.
    ///
    /// # Errors
    ///
    /// - [`LipSyncError::InvalidDuration`] when `total_duration_ms <= 0`.
    /// - [`LipSyncError::Phonemizer`] when the backend fails on this text.
    /// - [`LipSyncError::AssemblyInvariantViolation`] on an internal timing bug.
    pub fn run(&self, text: &str, total_duration_ms: i64) -> Result<SyncTrack> {
        let total = validate_total(total_duration_ms)?;
        let pipeline = self.pipeline;

        let track = match self.phonemizer.phonemize(text)? {
            Phonemization::Phonemes(phonemes) => {
                let pairs = estimate(phonemes, total_duration_ms, &pipeline.tables.weights)?;
                assemble(
                    &pairs,
                    &pipeline.tables.visemes,
                    total,
                    pipeline.merge_repeats,
                )?
            }
            Phonemization::Unavailable => {
                fallback_track(text, total_duration_ms, &pipeline.fallback)?
            }
        };

        debug!(
            mode = self.mode().label(),
            events = track.len(),
            total_ms = total,
            "built lip-sync track"
        );
        Ok(track)
    }

    /// See [`LipSyncPipeline::respond`].
    pub fn respond(&self, text: &str, outcome: SynthesisOutcome) -> SpeechResponse {
        let mode = self.mode();
        match outcome {
            SynthesisOutcome::Failed { reason } => {
                warn!("speech synthesis failed, no audio or lip sync: {reason}");
                SpeechResponse {
                    audio: None,
                    lipsync: None,
                    mode,
                    warning: Some(format!("synthesis failed: {reason}")),
                }
            }
            SynthesisOutcome::Synthesized { audio, duration_ms } => {
                match self.run(text, duration_ms) {
                    Ok(track) => SpeechResponse {
                        audio: Some(audio),
                        lipsync: Some(track),
                        mode,
                        warning: None,
                    },
                    Err(e) => {
                        // Invariant violations were already logged by the assembler.
                        if !matches!(e, LipSyncError::AssemblyInvariantViolation(_)) {
                            warn!(error = %e, "lip sync dropped for this reply");
                        }
                        SpeechResponse {
                            audio: Some(audio),
                            lipsync: None,
                            mode,
                            warning: Some(e.to_string()),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::audio::AudioRef;
    use crate::phonemize::{G2pBackend, LexiconBackend};
    use crate::viseme::VisemeCategory;
    use std::path::PathBuf;

    fn lexicon() -> Arc<dyn G2pBackend> {
        Arc::new(LexiconBackend::from_entries([
            ("hello", "HH AH0 L OW1"),
            ("world", "W ER1 L D"),
            ("mama", "M AA1 M AH0"),
        ]))
    }

    fn phonemic_pipeline() -> LipSyncPipeline {
        LipSyncPipeline::new(
            Arc::new(LipSyncTables::default()),
            PhonemizerCapability::available(lexicon()),
        )
    }

    fn fallback_pipeline() -> LipSyncPipeline {
        LipSyncPipeline::new(
            Arc::new(LipSyncTables::default()),
            PhonemizerCapability::unavailable("test"),
        )
    }

    fn clip() -> AudioRef {
        AudioRef::Path(PathBuf::from("/tmp/reply.wav"))
    }

    #[test]
    fn test_mode_follows_capability() {
        assert_eq!(phonemic_pipeline().begin().mode(), SyncMode::Phonemic);
        assert_eq!(fallback_pipeline().begin().mode(), SyncMode::Fallback);
        assert_eq!(
            phonemic_pipeline().begin_fallback().mode(),
            SyncMode::Fallback
        );
    }

    #[test]
    fn test_phonemic_track_uses_phonemes() {
        let track = phonemic_pipeline().sync("Mama", 1_000).unwrap();
        let categories: Vec<_> = track.events().iter().map(|e| e.category).collect();
        assert_eq!(
            categories,
            [
                VisemeCategory::Closed,
                VisemeCategory::OpenWide,
                VisemeCategory::Closed,
                VisemeCategory::Mid,
            ]
        );
        // M=2, AA=3, M=2, AH=3 over 1000 ms.
        assert_eq!(track.events()[0].end_ms, 200);
        assert_eq!(track.events()[1].end_ms, 500);
        assert_eq!(track.total_duration_ms(), 1_000);
    }

    #[test]
    fn test_empty_text_is_single_neutral_event_in_both_modes() {
        for pipeline in [phonemic_pipeline(), fallback_pipeline()] {
            let track = pipeline.sync("", 500).unwrap();
            assert_eq!(track.len(), 1);
            let event = track.events()[0];
            assert_eq!(event.category, VisemeCategory::Neutral);
            assert_eq!((event.start_ms, event.end_ms), (0, 500));
        }
    }

    #[test]
    fn test_unspoken_text_is_neutral_in_both_modes() {
        let neutral = SyncTrack::neutral(500).unwrap();
        for text in ["?!", "\u{2014}", "..."] {
            assert_eq!(phonemic_pipeline().sync(text, 500).unwrap(), neutral);
            assert_eq!(fallback_pipeline().sync(text, 500).unwrap(), neutral);
        }
    }

    #[test]
    fn test_invalid_duration_in_both_modes() {
        for pipeline in [phonemic_pipeline(), fallback_pipeline()] {
            for total in [0_i64, -250] {
                let err = pipeline.sync("hello world", total).unwrap_err();
                assert!(matches!(err, LipSyncError::InvalidDuration(t) if t == total));
            }
        }
    }

    #[test]
    fn test_mode_locked_at_entry() {
        let pipeline = phonemic_pipeline();
        let request = pipeline.begin();
        pipeline.phonemizer().mark_unavailable();

        assert_eq!(request.mode(), SyncMode::Phonemic);
        let locked = request.run("hello, world", 900).unwrap();
        assert_eq!(locked, phonemic_pipeline().sync("hello, world", 900).unwrap());

        // New requests see the change.
        assert_eq!(pipeline.begin().mode(), SyncMode::Fallback);
    }

    #[test]
    fn test_respond_pairs_audio_and_track() {
        let response = phonemic_pipeline().respond(
            "hello world",
            SynthesisOutcome::Synthesized {
                audio: clip(),
                duration_ms: 1_200,
            },
        );
        assert_eq!(response.audio, Some(clip()));
        assert!(response.has_animation());
        assert!(response.warning.is_none());
        assert_eq!(response.mode, SyncMode::Phonemic);
    }

    #[test]
    fn test_respond_keeps_audio_on_invalid_duration() {
        let response = fallback_pipeline().respond(
            "hello world",
            SynthesisOutcome::Synthesized {
                audio: clip(),
                duration_ms: 0,
            },
        );
        assert_eq!(response.audio, Some(clip()));
        assert!(!response.has_animation());
        assert!(response.warning.is_some());
    }

    #[test]
    fn test_respond_synthesis_failure() {
        let response = phonemic_pipeline().respond(
            "hello",
            SynthesisOutcome::Failed {
                reason: "voice model missing".into(),
            },
        );
        assert!(response.audio.is_none());
        assert!(response.lipsync.is_none());
    }

    #[test]
    fn test_response_serialization_shape() {
        let response = fallback_pipeline().respond(
            "hi",
            SynthesisOutcome::Synthesized {
                audio: clip(),
                duration_ms: 300,
            },
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["mode"], "fallback");
        assert_eq!(json["audio"]["path"], "/tmp/reply.wav");
        assert_eq!(json["lipsync"][0]["category"], "open");
        assert_eq!(json["lipsync"][0]["start_ms"], 0);
        assert!(json.get("warning").is_none());
    }

    #[test]
    fn test_pipeline_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LipSyncPipeline>();
    }
}
