//! Selene: phoneme-to-viseme lip sync for a local voice assistant.
//!
//! Given the text of a spoken reply and the length of its synthesized
//! audio, this crate produces a gapless, time-aligned track of mouth shapes
//! for an animation front-end to play alongside the audio:
//!
//! text → Phonemizer → Duration estimator → Viseme mapper → Sync assembler
//!
//! # Architecture
//!
//! - **Phonemizer** ([`phonemize`]): normalizes text and runs a G2P backend
//!   (misaki-rs or a pronunciation lexicon). Availability is a capability
//!   loaded once at startup.
//! - **Duration estimator** ([`duration`]): spreads the clip length over
//!   phonemes by class weight, exact to the millisecond.
//! - **Viseme mapper** ([`viseme`]): static ARPABET → mouth-shape table.
//! - **Fallback timer** ([`fallback`]): word/syllable timing used when no
//!   phonemizer is loaded, with the same output contract.
//! - **Sync assembler** ([`sync`]): absolute spans plus invariant checks.
//! - **Pipeline** ([`pipeline`]): picks the mode once per request and pairs
//!   the track with the audio reference.

pub mod audio;
pub mod config;
pub mod duration;
pub mod error;
pub mod fallback;
pub mod phonemize;
pub mod pipeline;
pub mod startup;
pub mod sync;
pub mod viseme;

pub use audio::{AudioRef, SynthesisOutcome};
pub use config::SeleneConfig;
pub use error::{LipSyncError, Result};
pub use phonemize::{G2pBackend, Phoneme, PhonemizerCapability};
pub use pipeline::{LipSyncPipeline, SpeechResponse, SyncMode};
pub use startup::{InitializedLipSync, LipSyncTables};
pub use sync::{SyncTrack, TimedEvent};
pub use viseme::{VisemeCategory, VisemeTable};
