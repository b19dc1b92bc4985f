//! Phonemizer adapter: text → ordered ARPABET phonemes.
//!
//! The grapheme-to-phoneme model itself is a black box behind
//! [`G2pBackend`]. Whether one is loaded is reported by a
//! [`PhonemizerCapability`], created once at process start and injected
//! into the pipeline. Callers branch on availability once per request.

mod lexicon;
#[cfg(feature = "misaki")]
mod misaki;
pub mod normalize;

pub use lexicon::LexiconBackend;
#[cfg(feature = "misaki")]
pub use misaki::MisakiBackend;
pub use normalize::{TextToken, normalize};

use crate::config::{PhonemizerBackendKind, PhonemizerConfig};
use crate::error::Result;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Symbol emitted for pause punctuation.
pub const PAUSE_SYMBOL: &str = "SIL";

/// One phoneme of an utterance, without timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phoneme {
    /// ARPABET symbol, possibly with a stress digit (`AH0`), or [`PAUSE_SYMBOL`].
    pub symbol: String,
    /// Position within the utterance, starting at zero.
    pub index: usize,
}

impl Phoneme {
    pub fn new(symbol: impl Into<String>, index: usize) -> Self {
        Self {
            symbol: symbol.into(),
            index,
        }
    }

    /// Whether this is a pause rather than a speech sound.
    pub fn is_pause(&self) -> bool {
        self.symbol == PAUSE_SYMBOL
    }
}

impl fmt::Display for Phoneme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// A loaded grapheme-to-phoneme model.
///
/// Implementations receive one normalized, lowercase word at a time and
/// return its ARPABET symbols.
pub trait G2pBackend: Send + Sync {
    /// Convert a single word to ARPABET symbols.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LipSyncError::Phonemizer`] if the model fails.
    fn word_to_phonemes(&self, word: &str) -> Result<Vec<String>>;

    /// Human-readable backend name.
    fn name(&self) -> &'static str;
}

/// Result of asking the adapter for phonemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phonemization {
    /// The backend produced a (possibly empty) phoneme sequence.
    Phonemes(Vec<Phoneme>),
    /// No backend is loaded; use the fallback timer.
    Unavailable,
}

/// Run `backend` over normalized `text`.
///
/// Pause punctuation becomes a single [`PAUSE_SYMBOL`] phoneme. Indices are
/// assigned in utterance order after pauses are collapsed.
///
/// # Errors
///
/// Propagates backend failures.
pub fn phonemize_with(backend: &dyn G2pBackend, text: &str) -> Result<Vec<Phoneme>> {
    let mut symbols: Vec<String> = Vec::new();
    for token in normalize(text) {
        match token {
            TextToken::Word(word) => symbols.extend(backend.word_to_phonemes(&word)?),
            TextToken::Pause => {
                if symbols.last().is_some_and(|s| s != PAUSE_SYMBOL) {
                    symbols.push(PAUSE_SYMBOL.to_owned());
                }
            }
        }
    }

    let phonemes: Vec<Phoneme> = symbols
        .into_iter()
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(index, symbol)| Phoneme::new(symbol, index))
        .collect();
    debug!(
        backend = backend.name(),
        count = phonemes.len(),
        "phonemized utterance"
    );
    Ok(phonemes)
}

/// Availability of the phonemizer, decided at process start.
///
/// Cloning shares the same availability flag, so an operator holding one
/// clone can mark the model unloaded without touching process globals.
/// Requests snapshot the flag once on entry.
#[derive(Clone)]
pub struct PhonemizerCapability {
    backend: Option<Arc<dyn G2pBackend>>,
    available: Arc<AtomicBool>,
    reason: Option<String>,
}

impl fmt::Debug for PhonemizerCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhonemizerCapability")
            .field("backend", &self.backend_name())
            .field("available", &self.is_available())
            .field("reason", &self.reason)
            .finish()
    }
}

impl PhonemizerCapability {
    /// A capability backed by a loaded model.
    pub fn available(backend: Arc<dyn G2pBackend>) -> Self {
        Self {
            backend: Some(backend),
            available: Arc::new(AtomicBool::new(true)),
            reason: None,
        }
    }

    /// A capability with no model; every request uses the fallback timer.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            backend: None,
            available: Arc::new(AtomicBool::new(false)),
            reason: Some(reason.into()),
        }
    }

    /// Load the configured backend.
    ///
    /// Never fails: a backend that cannot be loaded yields an unavailable
    /// capability and a warning.
    pub fn load(config: &PhonemizerConfig) -> Self {
        match config.backend {
            PhonemizerBackendKind::Disabled => {
                info!("phonemizer disabled by configuration; lip sync is timing-based");
                Self::unavailable("disabled by configuration")
            }
            PhonemizerBackendKind::Lexicon => {
                let Some(path) = config.lexicon_path.as_deref() else {
                    warn!("lexicon phonemizer selected but no lexicon_path configured");
                    return Self::unavailable("no lexicon path configured");
                };
                match LexiconBackend::from_file(path) {
                    Ok(backend) => {
                        info!(
                            "loaded pronunciation lexicon ({} words) from {}",
                            backend.len(),
                            path.display()
                        );
                        Self::available(Arc::new(backend))
                    }
                    Err(e) => {
                        warn!(error = %e, "pronunciation lexicon unavailable; lip sync is timing-based");
                        Self::unavailable(e.to_string())
                    }
                }
            }
            PhonemizerBackendKind::Misaki => Self::load_misaki(config.british),
        }
    }

    #[cfg(feature = "misaki")]
    fn load_misaki(british: bool) -> Self {
        info!("initialising misaki phonemizer (british={british})");
        Self::available(Arc::new(MisakiBackend::new(british)))
    }

    #[cfg(not(feature = "misaki"))]
    fn load_misaki(_british: bool) -> Self {
        warn!("built without the `misaki` feature; lip sync is timing-based");
        Self::unavailable("built without the misaki feature")
    }

    /// Whether phoneme-based lip sync is currently possible.
    pub fn is_available(&self) -> bool {
        self.backend.is_some() && self.available.load(Ordering::Acquire)
    }

    /// Mark the model as unloaded. Requests already in flight are unaffected.
    pub fn mark_unavailable(&self) {
        self.available.store(false, Ordering::Release);
    }

    /// Mark the model as loaded again. No effect without a backend.
    pub fn mark_available(&self) {
        if self.backend.is_some() {
            self.available.store(true, Ordering::Release);
        }
    }

    /// Lock in the phonemizer for one request.
    pub fn snapshot(&self) -> PhonemizerSnapshot {
        match &self.backend {
            Some(backend) if self.is_available() => {
                PhonemizerSnapshot::Loaded(Arc::clone(backend))
            }
            _ => PhonemizerSnapshot::Unavailable,
        }
    }

    /// Name of the configured backend, if any.
    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    /// Why the capability is unavailable, when it never loaded.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Phonemize `text` with whatever is loaded right now.
    ///
    /// # Errors
    ///
    /// Propagates backend failures when a model is loaded.
    pub fn phonemize(&self, text: &str) -> Result<Phonemization> {
        self.snapshot().phonemize(text)
    }
}

/// The phonemizer as seen by a single request.
///
/// Taken once at request start; later changes to the capability's flag do
/// not reach it.
#[derive(Clone)]
pub enum PhonemizerSnapshot {
    Loaded(Arc<dyn G2pBackend>),
    Unavailable,
}

impl fmt::Debug for PhonemizerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(backend) => f.debug_tuple("Loaded").field(&backend.name()).finish(),
            Self::Unavailable => f.write_str("Unavailable"),
        }
    }
}

impl PhonemizerSnapshot {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Phonemize `text`, or report that no model is loaded.
    ///
    /// # Errors
    ///
    /// Propagates backend failures when a model is loaded.
    pub fn phonemize(&self, text: &str) -> Result<Phonemization> {
        match self {
            Self::Loaded(backend) => Ok(Phonemization::Phonemes(phonemize_with(
                backend.as_ref(),
                text,
            )?)),
            Self::Unavailable => Ok(Phonemization::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::error::LipSyncError;
    use std::path::PathBuf;

    struct Spelled;

    impl G2pBackend for Spelled {
        fn word_to_phonemes(&self, word: &str) -> Result<Vec<String>> {
            Ok(word.chars().map(|c| c.to_ascii_uppercase().to_string()).collect())
        }

        fn name(&self) -> &'static str {
            "spelled"
        }
    }

    struct Broken;

    impl G2pBackend for Broken {
        fn word_to_phonemes(&self, _word: &str) -> Result<Vec<String>> {
            Err(LipSyncError::Phonemizer("model crashed".into()))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_phonemize_assigns_indices_in_order() {
        let phonemes = phonemize_with(&Spelled, "ab, c").unwrap();
        let symbols: Vec<_> = phonemes.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, ["A", "B", PAUSE_SYMBOL, "C"]);
        for (i, p) in phonemes.iter().enumerate() {
            assert_eq!(p.index, i);
        }
        assert!(phonemes[2].is_pause());
    }

    #[test]
    fn test_phonemize_empty_text_is_empty() {
        assert!(phonemize_with(&Spelled, "").unwrap().is_empty());
        assert!(phonemize_with(&Spelled, "?!").unwrap().is_empty());
    }

    #[test]
    fn test_backend_failure_propagates() {
        let err = phonemize_with(&Broken, "hello").unwrap_err();
        assert!(matches!(err, LipSyncError::Phonemizer(_)));
    }

    #[test]
    fn test_unavailable_capability_reports_unavailable() {
        let cap = PhonemizerCapability::unavailable("not installed");
        assert!(!cap.is_available());
        assert_eq!(cap.reason(), Some("not installed"));
        assert_eq!(cap.phonemize("hello").unwrap(), Phonemization::Unavailable);
        // Nothing to re-enable.
        cap.mark_available();
        assert!(!cap.is_available());
    }

    #[test]
    fn test_flag_is_shared_between_clones() {
        let cap = PhonemizerCapability::available(Arc::new(Spelled));
        let operator = cap.clone();
        assert!(cap.is_available());
        operator.mark_unavailable();
        assert!(!cap.is_available());
        assert!(!cap.snapshot().is_available());
        operator.mark_available();
        assert!(cap.snapshot().is_available());
    }

    #[test]
    fn test_snapshot_outlives_flag_change() {
        let cap = PhonemizerCapability::available(Arc::new(Spelled));
        let snapshot = cap.snapshot();
        cap.mark_unavailable();
        match snapshot.phonemize("ab").unwrap() {
            Phonemization::Phonemes(phonemes) => assert_eq!(phonemes.len(), 2),
            Phonemization::Unavailable => panic!("snapshot lost its backend"),
        }
        assert_eq!(cap.phonemize("ab").unwrap(), Phonemization::Unavailable);
    }

    #[test]
    fn test_load_disabled() {
        let config = PhonemizerConfig {
            backend: PhonemizerBackendKind::Disabled,
            ..PhonemizerConfig::default()
        };
        assert!(!PhonemizerCapability::load(&config).is_available());
    }

    #[test]
    fn test_load_lexicon_missing_file_is_unavailable() {
        let config = PhonemizerConfig {
            backend: PhonemizerBackendKind::Lexicon,
            lexicon_path: Some(PathBuf::from("/nonexistent/selene/lexicon.dict")),
            ..PhonemizerConfig::default()
        };
        let cap = PhonemizerCapability::load(&config);
        assert!(!cap.is_available());
        assert!(cap.reason().is_some());
    }

    #[test]
    fn test_load_lexicon_without_path_is_unavailable() {
        let config = PhonemizerConfig {
            backend: PhonemizerBackendKind::Lexicon,
            lexicon_path: None,
            ..PhonemizerConfig::default()
        };
        assert!(!PhonemizerCapability::load(&config).is_available());
    }
}
