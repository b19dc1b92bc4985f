//! Error types for the lip-sync pipeline.
//!
//! Phonemizer unavailability is deliberately absent: it is a capability
//! state (see [`crate::phonemize::PhonemizerCapability`]) that selects the
//! fallback mode, not a failure.

/// Top-level error type for lip-sync track generation.
#[derive(Debug, thiserror::Error)]
pub enum LipSyncError {
    /// The upstream audio duration was zero or negative.
    #[error("invalid audio duration: {0} ms")]
    InvalidDuration(i64),

    /// An assembled track broke the gapless coverage contract.
    #[error("sync track invariant violated: {0}")]
    AssemblyInvariantViolation(String),

    /// The G2P backend failed on a particular utterance.
    #[error("phonemizer error: {0}")]
    Phonemizer(String),

    /// Audio reference could not be inspected (bad WAV header, etc).
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for LipSyncError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => Self::Io(io),
            other => Self::Audio(other.to_string()),
        }
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, LipSyncError>;
