//! Startup initialization: builds the lookup tables and loads the phonemizer.
//!
//! Call [`initialize`] once at process start. The returned tables are
//! immutable and shared via `Arc`; the phonemizer capability records whether
//! phoneme-based lip sync is possible for the lifetime of the process.

use crate::config::SeleneConfig;
use crate::duration::DurationWeights;
use crate::error::{LipSyncError, Result};
use crate::phonemize::PhonemizerCapability;
use crate::pipeline::SyncMode;
use crate::viseme::VisemeTable;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Read-only configuration data shared by every request.
#[derive(Debug, Clone, Default)]
pub struct LipSyncTables {
    pub visemes: VisemeTable,
    pub weights: DurationWeights,
}

impl LipSyncTables {
    /// Built-in tables with the config's overrides applied.
    pub fn from_config(config: &SeleneConfig) -> Self {
        Self {
            visemes: VisemeTable::with_overrides(&config.visemes),
            weights: DurationWeights::with_overrides(&config.timing.weights),
        }
    }
}

/// Everything the pipeline needs, loaded once.
#[derive(Debug, Clone)]
pub struct InitializedLipSync {
    pub tables: Arc<LipSyncTables>,
    pub phonemizer: PhonemizerCapability,
}

/// Validate `config`, build tables and load the phonemizer.
///
/// # Errors
///
/// Returns [`LipSyncError::Config`] listing every validation problem.
/// An unavailable phonemizer is not an error.
pub fn initialize(config: &SeleneConfig) -> Result<InitializedLipSync> {
    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            warn!("invalid configuration: {problem}");
        }
        return Err(LipSyncError::Config(problems.join("; ")));
    }

    let start = Instant::now();
    let tables = Arc::new(LipSyncTables::from_config(config));
    let phonemizer = PhonemizerCapability::load(&config.phonemizer);

    info!(
        visemes = tables.visemes.len(),
        phonemizer = phonemizer.backend_name().unwrap_or("none"),
        available = phonemizer.is_available(),
        "lip sync initialised in {}ms",
        start.elapsed().as_millis()
    );

    Ok(InitializedLipSync { tables, phonemizer })
}

/// Snapshot of what the process can do, for status banners and health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyStatus {
    pub phonemizer_backend: Option<&'static str>,
    pub phonemizer_available: bool,
    pub unavailable_reason: Option<String>,
    pub mode: SyncMode,
}

impl DependencyStatus {
    pub fn check(models: &InitializedLipSync) -> Self {
        let available = models.phonemizer.is_available();
        Self {
            phonemizer_backend: models.phonemizer.backend_name(),
            phonemizer_available: available,
            unavailable_reason: models.phonemizer.reason().map(str::to_owned),
            mode: if available {
                SyncMode::Phonemic
            } else {
                SyncMode::Fallback
            },
        }
    }
}
