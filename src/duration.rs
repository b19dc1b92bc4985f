//! Duration estimation: spreading a clip's length over its phonemes.
//!
//! Each phoneme class carries a relative weight. A clip of known length is
//! divided proportionally to those weights with integer milliseconds; the
//! rounding remainder is given to the last phoneme so the parts always sum
//! to the whole.

use crate::error::{LipSyncError, Result};
use crate::phonemize::{PAUSE_SYMBOL, Phoneme};
use crate::viseme::strip_stress;
use std::collections::{BTreeMap, HashMap};

/// Weight for symbols the table does not list.
pub const DEFAULT_WEIGHT: u32 = 2;

const DIPHTHONG_WEIGHT: u32 = 4;
const VOWEL_WEIGHT: u32 = 3;
const PAUSE_WEIGHT: u32 = 3;
const CONTINUANT_WEIGHT: u32 = 2;
const STOP_WEIGHT: u32 = 1;

const DIPHTHONGS: &[&str] = &["AW", "AY", "EY", "OW", "OY"];
const VOWELS: &[&str] = &[
    "AA", "AE", "AH", "AO", "AX", "AXR", "EH", "ER", "IH", "IX", "IY", "UH", "UW", "UX",
];
const CONTINUANTS: &[&str] = &[
    "F", "V", "TH", "DH", "S", "Z", "SH", "ZH", "HH", "M", "N", "NG", "EM", "EN", "NX", "L",
    "EL", "R", "W", "Y",
];
const STOPS: &[&str] = &["P", "B", "T", "D", "K", "G", "DX", "Q", "CH", "JH"];

/// Read-only phoneme duration weight table.
#[derive(Debug, Clone)]
pub struct DurationWeights {
    weights: HashMap<String, u32>,
}

impl Default for DurationWeights {
    fn default() -> Self {
        let mut weights = HashMap::new();
        let classes: [(&[&str], u32); 4] = [
            (DIPHTHONGS, DIPHTHONG_WEIGHT),
            (VOWELS, VOWEL_WEIGHT),
            (CONTINUANTS, CONTINUANT_WEIGHT),
            (STOPS, STOP_WEIGHT),
        ];
        for (symbols, weight) in classes {
            for symbol in symbols {
                weights.insert((*symbol).to_owned(), weight);
            }
        }
        weights.insert(PAUSE_SYMBOL.to_owned(), PAUSE_WEIGHT);
        Self { weights }
    }
}

impl DurationWeights {
    /// Default weights with per-symbol overrides. Zero weights are raised to 1.
    pub fn with_overrides(overrides: &BTreeMap<String, u32>) -> Self {
        let mut table = Self::default();
        for (symbol, weight) in overrides {
            let key = strip_stress(symbol.trim()).to_ascii_uppercase();
            table.weights.insert(key, (*weight).max(1));
        }
        table
    }

    /// Weight for a raw symbol (stress digits ignored).
    pub fn weight(&self, symbol: &str) -> u32 {
        let base = strip_stress(symbol);
        self.weights
            .get(base)
            .or_else(|| self.weights.get(&base.to_ascii_uppercase()))
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }
}

/// Check an upstream duration value and convert it to milliseconds.
///
/// # Errors
///
/// Returns [`LipSyncError::InvalidDuration`] for zero or negative values.
pub fn validate_total(total_duration_ms: i64) -> Result<u64> {
    if total_duration_ms <= 0 {
        return Err(LipSyncError::InvalidDuration(total_duration_ms));
    }
    Ok(total_duration_ms as u64)
}

/// Split `total` proportionally to `weights`.
///
/// Each share is floored; the leftover milliseconds go to the last slot.
/// An all-zero weight vector is treated as uniform. Empty in, empty out.
pub fn allocate(weights: &[u64], total: u64) -> Vec<u64> {
    if weights.is_empty() {
        return Vec::new();
    }
    let sum: u64 = weights.iter().sum();
    let mut shares: Vec<u64> = if sum == 0 {
        vec![total / weights.len() as u64; weights.len()]
    } else {
        weights
            .iter()
            .map(|w| ((*w as u128 * total as u128) / sum as u128) as u64)
            .collect()
    };
    let assigned: u64 = shares.iter().sum();
    if let Some(last) = shares.last_mut() {
        *last += total - assigned;
    }
    shares
}

/// Assign each phoneme a duration so the durations sum to `total_duration_ms`.
///
/// Zero phonemes yield an empty allocation; the assembler turns that into a
/// single neutral event.
///
/// # Errors
///
/// Returns [`LipSyncError::InvalidDuration`] when `total_duration_ms <= 0`.
pub fn estimate(
    phonemes: Vec<Phoneme>,
    total_duration_ms: i64,
    weights: &DurationWeights,
) -> Result<Vec<(Phoneme, u64)>> {
    let total = validate_total(total_duration_ms)?;
    let raw: Vec<u64> = phonemes
        .iter()
        .map(|p| u64::from(weights.weight(&p.symbol)))
        .collect();
    let shares = allocate(&raw, total);
    Ok(phonemes.into_iter().zip(shares).collect())
}

/// Heuristic clip length for text that has not been synthesized yet.
///
/// Word count at `words_per_minute` (clamped to at least 30 wpm). Returns 0
/// for text without words.
pub fn estimate_total_ms(text: &str, words_per_minute: f32) -> i64 {
    let words = text.split_whitespace().count() as f64;
    let minutes = words / f64::from(words_per_minute.max(30.0));
    (minutes * 60_000.0).round() as i64
}
