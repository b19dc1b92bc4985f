//! Timing-based fallback used when no phonemizer is loaded.
//!
//! Words share the clip in proportion to their length. Inside a word the
//! mouth alternates open and closed, one pair per estimated syllable. There
//! is no phonetic accuracy here, only a plausible talking rhythm, but the
//! track obeys the same invariants as the phonemic path.

use crate::config::FallbackConfig;
use crate::duration::{allocate, validate_total};
use crate::error::Result;
use crate::sync::{SyncTrack, build_track};
use crate::viseme::VisemeCategory;

/// Letters counted as vowels when estimating syllables.
fn is_vowel_letter(ch: char) -> bool {
    matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Rough syllable count: groups of consecutive vowel letters, minimum 1.
/// A trailing silent `e` after a consonant is not counted ("make").
pub fn estimate_syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let mut groups = 0;
    let mut in_group = false;
    for &ch in &letters {
        let vowel = is_vowel_letter(ch);
        if vowel && !in_group {
            groups += 1;
        }
        in_group = vowel;
    }

    let n = letters.len();
    if groups > 1 && n >= 3 && letters[n - 1] == 'e' && !is_vowel_letter(letters[n - 2]) {
        groups -= 1;
    }
    groups.max(1)
}

/// Length used to weight a word: its alphanumeric characters.
/// Zero for bare punctuation, which is not spoken.
fn word_weight(word: &str) -> u64 {
    word.chars().filter(|c| c.is_alphanumeric()).count() as u64
}

/// Build an approximate track straight from text.
///
/// Text with no spoken words yields a single neutral event.
///
/// # Errors
///
/// Returns [`crate::LipSyncError::InvalidDuration`] when
/// `total_duration_ms <= 0`.
pub fn fallback_track(
    text: &str,
    total_duration_ms: i64,
    config: &FallbackConfig,
) -> Result<SyncTrack> {
    let total = validate_total(total_duration_ms)?;
    let (words, weights): (Vec<&str>, Vec<u64>) = text
        .split_whitespace()
        .map(|w| (w, word_weight(w)))
        .filter(|(_, weight)| *weight > 0)
        .unzip();
    if words.is_empty() {
        return SyncTrack::neutral(total);
    }

    let word_shares = allocate(&weights, total);

    let open_weight = u64::from(config.open_weight.max(1));
    let closed_weight = u64::from(config.closed_weight.max(1));

    let mut segments: Vec<(VisemeCategory, u64)> = Vec::new();
    for (word, share) in words.iter().zip(word_shares) {
        let beats = estimate_syllables(word);
        let pattern: Vec<u64> = (0..beats)
            .flat_map(|_| [open_weight, closed_weight])
            .collect();
        let beat_shares = allocate(&pattern, share);
        segments.extend(beat_shares.into_iter().enumerate().map(|(i, ms)| {
            let category = if i % 2 == 0 {
                VisemeCategory::Open
            } else {
                VisemeCategory::Closed
            };
            (category, ms)
        }));
    }

    // Repeats cannot occur from alternation alone, but a dropped zero-length
    // beat can put two equal categories side by side.
    build_track(segments, total, true)
}
