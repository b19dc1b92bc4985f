//! Sync assembly: timed viseme events and the validated track.

use crate::error::{LipSyncError, Result};
use crate::phonemize::Phoneme;
use crate::viseme::{VisemeCategory, VisemeTable};
use serde::{Deserialize, Serialize};
use tracing::error;

/// One mouth shape held over `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub category: VisemeCategory,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TimedEvent {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Ordered, gapless viseme events covering `[0, total_duration_ms]`.
///
/// Only constructible through validation, so every track handed out obeys
/// the contiguity and coverage invariants. Serializes as a plain list of
/// `{category, start_ms, end_ms}` records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SyncTrack {
    events: Vec<TimedEvent>,
}

impl SyncTrack {
    /// Validate `events` against `total_duration_ms` and wrap them.
    ///
    /// # Errors
    ///
    /// Returns [`LipSyncError::AssemblyInvariantViolation`] if the events are
    /// empty, zero-length, overlapping, gapped, or do not span exactly
    /// `[0, total_duration_ms]`.
    pub fn from_events(events: Vec<TimedEvent>, total_duration_ms: u64) -> Result<Self> {
        check_invariants(&events, total_duration_ms)?;
        Ok(Self { events })
    }

    /// A single neutral event over the whole clip.
    pub fn neutral(total_duration_ms: u64) -> Result<Self> {
        Self::from_events(
            vec![TimedEvent {
                category: VisemeCategory::Neutral,
                start_ms: 0,
                end_ms: total_duration_ms,
            }],
            total_duration_ms,
        )
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// End of the last event, equal to the clip length.
    pub fn total_duration_ms(&self) -> u64 {
        self.events.last().map_or(0, |e| e.end_ms)
    }

    /// Category showing at `t_ms`, if inside the track.
    pub fn category_at(&self, t_ms: u64) -> Option<VisemeCategory> {
        let idx = self.events.partition_point(|e| e.end_ms <= t_ms);
        self.events
            .get(idx)
            .filter(|e| e.start_ms <= t_ms)
            .map(|e| e.category)
    }
}

fn violation(msg: String) -> LipSyncError {
    LipSyncError::AssemblyInvariantViolation(msg)
}

fn check_invariants(events: &[TimedEvent], total_duration_ms: u64) -> Result<()> {
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return Err(violation("track has no events".into()));
    };
    if first.start_ms != 0 {
        return Err(violation(format!(
            "track starts at {} ms instead of 0",
            first.start_ms
        )));
    }
    for (i, event) in events.iter().enumerate() {
        if event.start_ms >= event.end_ms {
            return Err(violation(format!(
                "event {i} has empty span [{}, {}]",
                event.start_ms, event.end_ms
            )));
        }
    }
    for (i, pair) in events.windows(2).enumerate() {
        if pair[0].end_ms != pair[1].start_ms {
            return Err(violation(format!(
                "events {i} and {} are not contiguous ({} ms vs {} ms)",
                i + 1,
                pair[0].end_ms,
                pair[1].start_ms
            )));
        }
    }
    if last.end_ms != total_duration_ms {
        return Err(violation(format!(
            "track ends at {} ms but audio is {total_duration_ms} ms",
            last.end_ms
        )));
    }
    Ok(())
}

/// Turn `(category, duration)` segments into a validated track.
///
/// Zero-length segments are dropped. With `merge_repeats`, adjacent
/// segments showing the same category become one event. An empty segment
/// list produces a single neutral event.
///
/// # Errors
///
/// Returns [`LipSyncError::AssemblyInvariantViolation`] if the durations do
/// not add up to `total_duration_ms`. This is logged at error level.
pub fn build_track(
    segments: impl IntoIterator<Item = (VisemeCategory, u64)>,
    total_duration_ms: u64,
    merge_repeats: bool,
) -> Result<SyncTrack> {
    let mut events: Vec<TimedEvent> = Vec::new();
    let mut cursor = 0_u64;
    let mut segment_count = 0_usize;

    for (category, duration) in segments {
        segment_count += 1;
        if duration == 0 {
            continue;
        }
        let end = cursor + duration;
        match events.last_mut() {
            Some(prev) if merge_repeats && prev.category == category => prev.end_ms = end,
            _ => events.push(TimedEvent {
                category,
                start_ms: cursor,
                end_ms: end,
            }),
        }
        cursor = end;
    }

    if segment_count == 0 {
        return SyncTrack::neutral(total_duration_ms).inspect_err(log_violation);
    }
    if cursor != total_duration_ms {
        let err = violation(format!(
            "{segment_count} segments sum to {cursor} ms but audio is {total_duration_ms} ms"
        ));
        log_violation(&err);
        return Err(err);
    }
    SyncTrack::from_events(events, total_duration_ms).inspect_err(log_violation)
}

fn log_violation(e: &LipSyncError) {
    error!(error = %e, "lip-sync assembly produced an invalid track");
}

/// Assemble estimated phoneme durations into a track.
///
/// Converts relative durations to absolute spans by running sum and maps
/// each phoneme through `table`.
///
/// # Errors
///
/// Returns [`LipSyncError::AssemblyInvariantViolation`] when the durations
/// do not cover exactly `total_duration_ms`.
pub fn assemble(
    pairs: &[(Phoneme, u64)],
    table: &VisemeTable,
    total_duration_ms: u64,
    merge_repeats: bool,
) -> Result<SyncTrack> {
    build_track(
        pairs
            .iter()
            .map(|(phoneme, duration)| (table.map_to_viseme(phoneme), *duration)),
        total_duration_ms,
        merge_repeats,
    )
}
