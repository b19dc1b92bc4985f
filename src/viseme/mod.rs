//! Viseme mapping for lip-sync animation.
//!
//! A viseme is a visual mouth shape that corresponds to one or more
//! phonemes. This module maps ARPABET phoneme symbols onto a small closed
//! set of mouth-shape categories that the animation front-end draws.

use crate::phonemize::{PAUSE_SYMBOL, Phoneme};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Mouth-shape categories understood by the animation layer.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VisemeCategory {
    /// Silence or a pause between phrases.
    Rest,
    /// /p/, /b/, /m/ (lips pressed together)
    Closed,
    /// /f/, /v/ (teeth on lip)
    LipTeeth,
    /// /θ/, /ð/ (tongue between teeth)
    TongueTeeth,
    /// /s/, /z/, /ʃ/, /tʃ/ (teeth together, lips slightly spread)
    Teeth,
    /// /t/, /d/, /k/, /n/, /l/ (slight opening)
    Open,
    /// /ɑ/, /ɔ/, /aʊ/ (mouth open wide)
    OpenWide,
    /// /æ/, /ʌ/, /ɛ/ (mouth medium)
    Mid,
    /// /i/, /ɪ/, /eɪ/ (lips spread)
    Smile,
    /// /o/, /u/, /w/, /ɹ/ (lips rounded)
    Rounded,
    /// Anything the table does not know.
    #[default]
    Neutral,
}

impl VisemeCategory {
    /// Every category, in a stable order.
    pub const ALL: [VisemeCategory; 11] = [
        Self::Rest,
        Self::Closed,
        Self::LipTeeth,
        Self::TongueTeeth,
        Self::Teeth,
        Self::Open,
        Self::OpenWide,
        Self::Mid,
        Self::Smile,
        Self::Rounded,
        Self::Neutral,
    ];

    /// Wire name used in serialized tracks.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Closed => "closed",
            Self::LipTeeth => "lip_teeth",
            Self::TongueTeeth => "tongue_teeth",
            Self::Teeth => "teeth",
            Self::Open => "open",
            Self::OpenWide => "open_wide",
            Self::Mid => "mid",
            Self::Smile => "smile",
            Self::Rounded => "rounded",
            Self::Neutral => "neutral",
        }
    }

    /// Mouth frame asset the avatar renderer shows for this category.
    pub fn mouth_frame(&self) -> &'static str {
        match self {
            Self::Rest | Self::Neutral => "mouth_closed.png",
            Self::Closed => "mouth_mbp.png",
            Self::LipTeeth => "mouth_fv.png",
            Self::TongueTeeth => "mouth_th.png",
            Self::Teeth | Self::Open => "mouth_open_small.png",
            Self::OpenWide => "mouth_open_wide.png",
            Self::Mid => "mouth_open_medium.png",
            Self::Smile => "mouth_smile_talk.png",
            Self::Rounded => "mouth_rounded.png",
        }
    }
}

impl fmt::Display for VisemeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in ARPABET to viseme table.
///
/// Based on the Carnegie Mellon University Pronouncing Dictionary phone set.
const DEFAULT_TABLE: &[(&str, VisemeCategory)] = &[
    (PAUSE_SYMBOL, VisemeCategory::Rest),
    // Bilabial
    ("B", VisemeCategory::Closed),
    ("P", VisemeCategory::Closed),
    ("M", VisemeCategory::Closed),
    ("EM", VisemeCategory::Closed),
    // Labiodental
    ("F", VisemeCategory::LipTeeth),
    ("V", VisemeCategory::LipTeeth),
    // Dental
    ("TH", VisemeCategory::TongueTeeth),
    ("DH", VisemeCategory::TongueTeeth),
    // Sibilants and postalveolars
    ("S", VisemeCategory::Teeth),
    ("Z", VisemeCategory::Teeth),
    ("SH", VisemeCategory::Teeth),
    ("ZH", VisemeCategory::Teeth),
    ("CH", VisemeCategory::Teeth),
    ("JH", VisemeCategory::Teeth),
    // Alveolar, velar, glottal
    ("T", VisemeCategory::Open),
    ("D", VisemeCategory::Open),
    ("N", VisemeCategory::Open),
    ("L", VisemeCategory::Open),
    ("DX", VisemeCategory::Open),
    ("NX", VisemeCategory::Open),
    ("EL", VisemeCategory::Open),
    ("EN", VisemeCategory::Open),
    ("K", VisemeCategory::Open),
    ("G", VisemeCategory::Open),
    ("NG", VisemeCategory::Open),
    ("HH", VisemeCategory::Open),
    ("Q", VisemeCategory::Open),
    // Vowels
    ("AA", VisemeCategory::OpenWide),
    ("AO", VisemeCategory::OpenWide),
    ("AW", VisemeCategory::OpenWide),
    ("AE", VisemeCategory::Mid),
    ("AH", VisemeCategory::Mid),
    ("AX", VisemeCategory::Mid),
    ("EH", VisemeCategory::Mid),
    ("ER", VisemeCategory::Mid),
    ("AXR", VisemeCategory::Mid),
    ("AY", VisemeCategory::Smile),
    ("EY", VisemeCategory::Smile),
    ("IH", VisemeCategory::Smile),
    ("IY", VisemeCategory::Smile),
    ("IX", VisemeCategory::Smile),
    ("Y", VisemeCategory::Smile),
    ("OW", VisemeCategory::Rounded),
    ("OY", VisemeCategory::Rounded),
    ("UH", VisemeCategory::Rounded),
    ("UW", VisemeCategory::Rounded),
    ("UX", VisemeCategory::Rounded),
    ("W", VisemeCategory::Rounded),
    ("R", VisemeCategory::Rounded),
];

/// Remove ARPABET stress markers (0, 1, 2).
pub fn strip_stress(symbol: &str) -> &str {
    symbol.trim_end_matches(['0', '1', '2'])
}

/// Read-only phoneme to viseme lookup table.
///
/// Built once at startup and shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct VisemeTable {
    map: HashMap<String, VisemeCategory>,
}

impl Default for VisemeTable {
    fn default() -> Self {
        Self {
            map: DEFAULT_TABLE
                .iter()
                .map(|(symbol, category)| ((*symbol).to_owned(), *category))
                .collect(),
        }
    }
}

impl VisemeTable {
    /// Build the default table with per-symbol overrides applied.
    ///
    /// Override keys are matched case-insensitively with stress removed,
    /// so `"aa1"` overrides `AA`.
    pub fn with_overrides(overrides: &BTreeMap<String, VisemeCategory>) -> Self {
        let mut table = Self::default();
        for (symbol, category) in overrides {
            let key = strip_stress(symbol.trim()).to_ascii_uppercase();
            table.map.insert(key, *category);
        }
        table
    }

    /// Look up the category for a raw symbol. Unknown symbols are neutral.
    pub fn lookup(&self, symbol: &str) -> VisemeCategory {
        let base = strip_stress(symbol);
        if let Some(category) = self.map.get(base) {
            return *category;
        }
        self.map
            .get(&base.to_ascii_uppercase())
            .copied()
            .unwrap_or_default()
    }

    /// Map a phoneme to its viseme category.
    pub fn map_to_viseme(&self, phoneme: &Phoneme) -> VisemeCategory {
        self.lookup(&phoneme.symbol)
    }

    /// All entries, sorted by symbol.
    pub fn entries(&self) -> Vec<(&str, VisemeCategory)> {
        let mut entries: Vec<_> = self
            .map
            .iter()
            .map(|(symbol, category)| (symbol.as_str(), *category))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Number of symbols in the table.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
