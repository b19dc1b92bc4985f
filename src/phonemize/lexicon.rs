//! Pronunciation-lexicon G2P backend.
//!
//! Reads a dictionary in CMU Pronouncing Dictionary format:
//!
//! ```text
//! ;;; comment
//! hello  HH AH0 L OW1
//! hello(2)  HH EH0 L OW1
//! ```
//!
//! Alternate pronunciations (`word(2)`) are ignored; the first entry wins.
//! Words missing from the lexicon are spelled with letter rules so a
//! loaded lexicon always yields phonemes.

use super::G2pBackend;
use crate::error::{LipSyncError, Result};
use std::collections::HashMap;
use std::path::Path;

/// Grapheme clusters checked before single letters.
const DIGRAPHS: &[(&str, &[&str])] = &[
    ("tch", &["CH"]),
    ("th", &["TH"]),
    ("sh", &["SH"]),
    ("ch", &["CH"]),
    ("ph", &["F"]),
    ("wh", &["W"]),
    ("ck", &["K"]),
    ("ng", &["NG"]),
    ("qu", &["K", "W"]),
    ("ee", &["IY1"]),
    ("ea", &["IY1"]),
    ("oo", &["UW1"]),
    ("ou", &["AW1"]),
    ("ow", &["OW1"]),
    ("ai", &["EY1"]),
    ("ay", &["EY1"]),
    ("oi", &["OY1"]),
    ("oy", &["OY1"]),
];

fn letter_phonemes(letter: char) -> &'static [&'static str] {
    match letter {
        'a' => &["AE1"],
        'b' => &["B"],
        'c' => &["K"],
        'd' => &["D"],
        'e' => &["EH1"],
        'f' => &["F"],
        'g' => &["G"],
        'h' => &["HH"],
        'i' => &["IH1"],
        'j' => &["JH"],
        'k' => &["K"],
        'l' => &["L"],
        'm' => &["M"],
        'n' => &["N"],
        'o' => &["AA1"],
        'p' => &["P"],
        'q' => &["K"],
        'r' => &["R"],
        's' => &["S"],
        't' => &["T"],
        'u' => &["AH1"],
        'v' => &["V"],
        'w' => &["W"],
        'x' => &["K", "S"],
        'y' => &["Y"],
        'z' => &["Z"],
        _ => &[],
    }
}

const DIGIT_WORDS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

/// Dictionary-backed phonemizer.
#[derive(Debug, Clone, Default)]
pub struct LexiconBackend {
    entries: HashMap<String, Vec<String>>,
}

impl LexiconBackend {
    /// Load a lexicon file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains no entries.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let lexicon = Self::parse(&content);
        if lexicon.entries.is_empty() {
            return Err(LipSyncError::Phonemizer(format!(
                "lexicon {} has no entries",
                path.display()
            )));
        }
        Ok(lexicon)
    }

    /// Parse lexicon text. Malformed lines are skipped.
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();
        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else { continue };
            if word.ends_with(')') {
                continue;
            }
            let phones: Vec<String> = parts.map(str::to_owned).collect();
            if phones.is_empty() {
                continue;
            }
            entries.entry(word.to_lowercase()).or_insert(phones);
        }
        Self { entries }
    }

    /// Build a lexicon from `(word, "PH ON EMES")` pairs.
    pub fn from_entries<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(word, phones)| {
                (
                    word.to_lowercase(),
                    phones.split_whitespace().map(str::to_owned).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    /// Number of words in the lexicon.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the lexicon is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, word: &str) -> Option<&[String]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    fn spell(&self, word: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut rest = word;
        while let Some(ch) = rest.chars().next() {
            if ch.is_ascii_digit() {
                let digit_word = DIGIT_WORDS[(ch as u8 - b'0') as usize];
                match self.lookup(digit_word) {
                    Some(phones) => out.extend(phones.iter().cloned()),
                    None => out.extend(self.spell(digit_word)),
                }
                rest = &rest[1..];
                continue;
            }
            if let Some((cluster, phones)) = DIGRAPHS.iter().find(|(g, _)| rest.starts_with(g)) {
                out.extend(phones.iter().map(|p| (*p).to_owned()));
                rest = &rest[cluster.len()..];
                continue;
            }
            out.extend(letter_phonemes(ch).iter().map(|p| (*p).to_owned()));
            rest = &rest[ch.len_utf8()..];
        }
        out
    }
}

impl G2pBackend for LexiconBackend {
    fn word_to_phonemes(&self, word: &str) -> Result<Vec<String>> {
        let key = word.to_lowercase();
        if let Some(phones) = self.lookup(&key) {
            return Ok(phones.to_vec());
        }
        // Contractions may be listed without the apostrophe.
        if let Some(phones) = self.lookup(&key.replace('\'', "")) {
            return Ok(phones.to_vec());
        }
        Ok(self.spell(&key))
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}
