//! Misaki G2P backend.
//!
//! misaki-rs emits Kokoro-style IPA (with single-letter diphthong codes such
//! as `A` for /eɪ/). The viseme and weight tables are keyed by ARPABET, so
//! the output is converted by longest-match over [`IPA_TO_ARPABET`].

use super::G2pBackend;
use crate::error::{LipSyncError, Result};

/// IPA (misaki flavour) → ARPABET base symbol. Multi-character entries
/// must precede their prefixes.
const IPA_TO_ARPABET: &[(&str, &str, bool)] = &[
    // (ipa, arpabet, is_vowel)
    ("aɪ", "AY", true),
    ("aʊ", "AW", true),
    ("eɪ", "EY", true),
    ("oʊ", "OW", true),
    ("əʊ", "OW", true),
    ("ɔɪ", "OY", true),
    ("tʃ", "CH", false),
    ("dʒ", "JH", false),
    ("A", "EY", true),
    ("I", "AY", true),
    ("W", "AW", true),
    ("Y", "OY", true),
    ("O", "OW", true),
    ("Q", "OW", true),
    ("ɑ", "AA", true),
    ("ɒ", "AA", true),
    ("a", "AA", true),
    ("æ", "AE", true),
    ("ʌ", "AH", true),
    ("ɐ", "AH", true),
    ("ə", "AH", true),
    ("ᵊ", "AH", true),
    ("ɔ", "AO", true),
    ("o", "AO", true),
    ("ɛ", "EH", true),
    ("e", "EH", true),
    ("ɚ", "ER", true),
    ("ɝ", "ER", true),
    ("ɜ", "ER", true),
    ("ɪ", "IH", true),
    ("i", "IY", true),
    ("ʊ", "UH", true),
    ("u", "UW", true),
    ("ʧ", "CH", false),
    ("ʤ", "JH", false),
    ("ʃ", "SH", false),
    ("ʒ", "ZH", false),
    ("θ", "TH", false),
    ("ð", "DH", false),
    ("ŋ", "NG", false),
    ("ɹ", "R", false),
    ("ɾ", "DX", false),
    ("T", "DX", false),
    ("ʔ", "Q", false),
    ("ɡ", "G", false),
    ("g", "G", false),
    ("ɫ", "L", false),
    ("b", "B", false),
    ("d", "D", false),
    ("f", "F", false),
    ("h", "HH", false),
    ("j", "Y", false),
    ("k", "K", false),
    ("l", "L", false),
    ("m", "M", false),
    ("n", "N", false),
    ("p", "P", false),
    ("s", "S", false),
    ("t", "T", false),
    ("v", "V", false),
    ("w", "W", false),
    ("z", "Z", false),
    ("x", "HH", false),
    ("ç", "HH", false),
];

/// Convert a misaki IPA string to ARPABET symbols with stress digits.
///
/// `ˈ`/`ˌ` set the stress of the next vowel; unstressed vowels get `0`.
/// Length marks and unrecognized characters are skipped.
pub(crate) fn ipa_to_arpabet(ipa: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending_stress = '0';
    let mut rest = ipa;

    while let Some(ch) = rest.chars().next() {
        match ch {
            'ˈ' => {
                pending_stress = '1';
                rest = &rest[ch.len_utf8()..];
                continue;
            }
            'ˌ' => {
                pending_stress = '2';
                rest = &rest[ch.len_utf8()..];
                continue;
            }
            _ => {}
        }

        if let Some((ipa_sym, arpa, is_vowel)) = IPA_TO_ARPABET
            .iter()
            .find(|(ipa_sym, _, _)| rest.starts_with(ipa_sym))
        {
            if *is_vowel {
                out.push(format!("{arpa}{pending_stress}"));
                pending_stress = '0';
            } else {
                out.push((*arpa).to_owned());
            }
            rest = &rest[ipa_sym.len()..];
        } else {
            rest = &rest[ch.len_utf8()..];
        }
    }

    out
}

/// Thin wrapper around `misaki-rs` G2P.
pub struct MisakiBackend {
    g2p: misaki_rs::G2P,
}

impl MisakiBackend {
    /// Create a new backend.
    ///
    /// `british` selects British English pronunciation when `true`,
    /// American English when `false`.
    pub fn new(british: bool) -> Self {
        let lang = if british {
            misaki_rs::Language::EnglishGB
        } else {
            misaki_rs::Language::EnglishUS
        };
        Self {
            g2p: misaki_rs::G2P::new(lang),
        }
    }
}

impl G2pBackend for MisakiBackend {
    fn word_to_phonemes(&self, word: &str) -> Result<Vec<String>> {
        let (ipa, _tokens) = self
            .g2p
            .g2p(word)
            .map_err(|e| LipSyncError::Phonemizer(format!("phonemization failed: {e}")))?;
        Ok(ipa_to_arpabet(&ipa))
    }

    fn name(&self) -> &'static str {
        "misaki"
    }
}
