//! Text normalization ahead of phonemization.
//!
//! Turns a raw assistant reply into lowercase words and pause marks.
//! Punctuation is dropped unless it implies a pause, in which case it
//! survives as [`TextToken::Pause`] so the track can show a resting mouth.

/// A unit of normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextToken {
    /// A lowercase word made of letters, digits and inner apostrophes.
    Word(String),
    /// A phrase boundary implied by punctuation.
    Pause,
}

/// Abbreviation → spoken form. Longer prefixes first ("mrs." before "mr.").
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("mrs.", "missus"),
    ("mr.", "mister"),
    ("ms.", "miz"),
    ("dr.", "doctor"),
    ("st.", "saint"),
    ("vs.", "versus"),
    ("etc.", "etcetera"),
    ("e.g.", "for example"),
    ("i.e.", "that is"),
];

const ORDINAL_WORDS: [&str; 20] = [
    "first",
    "second",
    "third",
    "fourth",
    "fifth",
    "sixth",
    "seventh",
    "eighth",
    "ninth",
    "tenth",
    "eleventh",
    "twelfth",
    "thirteenth",
    "fourteenth",
    "fifteenth",
    "sixteenth",
    "seventeenth",
    "eighteenth",
    "nineteenth",
    "twentieth",
];

/// Whether a character marks a spoken pause.
fn is_pause_punctuation(ch: char) -> bool {
    matches!(
        ch,
        ',' | '.' | ';' | ':' | '!' | '?' | '\u{2026}' | '\u{2014}' | '\u{2013}'
    )
}

/// Normalize `text` into words and pauses.
///
/// Consecutive pauses collapse into one and leading pauses are dropped, so
/// `"...hello,, world!"` becomes `[hello, Pause, world, Pause]`.
pub fn normalize(text: &str) -> Vec<TextToken> {
    let mut tokens: Vec<TextToken> = Vec::new();

    for raw in text.split_whitespace() {
        let lowered = raw.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'");

        if let Some(&(_, spoken)) = ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == lowered) {
            for word in spoken.split(' ') {
                tokens.push(TextToken::Word(word.to_owned()));
            }
            continue;
        }

        for piece in split_piece(&lowered) {
            push_token(&mut tokens, piece);
        }
    }

    tokens
}

fn push_token(tokens: &mut Vec<TextToken>, token: TextToken) {
    if token == TextToken::Pause && matches!(tokens.last(), None | Some(TextToken::Pause)) {
        return;
    }
    tokens.push(token);
}

/// Split one whitespace-delimited chunk into word and pause tokens.
fn split_piece(chunk: &str) -> Vec<TextToken> {
    let mut out = Vec::new();
    let mut word = String::new();
    let chars: Vec<char> = chunk.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_alphanumeric() {
            word.push(ch);
        } else if ch == '\'' && !word.is_empty() {
            // Keep contractions ("don't") but not quoting apostrophes.
            if chars.get(i + 1).is_some_and(|c| c.is_alphabetic()) {
                word.push(ch);
            }
        } else if ch == '.' && is_decimal_point(&chars, i) {
            word.push_str(" point ");
        } else {
            flush_word(&mut out, &mut word);
            if is_pause_punctuation(ch) {
                out.push(TextToken::Pause);
            } else if let Some(spoken) = currency_word(ch) {
                // "$5" reads as "5 dollars": defer the unit until the amount.
                let amount: String = chars[i + 1..]
                    .iter()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                if !amount.is_empty() {
                    out.extend(currency_tokens(
                        &amount,
                        spoken,
                        &chars[i + 1 + amount.len()..],
                    ));
                    return out;
                }
            }
        }
    }
    flush_word(&mut out, &mut word);
    out
}

fn is_decimal_point(chars: &[char], i: usize) -> bool {
    i > 0
        && chars[i - 1].is_ascii_digit()
        && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
}

fn currency_word(ch: char) -> Option<&'static str> {
    match ch {
        '$' => Some("dollars"),
        '£' => Some("pounds"),
        '€' => Some("euros"),
        _ => None,
    }
}

fn currency_tokens(amount: &str, unit: &str, rest: &[char]) -> Vec<TextToken> {
    let mut out = vec![
        TextToken::Word(amount.to_owned()),
        TextToken::Word(unit.to_owned()),
    ];
    let tail: String = rest.iter().collect();
    out.extend(split_piece(&tail));
    out
}

fn flush_word(out: &mut Vec<TextToken>, word: &mut String) {
    if word.is_empty() {
        return;
    }
    let taken = std::mem::take(word);
    for part in taken.split(' ').filter(|p| !p.is_empty()) {
        let spoken = expand_ordinal(part).unwrap_or_else(|| part.to_owned());
        for w in spoken.split(' ') {
            out.push(TextToken::Word(w.to_owned()));
        }
    }
}

/// `"3rd"` → `"third"`, `"21st"` → `"twenty first"`. Up to 31 only.
fn expand_ordinal(word: &str) -> Option<String> {
    let split = word.find(|c: char| !c.is_ascii_digit())?;
    let (digits, suffix) = word.split_at(split);
    if digits.is_empty() || !matches!(suffix, "st" | "nd" | "rd" | "th") {
        return None;
    }
    let n: usize = digits.parse().ok()?;
    match n {
        1..=20 => Some(ORDINAL_WORDS[n - 1].to_owned()),
        21..=29 => Some(format!("twenty {}", ORDINAL_WORDS[n - 21])),
        30 => Some("thirtieth".to_owned()),
        31 => Some("thirty first".to_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn w(s: &str) -> TextToken {
        TextToken::Word(s.to_owned())
    }

    #[test]
    fn test_lowercases_and_keeps_pauses() {
        assert_eq!(
            normalize("Hello, World!"),
            vec![w("hello"), TextToken::Pause, w("world"), TextToken::Pause]
        );
    }

    #[test]
    fn test_collapses_and_drops_leading_pauses() {
        assert_eq!(
            normalize("... hi,, there"),
            vec![w("hi"), TextToken::Pause, w("there")]
        );
    }

    #[test]
    fn test_strips_non_pause_punctuation() {
        assert_eq!(
            normalize("**bold** (aside) \"quoted\""),
            vec![w("bold"), w("aside"), w("quoted")]
        );
    }

    #[test]
    fn test_keeps_contractions() {
        assert_eq!(normalize("I\u{2019}ve don't"), vec![w("i've"), w("don't")]);
        assert_eq!(normalize("'quoted'"), vec![w("quoted")]);
    }

    #[test]
    fn test_expands_abbreviations() {
        assert_eq!(normalize("Dr. Smith"), vec![w("doctor"), w("smith")]);
        assert_eq!(
            normalize("e.g. cats"),
            vec![w("for"), w("example"), w("cats")]
        );
    }

    #[test]
    fn test_expands_currency() {
        assert_eq!(
            normalize("costs $100 today"),
            vec![w("costs"), w("100"), w("dollars"), w("today")]
        );
        assert_eq!(
            normalize("£12."),
            vec![w("12"), w("pounds"), TextToken::Pause]
        );
    }

    #[test]
    fn test_expands_ordinals() {
        assert_eq!(normalize("3rd"), vec![w("third")]);
        assert_eq!(normalize("21st"), vec![w("twenty"), w("first")]);
        assert_eq!(normalize("100th"), vec![w("100th")]);
    }

    #[test]
    fn test_decimal_point_is_spoken() {
        assert_eq!(normalize("3.5"), vec![w("3"), w("point"), w("5")]);
    }

    #[test]
    fn test_em_dash_is_a_pause() {
        assert_eq!(
            normalize("wait\u{2014}what"),
            vec![w("wait"), TextToken::Pause, w("what")]
        );
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \n\t").is_empty());
        assert!(normalize("?!").is_empty());
    }

    #[test]
    fn test_currency_keeps_prefix() {
        assert_eq!(normalize("US$5"), vec![w("us"), w("5"), w("dollars")]);
        assert_eq!(
            normalize("about\u{20ac}20"),
            vec![w("about"), w("20"), w("euros")]
        );
    }
}
