//! # Persian Text Normalization
//!
//! Canonicalizes raw user input into two comparable forms:
//!
//! - `normalized`: character-folded, whitespace-collapsed text with filler
//!   words removed. This is what the intent classifier sees.
//! - `canonical`: the paraphrase-invariant retrieval key. On top of the
//!   normalized form it drops punctuation and stop-words, folds a few
//!   colloquial variants, and sorts the remaining tokens so that
//!   word-order paraphrases converge to the same string.

use crate::errors::AgentError;
use crate::types::NormalizedQuery;
use tracing::warn;

/// Politeness and filler tokens that carry no meaning for matching.
const FILLER_WORDS: &[&str] = &[
    "لطفا",
    "میشه",
    "میشد",
    "ممنون",
    "ممنونم",
    "مرسی",
    "سپاس",
    "خواهشمندم",
    "بی‌زحمت",
];

/// Stop-words removed from the canonical form only.
const STOP_WORDS: &[&str] = &[
    "است",
    "هست",
    "هستم",
    "هستند",
    "بود",
    "شد",
    "دارد",
    "داره",
    "دارند",
    "می‌شود",
    "میشود",
    "را",
    "به",
    "از",
    "در",
    "که",
    "و",
    "با",
    "برای",
    "تا",
    "هم",
    "یا",
    "آیا",
    "این",
    "آن",
    "اون",
    "یک",
    "من",
    "تو",
    "شما",
    "ما",
];

/// Colloquial contractions folded to their formal stem in the canonical
/// form, so "چقدره؟" and "چقدر است؟" land on the same token.
const COLLOQUIAL_FOLDS: &[(&str, &str)] = &[
    ("چقدره", "چقدر"),
    ("چنده", "چند"),
    ("چیه", "چی"),
    ("کیه", "کی"),
    ("کجاست", "کجا"),
    ("چجوریه", "چجوری"),
];

/// Folds Arabic presentation variants to the canonical Persian code points
/// and drops combining marks that do not affect meaning.
fn fold_chars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            // Arabic yeh variants to Persian yeh.
            '\u{064A}' | '\u{0649}' => out.push('ی'),
            // Arabic kaf to Persian kaf.
            '\u{0643}' => out.push('ک'),
            // Teh marbuta to heh.
            '\u{0629}' => out.push('ه'),
            // Hamza-carrying alef forms to bare alef.
            '\u{0623}' | '\u{0625}' | '\u{0671}' => out.push('ا'),
            // Arabic-Indic digits to Extended (Persian) digits.
            '\u{0660}'..='\u{0669}' => {
                let offset = c as u32 - 0x0660;
                // The Persian digit block is contiguous, so this cannot fail.
                out.push(char::from_u32(0x06F0 + offset).unwrap_or(c));
            }
            // Harakat, tatweel and directional marks are dropped entirely.
            '\u{064B}'..='\u{0652}' | '\u{0640}' | '\u{200E}' | '\u{200F}' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Punctuation stripped during normalization. Question marks survive in the
/// normalized form (they are a strong intent cue) and are removed only from
/// the canonical form.
fn is_strippable_punct(c: char) -> bool {
    if c == '؟' || c == '?' {
        return false;
    }
    c.is_ascii_punctuation() || matches!(c, '،' | '؛' | '«' | '»' | '…' | '٪')
}

fn is_any_punct(c: char) -> bool {
    is_strippable_punct(c) || c == '؟' || c == '?'
}

/// True for tokens that are pure filler once surrounding punctuation is
/// ignored.
fn is_filler(token: &str) -> bool {
    let bare: String = token.chars().filter(|c| !is_any_punct(*c)).collect();
    FILLER_WORDS.contains(&bare.as_str())
}

/// Tokenizes text into canonical content tokens: folded, punctuation-free,
/// colloquialisms mapped, stop-words and fillers removed. Token order is
/// preserved; the caller decides whether to sort.
///
/// This is also used by the retriever to canonicalize stored questions so
/// that query and record are scored in the same token space.
pub fn canonical_tokens(text: &str) -> Vec<String> {
    let folded = fold_chars(text);
    folded
        .split(|c: char| c.is_whitespace() || is_any_punct(c))
        .filter(|t| !t.is_empty())
        .map(|t| {
            COLLOQUIAL_FOLDS
                .iter()
                .find(|(from, _)| *from == t)
                .map(|(_, to)| to.to_string())
                .unwrap_or_else(|| t.to_string())
        })
        .filter(|t| !STOP_WORDS.contains(&t.as_str()) && !FILLER_WORDS.contains(&t.as_str()))
        .collect()
}

/// Normalizes a raw user message.
///
/// Fails with [`AgentError::Validation`] when the input is empty or
/// whitespace-only. Overlong inputs are truncated to `max_chars` characters
/// and flagged, never rejected.
pub fn normalize(raw: &str, max_chars: usize) -> Result<NormalizedQuery, AgentError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AgentError::Validation(
            "message is empty or whitespace-only".to_string(),
        ));
    }

    let (input, truncated) = if trimmed.chars().count() > max_chars {
        warn!(
            max_chars,
            "Input exceeds the configured character cap; truncating."
        );
        (trimmed.chars().take(max_chars).collect::<String>(), true)
    } else {
        (trimmed.to_string(), false)
    };

    let folded = fold_chars(&input);

    // Strippable punctuation becomes whitespace; runs of the surviving
    // question marks collapse to one.
    let mut cleaned = String::with_capacity(folded.len());
    let mut last_was_question = false;
    for c in folded.chars() {
        if is_strippable_punct(c) {
            cleaned.push(' ');
            last_was_question = false;
        } else if c == '؟' || c == '?' {
            if !last_was_question {
                cleaned.push('؟');
            }
            last_was_question = true;
        } else {
            cleaned.push(c);
            last_was_question = false;
        }
    }

    let normalized = cleaned
        .split_whitespace()
        .filter(|t| !is_filler(t))
        .collect::<Vec<_>>()
        .join(" ");

    let mut tokens = canonical_tokens(&normalized);
    tokens.sort();
    let canonical = tokens.join(" ");

    Ok(NormalizedQuery {
        raw: raw.to_string(),
        normalized,
        canonical,
        truncated,
    })
}
