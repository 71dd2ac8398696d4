//! Name normalization for approximate identity matching.
//!
//! Display names arrive with niqqud, stray bidi control characters pasted
//! from mixed-direction documents, and inconsistent spacing. The match key
//! strips all of that, lowercases, and keeps the last whitespace token —
//! the family name, which is how the schedule sheets refer to people.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Bidirectional control characters that word processors embed in
/// mixed Hebrew/Latin text.
fn is_bidi_control(c: char) -> bool {
    matches!(
        c,
        '\u{061C}' | '\u{200E}' | '\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
    )
}

/// Derive the match key for a display name.
///
/// Decompose (NFKD), drop combining marks and bidi controls, lowercase,
/// collapse whitespace, then take the last token. When tokenization yields
/// nothing, the full normalized (empty-ish) string is the key. Idempotent.
pub fn match_key(name: &str) -> String {
    let stripped: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c) && !is_bidi_control(*c))
        .flat_map(char::to_lowercase)
        .collect();

    match stripped.split_whitespace().last() {
        Some(token) => token.to_string(),
        None => stripped.trim().to_string(),
    }
}
