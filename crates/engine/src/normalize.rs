//! Text normalization for names and grouping keys.
//!
//! - Repair encoding damage found in the raw extracts
//! - Fold diacritics (NFKD, combining marks dropped)
//! - Strip punctuation except `& ( ) /`
//! - Collapse or remove whitespace

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Punctuation that carries meaning in business names.
const KEEP_PUNCTUATION: &[char] = &['&', '(', ')', '/'];

/// Mis-decoded sequences seen in the extracts, matched after lowercasing.
/// Longer patterns first.
const REPAIRS: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("+ae", "o"),
    ("+?", "e"),
    ("+e", "a"),
    ("+u", "a"),
    ("+i", "a"),
    ("-?s", "'s"),
    ("y;s", "y's"),
];

fn repair(lowered: &str) -> String {
    REPAIRS
        .iter()
        .fold(lowered.to_string(), |acc, (from, to)| acc.replace(from, to))
}

fn fold_diacritics(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

fn is_dropped(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && !KEEP_PUNCTUATION.contains(&c)
}

/// Display form: upper-case words separated by single spaces.
///
/// ```
/// use opendine_engine::normalize::normalize_text;
///
/// assert_eq!(normalize_text("  Café  Frank-?s, Inc. "), "CAFE FRANKS INC");
/// assert_eq!(normalize_text("Tom &amp; Jerry"), "TOM & JERRY");
/// ```
pub fn normalize_text(raw: &str) -> String {
    let repaired = repair(&raw.to_lowercase());
    let stripped: String = fold_diacritics(&repaired)
        .chars()
        .filter(|&c| !is_dropped(c))
        .collect();

    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Grouping form: lower-case with all whitespace and punctuation removed.
pub fn compact_key(raw: &str) -> String {
    let repaired = repair(&raw.to_lowercase());
    fold_diacritics(&repaired)
        .chars()
        .filter(|&c| !is_dropped(c) && !c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_basic() {
        assert_eq!(normalize_text("Joe's Pizza"), "JOES PIZZA");
        assert_eq!(normalize_text("  la   bodega\t"), "LA BODEGA");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn keeps_meaningful_punctuation() {
        assert_eq!(normalize_text("A&B (Downtown) / Cafe!"), "A&B (DOWNTOWN) / CAFE");
    }

    #[test]
    fn folds_diacritics() {
        assert_eq!(normalize_text("Crêperie Olé"), "CREPERIE OLE");
        assert_eq!(compact_key("Niño's Café"), "ninoscafe");
    }

    #[test]
    fn repairs_mojibake() {
        assert_eq!(normalize_text("Caf+? Rouge"), "CAFE ROUGE");
        assert_eq!(normalize_text("Hurley;s"), "HURLEYS");
        assert_eq!(normalize_text("Frank-?s"), "FRANKS");
        assert_eq!(normalize_text("v+isquez"), "VASQUEZ");
        assert_eq!(normalize_text("Jos+ae"), "JOSO");
    }

    #[test]
    fn compact_key_removes_whitespace() {
        assert_eq!(compact_key("Joe's Pizza, Inc."), "joespizzainc");
        assert_eq!(compact_key("Tom &amp; Jerry LLC"), "tom&jerryllc");
        assert_eq!(compact_key("123 W. 45th St #2"), "123w45thst2");
    }
}
