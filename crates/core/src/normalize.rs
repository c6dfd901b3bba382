//! Title normalisation and fuzzy matching.
//!
//! Three levels, from strictest to loosest:
//! - [`sanitize`]: the filesystem-safe display form used in filenames.
//! - [`comparison_key`]: `sanitize` plus apostrophe removal and lowercasing,
//!   used to decide whether two titles are the same title.
//! - [`similar`]: token-set similarity for matching names across sources.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Default threshold for episode-row and arc-table matching.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

static RE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-_.,;:]").unwrap());

static RE_POSSESSIVE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'s\b").unwrap());

/// Fold diacritics, replace filesystem-unsafe punctuation, collapse
/// whitespace and trim surrounding whitespace and dots.
pub fn sanitize(title: &str) -> String {
    let folded: String = title.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let mut out = String::with_capacity(folded.len());
    for ch in folded.chars() {
        match ch {
            ':' => out.push_str(" -"),
            '"' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}' => out.push('\''),
            '<' => out.push('('),
            '>' => out.push(')'),
            '|' | '/' | '\\' => out.push('-'),
            '?' | '*' => {}
            other => out.push(other),
        }
    }

    let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c == '.' || c == ' ')
        .to_string()
}

/// Comparison-only form: possessive drift (`Red Hair's` / `Red Hairs`)
/// and case do not count as differences.
pub fn comparison_key(title: &str) -> String {
    sanitize(title).replace('\'', "").to_lowercase()
}

fn loose_form(s: &str) -> String {
    let lower = s.to_lowercase();
    let spaced = RE_SEPARATORS.replace_all(&lower, " ");
    let unpossessed = RE_POSSESSIVE.replace_all(&spaced, "s");
    unpossessed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Jaccard similarity of the whitespace token sets of the loose forms.
pub fn token_similarity(a: &str, b: &str) -> f64 {
    let a = loose_form(a);
    let b = loose_form(b);
    let ta: HashSet<&str> = a.split(' ').filter(|t| !t.is_empty()).collect();
    let tb: HashSet<&str> = b.split(' ').filter(|t| !t.is_empty()).collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let inter = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    inter / union
}

/// Loose title equality: exact after normalisation, containment either
/// way, or token-set Jaccard similarity of at least `threshold`.
pub fn similar(a: &str, b: &str, threshold: f64) -> bool {
    let na = loose_form(a);
    let nb = loose_form(b);

    if na == nb {
        return true;
    }
    if !na.is_empty() && !nb.is_empty() && (na.contains(&nb) || nb.contains(&na)) {
        return true;
    }
    token_similarity(a, b) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_folds_diacritics() {
        assert_eq!(sanitize("Enies Lobby: Robin's Past"), "Enies Lobby - Robin's Past");
        assert_eq!(sanitize("Kōzuki Oden"), "Kozuki Oden");
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize("Who? <Me> | \"You\" / \\ *"), "Who (Me) - 'You' - -");
        assert_eq!(sanitize("  ...Trailing dots...  "), "Trailing dots");
        assert_eq!(sanitize("\u{201C}Quoted\u{201D}"), "'Quoted'");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in [
            "Enies Lobby: Robin's Past",
            " . a: b . ",
            "Kōzuki Oden?!",
            "x::y",
            "",
            "...",
            "Ünïcödé / <tags>",
        ] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn comparison_key_ignores_possessives() {
        assert_eq!(comparison_key("Red Hair's Arrival"), comparison_key("Red Hairs arrival"));
    }

    #[test]
    fn similar_is_reflexive_and_symmetric() {
        let pairs = [
            ("Whisky Peak", "Whiskey Peak"),
            ("Post-Enies Lobby", "Enies Lobby"),
            ("The Trials of Koby-Meppo", "Koby Meppo"),
            ("Arlong Park", "Loguetown"),
        ];
        for (a, b) in pairs {
            assert!(similar(a, a, DEFAULT_THRESHOLD));
            assert_eq!(similar(a, b, 0.6), similar(b, a, 0.6));
            assert_eq!(similar(a, b, DEFAULT_THRESHOLD), similar(b, a, DEFAULT_THRESHOLD));
        }
    }

    #[test]
    fn similar_matches_naming_drift() {
        assert!(similar("Adventures of Buggy's Crew", "The Adventures of Buggys Crew", 0.8));
        assert!(similar("Sabaody_Archipelago", "sabaody archipelago", 0.8));
        assert!(!similar("Arlong Park", "Loguetown", 0.6));
    }

    #[test]
    fn token_similarity_is_jaccard() {
        let s = token_similarity("red hair pirates", "red hair crew");
        assert!((s - 0.5).abs() < 1e-9);
    }
}
