//! Coverage markers inside sidecar plot text.
//!
//! A condensed episode states which source chapters and unabridged episodes
//! it replaces, e.g. `Manga Chapter(s): 1-3` / `Anime Episode(s): 1-2`.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::ranges;

// "Episodes:", "Episode(s):", "Anime Episode(s):", "Anime Episodes:"
static RE_EPISODE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Anime\s+)?Episodes?\s*\(?s?\)?:").unwrap());

static RE_CHAPTER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Manga\s+)?Chapters?\s*\(?s?\)?:").unwrap());

static RE_EPISODE_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Anime\s+)?Episodes?\s*\(?s?\)?:[ \t]*([\d\-,\s]+)").unwrap()
});

static RE_CHAPTER_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Manga\s+)?Chapters?\s*\(?s?\)?:[ \t]*([\d\-,\s]+)").unwrap()
});

/// Whether the text names the unabridged episodes it covers.
pub fn has_coverage_marker(text: &str) -> bool {
    RE_EPISODE_MARKER.is_match(text)
}

/// Whether the text carries either coverage label.
pub fn has_canonical_marker(text: &str) -> bool {
    RE_EPISODE_MARKER.is_match(text) || RE_CHAPTER_MARKER.is_match(text)
}

/// Unabridged episode numbers listed after the episode marker.
pub fn covered_episodes(text: &str) -> BTreeSet<u32> {
    list_after(&RE_EPISODE_LIST, text)
}

/// Manga chapter numbers listed after the chapter marker.
pub fn covered_chapters(text: &str) -> BTreeSet<u32> {
    list_after(&RE_CHAPTER_LIST, text)
}

fn list_after(re: &Regex, text: &str) -> BTreeSet<u32> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .flat_map(|m| ranges::parse_ranges(m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLOT: &str = "Zoro fights.\n\nManga Chapter(s): 4-7, 9\n\nAnime Episode(s): 179-181, 1000-1001";

    #[test]
    fn detects_markers() {
        assert!(has_coverage_marker(PLOT));
        assert!(has_coverage_marker("anime episodes: Unavailable"));
        assert!(has_canonical_marker("Manga Chapters: 3"));
        assert!(!has_coverage_marker("Manga Chapters: 3"));
        assert!(!has_canonical_marker("An episode of the anime."));
    }

    #[test]
    fn extracts_episode_numbers() {
        assert_eq!(
            covered_episodes(PLOT),
            BTreeSet::from([179, 180, 181, 1000, 1001])
        );
    }

    #[test]
    fn chapter_numbers_do_not_leak_into_episodes() {
        assert_eq!(covered_chapters(PLOT), BTreeSet::from([4, 5, 6, 7, 9]));
        assert!(covered_episodes("Manga Chapter(s): 1-3").is_empty());
    }

    #[test]
    fn legacy_inline_format() {
        assert_eq!(
            covered_episodes("Episodes: 45, 46\nSomething else"),
            BTreeSet::from([45, 46])
        );
    }
}
