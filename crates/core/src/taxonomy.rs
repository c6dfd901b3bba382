//! Arc name ⇄ season number mapping.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::normalize;

/// Threshold for fuzzy arc-name lookups.
pub const ARC_MATCH_THRESHOLD: f64 = 0.6;

const BUILTIN_SEASONS: &str = include_str!("../data/seasons.json");

// Spellings seen in release names that differ from the taxonomy.
const ARC_ALIASES: &[(&str, &str)] = &[("Whiskey", "Whisky"), ("Arabasta", "Alabasta")];

/// Immutable, ordered arc → season table. Season 0 is Specials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonTaxonomy {
    arcs: Vec<(String, u32)>,
}

impl SeasonTaxonomy {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut arcs: Vec<(String, u32)> = Vec::new();
        for (name, season) in pairs {
            let name = name.into();
            if !arcs.iter().any(|(n, _)| *n == name) {
                arcs.push((name, season));
            }
        }
        Self { arcs }
    }

    /// The taxonomy shipped with the crate.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_SEASONS).expect("built-in seasons.json is valid")
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let map: Map<String, Value> = serde_json::from_str(text)?;
        let mut pairs = Vec::with_capacity(map.len());
        for (arc, value) in map {
            let season = value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| ConfigError::InvalidSeason {
                    arc: arc.clone(),
                    value: value.to_string(),
                })?;
            pairs.push((arc, season));
        }
        Ok(Self::from_pairs(pairs))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.arcs.iter().map(|(n, s)| (n.as_str(), *s))
    }

    /// Case-insensitive exact lookup, after alias canonicalisation.
    pub fn season_exact(&self, name: &str) -> Option<u32> {
        let wanted = canonical_arc_name(name).to_lowercase();
        self.arcs
            .iter()
            .find(|(n, _)| n.to_lowercase() == wanted)
            .map(|(_, s)| *s)
    }

    /// Exact lookup, falling back to fuzzy matching.
    ///
    /// Returns the taxonomy's own spelling of the arc with its season.
    pub fn lookup(&self, name: &str) -> Option<(&str, u32)> {
        let canonical = canonical_arc_name(name);
        let wanted = canonical.to_lowercase();
        if let Some((n, s)) = self.arcs.iter().find(|(n, _)| n.to_lowercase() == wanted) {
            return Some((n.as_str(), *s));
        }
        self.arcs
            .iter()
            .find(|(n, _)| normalize::similar(&canonical, n, ARC_MATCH_THRESHOLD))
            .map(|(n, s)| (n.as_str(), *s))
    }

    /// First arc mapped to `season`.
    pub fn arc_for_season(&self, season: u32) -> Option<&str> {
        self.arcs
            .iter()
            .find(|(_, s)| *s == season)
            .map(|(n, _)| n.as_str())
    }

    /// Longest arc name contained (case-insensitively) in free text.
    pub fn find_in_text(&self, text: &str) -> Option<(&str, u32)> {
        let haystack = canonical_arc_name(text).to_lowercase();
        self.arcs
            .iter()
            .filter(|(n, _)| haystack.contains(&n.to_lowercase()))
            .max_by_key(|(n, _)| n.len())
            .map(|(n, s)| (n.as_str(), *s))
    }
}

/// Apply the hardcoded spelling aliases to an arc name.
pub fn canonical_arc_name(name: &str) -> String {
    let mut out = name.trim().to_string();
    for (from, to) in ARC_ALIASES {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SeasonTaxonomy {
        SeasonTaxonomy::from_pairs([
            ("Specials", 0),
            ("Whisky Peak", 10),
            ("Alabasta", 14),
            ("Enies Lobby", 19),
            ("Post-Enies Lobby", 20),
        ])
    }

    #[test]
    fn builtin_taxonomy_loads() {
        let t = SeasonTaxonomy::builtin();
        assert_eq!(t.season_exact("Romance Dawn"), Some(1));
        assert_eq!(t.season_exact("wano"), Some(35));
        assert_eq!(t.arc_for_season(0), Some("Specials"));
    }

    #[test]
    fn exact_lookup_is_case_insensitive() {
        assert_eq!(sample().season_exact("ALABASTA"), Some(14));
        assert_eq!(sample().lookup("enies lobby"), Some(("Enies Lobby", 19)));
    }

    #[test]
    fn aliases_are_applied() {
        assert_eq!(sample().season_exact("Whiskey Peak"), Some(10));
        assert_eq!(sample().lookup("Arabasta"), Some(("Alabasta", 14)));
    }

    #[test]
    fn fuzzy_fallback() {
        assert_eq!(sample().lookup("Whisky-Peak Arc"), Some(("Whisky Peak", 10)));
        assert_eq!(sample().lookup("Thriller Bark"), None);
    }

    #[test]
    fn reverse_lookup() {
        assert_eq!(sample().arc_for_season(19), Some("Enies Lobby"));
        assert_eq!(sample().arc_for_season(99), None);
    }

    #[test]
    fn find_in_text_prefers_longest() {
        assert_eq!(
            sample().find_in_text("Post-Enies Lobby 02 - Aftermath"),
            Some(("Post-Enies Lobby", 20))
        );
        assert_eq!(sample().find_in_text("Nothing here"), None);
    }

    #[test]
    fn from_json_preserves_order_and_validates() {
        let t = SeasonTaxonomy::from_json(r#"{"B": 2, "A": 1}"#).unwrap();
        let names: Vec<_> = t.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["B", "A"]);
        assert!(matches!(
            SeasonTaxonomy::from_json(r#"{"A": -1}"#),
            Err(ConfigError::InvalidSeason { .. })
        ));
    }
}
