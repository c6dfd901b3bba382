//! Special-case filenames that no pattern family recognises.
//!
//! The mapping is keyed by season folder label (`Season 3`, `Specials`) and
//! maps a filename substring to the episode number it stands for.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::types::season_dir_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionMatch {
    None,
    One { season: u32, episode: u32 },
    /// More than one substring matched; the file is left alone.
    Ambiguous,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionMapping {
    by_season: BTreeMap<u32, Vec<(String, u32)>>,
}

impl ExceptionMapping {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let root: Map<String, Value> = serde_json::from_str(text)?;
        let mut by_season: BTreeMap<u32, Vec<(String, u32)>> = BTreeMap::new();

        for (label, entries) in root {
            let Some(season) = parse_season_label(&label) else {
                return Err(ConfigError::InvalidSeason {
                    arc: label,
                    value: entries.to_string(),
                });
            };
            let Value::Object(entries) = entries else {
                return Err(ConfigError::InvalidSeason {
                    value: entries.to_string(),
                    arc: label,
                });
            };
            let slot = by_season.entry(season).or_default();
            for (pattern, value) in entries {
                let episode = value
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| ConfigError::InvalidEpisode {
                        label: label.clone(),
                        pattern: pattern.clone(),
                        value: value.to_string(),
                    })?;
                slot.push((pattern, episode));
            }
        }
        Ok(Self { by_season })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn is_empty(&self) -> bool {
        self.by_season.values().all(Vec::is_empty)
    }

    /// Seasons that carry at least one exception.
    pub fn seasons(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_season.keys().copied()
    }

    /// Match `filename` against the exceptions of one season folder.
    pub fn match_in_season(&self, season: u32, filename: &str) -> ExceptionMatch {
        let Some(entries) = self.by_season.get(&season) else {
            return ExceptionMatch::None;
        };
        let mut hits = entries.iter().filter(|(pattern, _)| filename.contains(pattern.as_str()));
        match (hits.next(), hits.next()) {
            (None, _) => ExceptionMatch::None,
            (Some((_, episode)), None) => ExceptionMatch::One {
                season,
                episode: *episode,
            },
            (Some(_), Some(_)) => ExceptionMatch::Ambiguous,
        }
    }

    /// Match `filename` against every season. A hit in more than one season
    /// is ambiguous.
    pub fn match_filename(&self, filename: &str) -> ExceptionMatch {
        let mut found = ExceptionMatch::None;
        for season in self.by_season.keys() {
            match self.match_in_season(*season, filename) {
                ExceptionMatch::None => {}
                ExceptionMatch::Ambiguous => return ExceptionMatch::Ambiguous,
                hit @ ExceptionMatch::One { .. } => {
                    if found != ExceptionMatch::None {
                        return ExceptionMatch::Ambiguous;
                    }
                    found = hit;
                }
            }
        }
        found
    }
}

/// `Season 12` → 12, `Specials` → 0.
pub fn parse_season_label(label: &str) -> Option<u32> {
    let label = label.trim();
    if label.eq_ignore_ascii_case(&season_dir_name(0)) {
        return Some(0);
    }
    let (word, number) = label.split_once(' ')?;
    if !word.eq_ignore_ascii_case("season") {
        return None;
    }
    number.trim().parse().ok()
}
