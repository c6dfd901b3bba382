use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::coverage;
use crate::dates::ReleaseDate;
use crate::variant;

/// `(season, episode)` pair used for every table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpisodeKey {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeKey {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }
}

impl std::fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

/// Identity of a canonical record: a base episode and its variant cut
/// share `(season, episode)` but differ in `has_variant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    pub key: EpisodeKey,
    pub has_variant: bool,
}

impl IdentityKey {
    pub fn new(season: u32, episode: u32, has_variant: bool) -> Self {
        Self {
            key: EpisodeKey::new(season, episode),
            has_variant,
        }
    }
}

/// Best-effort identity inferred from a filename, progressively enriched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeIdentity {
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub title: Option<String>,
    /// Empty means the base cut.
    pub variant: String,
    pub arc_name: Option<String>,
    /// Unabridged-source episode number from bare numbering (`Episode 1010`).
    pub original_number: Option<u32>,
}

impl EpisodeIdentity {
    pub fn is_empty(&self) -> bool {
        self.season.is_none()
            && self.episode.is_none()
            && self.title.is_none()
            && self.arc_name.is_none()
            && self.original_number.is_none()
    }

    /// Either a full `(season, episode)` or a bare original number.
    pub fn is_parseable(&self) -> bool {
        self.key().is_some() || self.original_number.is_some()
    }

    pub fn key(&self) -> Option<EpisodeKey> {
        Some(EpisodeKey::new(self.season?, self.episode?))
    }

    pub fn identity_key(&self) -> Option<IdentityKey> {
        self.key().map(|key| IdentityKey {
            key,
            has_variant: !self.variant.is_empty(),
        })
    }
}

/// Naming convention a library file follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Plex,
    LegacyBracket,
    Unrecognized,
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plex => "plex",
            Self::LegacyBracket => "legacy_bracket",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A video file discovered by a directory scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryFile {
    pub path: PathBuf,
    pub filename: String,
    pub format: FileFormat,
    pub identity: Option<EpisodeIdentity>,
}

impl LibraryFile {
    /// Path of the sidecar that would sit next to this file.
    pub fn sidecar_path(&self) -> PathBuf {
        self.path.with_extension("nfo")
    }

    pub fn season(&self) -> Option<u32> {
        self.identity.as_ref().and_then(|i| i.season)
    }
}

/// One per-episode sidecar already present in the canonical repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub season: u32,
    pub episode: u32,
    pub variant: String,
    pub title: String,
    pub plot: String,
    pub premiered: Option<ReleaseDate>,
    pub aired: Option<ReleaseDate>,
    pub manga_chapters: BTreeSet<u32>,
    pub anime_episodes: BTreeSet<u32>,
    pub path: Option<PathBuf>,
}

impl CanonicalRecord {
    /// Build a record from raw sidecar field values. The variant is split
    /// off the title and coverage sets are recovered from the plot text.
    pub fn from_fields(
        season: u32,
        episode: u32,
        title: &str,
        plot: &str,
        premiered: Option<&str>,
        aired: Option<&str>,
    ) -> Self {
        let (base, variant) = variant::split_variant(title);
        Self {
            season,
            episode,
            variant,
            title: base,
            plot: plot.to_string(),
            premiered: premiered.and_then(ReleaseDate::parse),
            aired: aired.and_then(ReleaseDate::parse),
            manga_chapters: coverage::covered_chapters(plot),
            anime_episodes: coverage::covered_episodes(plot),
            path: None,
        }
    }

    /// Whether this record is a condensed episode rather than a stray original.
    pub fn is_canonical(&self) -> bool {
        coverage::has_canonical_marker(&self.plot)
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(self.season, self.episode, !self.variant.is_empty())
    }

    pub fn display_title(&self) -> String {
        variant::with_variant(&self.title, &self.variant)
    }
}

/// Outcome of classifying one library file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Valid,
    ObsoleteOriginal,
    MissingMetadata,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::ObsoleteOriginal => "obsolete_original",
            Self::MissingMetadata => "missing_metadata",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved, validated episode ready to be materialised as a sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEpisode {
    pub season: u32,
    pub episode: u32,
    /// Title without the variant suffix.
    pub title: String,
    pub variant: String,
    pub arc_name: Option<String>,
    pub plot: String,
    pub manga_chapters: BTreeSet<u32>,
    pub anime_episodes: BTreeSet<u32>,
    pub premiered: ReleaseDate,
    pub aired: ReleaseDate,
    pub source_filename: String,
}

impl ResolvedEpisode {
    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.season, self.episode)
    }

    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(self.season, self.episode, !self.variant.is_empty())
    }

    /// Title as it appears in sidecars and filenames, variant included.
    pub fn display_title(&self) -> String {
        variant::with_variant(&self.title, &self.variant)
    }
}

/// Folder name for a season under the library or repository root.
pub fn season_dir_name(season: u32) -> String {
    if season == 0 {
        "Specials".to_string()
    } else {
        format!("Season {season}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_key_display_is_zero_padded() {
        assert_eq!(EpisodeKey::new(5, 3).to_string(), "S05E03");
        assert_eq!(EpisodeKey::new(35, 120).to_string(), "S35E120");
    }

    #[test]
    fn canonical_record_from_fields() {
        let plot = "Luffy sets sail.\n\nManga Chapter(s): 1-3, 5\n\nAnime Episode(s): 1-2";
        let rec = CanonicalRecord::from_fields(
            1,
            1,
            "Romance Dawn (Extended)",
            plot,
            Some("2021-01-02"),
            None,
        );
        assert_eq!(rec.title, "Romance Dawn");
        assert_eq!(rec.variant, "Extended");
        assert_eq!(rec.manga_chapters, BTreeSet::from([1, 2, 3, 5]));
        assert_eq!(rec.anime_episodes, BTreeSet::from([1, 2]));
        assert!(rec.is_canonical());
        assert_eq!(rec.identity_key(), IdentityKey::new(1, 1, true));
        assert_eq!(rec.display_title(), "Romance Dawn (Extended)");
        assert_eq!(rec.premiered.map(|d| d.to_string()).as_deref(), Some("2021-01-02"));
    }

    #[test]
    fn original_episode_record_is_not_canonical() {
        let rec = CanonicalRecord::from_fields(35, 1010, "Episode 1010", "A plot.", None, None);
        assert!(!rec.is_canonical());
    }

    #[test]
    fn season_dir_names() {
        assert_eq!(season_dir_name(0), "Specials");
        assert_eq!(season_dir_name(14), "Season 14");
    }
}
