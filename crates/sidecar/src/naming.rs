//! Canonical episode filenames: `One Pace - S12E05 - Title (Variant).mkv`.

use std::sync::LazyLock;

use pacesync_core::normalize::sanitize;
use pacesync_core::variant;
use regex::Regex;

static RE_SIDECAR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<show>.*?) - S(?P<season>\d+)E(?P<episode>\d+) - (?P<title>.*?)\.nfo$").unwrap());

/// Filename without extension.
pub fn episode_stem(show_title: &str, season: u32, episode: u32, display_title: &str) -> String {
    format!(
        "{show_title} - S{season:02}E{episode:02} - {}",
        sanitize(display_title)
    )
}

/// `ext` is given without the leading dot.
pub fn episode_filename(
    show_title: &str,
    season: u32,
    episode: u32,
    display_title: &str,
    ext: &str,
) -> String {
    format!("{}.{ext}", episode_stem(show_title, season, episode, display_title))
}

/// Identity recovered from a canonical sidecar's filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarName {
    pub show: String,
    pub season: u32,
    pub episode: u32,
    pub title: String,
    pub variant: String,
}

impl SidecarName {
    pub fn display_title(&self) -> String {
        variant::with_variant(&self.title, &self.variant)
    }
}

pub fn parse_sidecar_filename(name: &str) -> Option<SidecarName> {
    let caps = RE_SIDECAR_NAME.captures(name)?;
    let (title, variant) = variant::split_variant(&caps["title"]);
    Some(SidecarName {
        show: caps["show"].to_string(),
        season: caps["season"].parse().ok()?,
        episode: caps["episode"].parse().ok()?,
        title,
        variant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_and_variant_cuts_get_distinct_names() {
        let base = episode_filename("One Pace", 5, 3, "Luffy vs Kuro", "mkv");
        let ext = episode_filename("One Pace", 5, 3, "Luffy vs Kuro (Extended)", "mkv");
        assert_eq!(base, "One Pace - S05E03 - Luffy vs Kuro.mkv");
        assert_eq!(ext, "One Pace - S05E03 - Luffy vs Kuro (Extended).mkv");
        assert_ne!(base, ext);
    }

    #[test]
    fn titles_are_sanitized() {
        assert_eq!(
            episode_stem("One Pace", 19, 1, "Enies Lobby: Robin's Past?"),
            "One Pace - S19E01 - Enies Lobby - Robin's Past"
        );
    }

    #[test]
    fn parses_sidecar_names() {
        let n = parse_sidecar_filename("One Pace - S12E05 - Alabasta (Alternate (G-8)).nfo").unwrap();
        assert_eq!((n.season, n.episode), (12, 5));
        assert_eq!(n.title, "Alabasta");
        assert_eq!(n.variant, "Alternate (G-8)");
        assert_eq!(n.display_title(), "Alabasta (Alternate (G-8))");
        assert!(parse_sidecar_filename("season.nfo").is_none());
        assert!(parse_sidecar_filename("One Pace - S12E05 - A.mkv").is_none());
    }
}
