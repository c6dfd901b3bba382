use std::collections::BTreeSet;

use pacesync_core::ranges::format_ranges;
use pacesync_core::types::ResolvedEpisode;

use crate::document::{SidecarDocument, SidecarKind};

/// Description followed by the coverage lines that mark a condensed episode.
pub fn build_plot(plot: &str, chapters: &BTreeSet<u32>, episodes: &BTreeSet<u32>) -> String {
    let mut out = plot.trim().to_string();
    let mut lines = Vec::new();
    if !chapters.is_empty() {
        lines.push(format!("Manga Chapter(s): {}", format_ranges(chapters)));
    }
    if !episodes.is_empty() {
        lines.push(format!("Anime Episode(s): {}", format_ranges(episodes)));
    }
    if !lines.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&lines.join("\n\n"));
    }
    out
}

pub fn build_episode(episode: &ResolvedEpisode, show_title: &str) -> SidecarDocument {
    let mut doc = SidecarDocument::new(SidecarKind::Episode);
    doc.push("title", episode.display_title());
    doc.push("showtitle", show_title);
    doc.push("season", episode.season.to_string());
    doc.push("episode", episode.episode.to_string());
    doc.push(
        "plot",
        build_plot(&episode.plot, &episode.manga_chapters, &episode.anime_episodes),
    );
    doc.push("premiered", episode.premiered.to_string());
    doc.push("aired", episode.aired.to_string());
    doc
}

/// Season document titled `"<N>. <Arc>"`.
pub fn build_season(season: u32, arc_name: &str) -> SidecarDocument {
    let mut doc = SidecarDocument::new(SidecarKind::Season);
    doc.push("title", season_title(season, arc_name));
    doc.push("seasonnumber", season.to_string());
    doc
}

pub(crate) fn season_title(season: u32, arc_name: &str) -> String {
    format!("{season}. {arc_name}")
}

pub fn build_show(show_title: &str) -> SidecarDocument {
    let mut doc = SidecarDocument::new(SidecarKind::Show);
    doc.push("title", show_title);
    doc
}
