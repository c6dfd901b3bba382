//! In-memory indexes over the two metadata feeds.

use std::collections::HashMap;
use std::sync::LazyLock;

use pacesync_core::error::PipelineError;
use pacesync_core::normalize::{self, DEFAULT_THRESHOLD};
use pacesync_core::taxonomy::SeasonTaxonomy;
use pacesync_core::types::EpisodeKey;
use regex::Regex;
use tracing::{debug, info};

use crate::provider::MetadataSource;
use crate::{ArcDetails, DetailRow, TitleRow};

// Trailing installment number in guide rows: "Syrup Village 01".
static RE_TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\b\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleEntry {
    pub arc_title: String,
    pub title: String,
    pub plot: String,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataTables {
    titles: HashMap<EpisodeKey, TitleEntry>,
    arcs: Vec<ArcDetails>,
}

impl MetadataTables {
    /// Index title rows by `(season, episode)`. Rows whose arc is not in the
    /// taxonomy or whose part is not a number are dropped.
    pub fn build(titles: Vec<TitleRow>, arcs: Vec<ArcDetails>, taxonomy: &SeasonTaxonomy) -> Self {
        let mut index = HashMap::new();
        for row in titles {
            let Some((_, season)) = taxonomy.lookup(&row.arc_title) else {
                debug!(arc = %row.arc_title, "title row arc not in taxonomy");
                continue;
            };
            let Ok(episode) = row.arc_part.trim().parse::<u32>() else {
                debug!(arc = %row.arc_title, part = %row.arc_part, "non-numeric arc part");
                continue;
            };
            index.entry(EpisodeKey::new(season, episode)).or_insert(TitleEntry {
                arc_title: row.arc_title,
                title: row.title,
                plot: row.description,
            });
        }
        Self {
            titles: index,
            arcs,
        }
    }

    /// Pull both feeds from `source`. Any failure is fatal to the run.
    pub fn load(source: &dyn MetadataSource, taxonomy: &SeasonTaxonomy) -> Result<Self, PipelineError> {
        let unavailable =
            |e: crate::MetadataError| PipelineError::ExternalSourceUnavailable(format!("{}: {e}", source.name()));
        let titles = source.fetch_titles().map_err(unavailable)?;
        let arcs = source.fetch_arc_details().map_err(unavailable)?;
        let tables = Self::build(titles, arcs, taxonomy);
        info!(
            titles = tables.titles.len(),
            arcs = tables.arcs.len(),
            "metadata tables ready"
        );
        Ok(tables)
    }

    pub fn title_count(&self) -> usize {
        self.titles.len()
    }

    pub fn title(&self, key: EpisodeKey) -> Option<&TitleEntry> {
        self.titles.get(&key)
    }

    /// Guide table for an arc: exact name first, then fuzzy.
    pub fn arc(&self, arc_name: &str) -> Option<&ArcDetails> {
        let wanted = arc_name.to_lowercase();
        self.arcs
            .iter()
            .find(|a| a.arc_name.to_lowercase() == wanted)
            .or_else(|| {
                self.arcs
                    .iter()
                    .find(|a| normalize::similar(arc_name, &a.arc_name, DEFAULT_THRESHOLD))
            })
    }

    /// Guide row for one installment, matched by the number suffix of its
    /// name. A single-installment arc matches by arc-name similarity instead.
    pub fn details(&self, arc_name: &str, episode: u32) -> Option<&DetailRow> {
        let arc = self.arc(arc_name)?;
        let by_number = arc.rows.iter().find(|row| {
            RE_TRAILING_NUMBER
                .captures(&row.episode_name)
                .and_then(|c| c[1].parse::<u32>().ok())
                == Some(episode)
        });
        if by_number.is_some() {
            return by_number;
        }
        match arc.rows.as_slice() {
            [only] if episode == 1 && normalize::similar(&only.episode_name, arc_name, DEFAULT_THRESHOLD) => {
                debug!(arc = arc_name, "single-installment arc");
                Some(only)
            }
            _ => None,
        }
    }
}
