#![allow(clippy::type_complexity)]
pub mod prompt;
pub mod provider;
pub mod resolver;
pub mod retry;
pub mod sheets;
pub mod state;
pub mod tables;

use std::collections::BTreeSet;

use pacesync_core::ReleaseDate;
use thiserror::Error;

pub use prompt::{Answer, Answerer, NonInteractive, Prompt, ScriptedAnswers};
pub use provider::{MetadataSource, StaticSource};
pub use resolver::{Resolution, Resolver};
pub use state::{RunState, TitlePolicy};
pub use tables::MetadataTables;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed feed: {0}")]
    Format(String),
}

/// One row of the title/plot feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TitleRow {
    pub arc_title: String,
    pub arc_part: String,
    pub title: String,
    pub description: String,
}

/// One installment row of an arc's episode guide table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailRow {
    /// e.g. `Syrup Village 01`; single-installment arcs use the arc name.
    pub episode_name: String,
    pub manga_chapters: BTreeSet<u32>,
    pub anime_episodes: BTreeSet<u32>,
    pub release_date: Option<ReleaseDate>,
}

/// Episode guide table for one arc.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcDetails {
    pub arc_name: String,
    pub rows: Vec<DetailRow>,
}
