//! Per-run mutable context: cached answers and the sticky title preference.

use std::collections::HashMap;

use pacesync_core::ReleaseDate;
use pacesync_core::error::PipelineError;
use pacesync_core::types::{EpisodeKey, IdentityKey};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::prompt::{Answer, Prompt};

/// How title conflicts are settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitlePolicy {
    #[default]
    Ask,
    PreferSource,
    PreferMedia,
}

impl TitlePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::PreferSource => "prefer_source",
            Self::PreferMedia => "prefer_media",
        }
    }
}

impl std::fmt::Display for TitlePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Source,
    Media,
}

#[derive(Debug, Default)]
pub struct RunState {
    policy: TitlePolicy,
    dates: HashMap<EpisodeKey, ReleaseDate>,
    title_choices: HashMap<IdentityKey, TitleSource>,
    supplied_titles: HashMap<IdentityKey, String>,
}

impl RunState {
    pub fn new(policy: TitlePolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn policy(&self) -> TitlePolicy {
        self.policy
    }

    pub fn cached_date(&self, key: EpisodeKey) -> Option<ReleaseDate> {
        self.dates.get(&key).copied()
    }

    /// Seed the date cache, e.g. from a sidecar that already carries one.
    pub fn remember_date(&mut self, key: EpisodeKey, date: ReleaseDate) {
        self.dates.entry(key).or_insert(date);
    }

    /// Per-episode choice first, then the sticky policy.
    pub fn title_source(&self, key: IdentityKey) -> Option<TitleSource> {
        self.title_choices.get(&key).copied().or(match self.policy {
            TitlePolicy::Ask => None,
            TitlePolicy::PreferSource => Some(TitleSource::Source),
            TitlePolicy::PreferMedia => Some(TitleSource::Media),
        })
    }

    pub fn supplied_title(&self, key: IdentityKey) -> Option<&str> {
        self.supplied_titles.get(&key).map(String::as_str)
    }

    /// Record the answer to `prompt`. `Quit` cancels the run.
    pub fn apply(&mut self, prompt: &Prompt, answer: Answer) -> Result<(), PipelineError> {
        let key = prompt.key();
        match (prompt, answer) {
            (_, Answer::Quit) => return Err(PipelineError::Cancelled),
            (Prompt::TitleConflict { .. }, Answer::UseSource) => {
                self.title_choices.insert(key, TitleSource::Source);
            }
            (Prompt::TitleConflict { .. }, Answer::UseMedia) => {
                self.title_choices.insert(key, TitleSource::Media);
            }
            (Prompt::TitleConflict { .. }, Answer::AlwaysSource) => {
                info!("preferring source titles for the rest of the run");
                self.policy = TitlePolicy::PreferSource;
            }
            (Prompt::TitleConflict { .. }, Answer::AlwaysMedia) => {
                info!("preferring media titles for the rest of the run");
                self.policy = TitlePolicy::PreferMedia;
            }
            (Prompt::MissingDate { .. }, Answer::Date(date)) => {
                self.dates.insert(key.key, date);
            }
            (Prompt::MissingTitle { .. }, Answer::Title(title)) => {
                let title = title.trim();
                if title.is_empty() {
                    return Err(PipelineError::InvalidAnswer("empty title".into()));
                }
                self.supplied_titles.insert(key, title.to_string());
            }
            (prompt, answer) => {
                return Err(PipelineError::InvalidAnswer(format!(
                    "{answer:?} does not answer {prompt:?}"
                )));
            }
        }
        Ok(())
    }
}
