//! Suspension points where resolution needs a decision from outside.

use std::collections::VecDeque;

use pacesync_core::ReleaseDate;
use pacesync_core::error::PipelineError;
use pacesync_core::types::IdentityKey;

/// A request for input returned by the resolver instead of blocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Source table and filename/media disagree on the title. Both
    /// candidates carry the variant that will be used.
    TitleConflict {
        key: IdentityKey,
        filename: String,
        source_title: String,
        media_title: String,
    },
    /// No release date in any source.
    MissingDate {
        key: IdentityKey,
        filename: String,
        title: String,
    },
    /// Neither the filename nor the source table carries a title.
    MissingTitle { key: IdentityKey, filename: String },
}

impl Prompt {
    pub fn key(&self) -> IdentityKey {
        match self {
            Self::TitleConflict { key, .. }
            | Self::MissingDate { key, .. }
            | Self::MissingTitle { key, .. } => *key,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::TitleConflict { filename, .. }
            | Self::MissingDate { filename, .. }
            | Self::MissingTitle { filename, .. } => filename,
        }
    }

    /// The error this prompt becomes when nobody can answer it.
    pub fn into_error(self) -> PipelineError {
        match self {
            Self::TitleConflict {
                key,
                source_title,
                media_title,
                ..
            } => PipelineError::TitleConflict {
                key: key.key,
                source_title,
                media_title,
            },
            Self::MissingDate { key, filename, .. } => PipelineError::MissingRequiredDate {
                key: key.key,
                filename,
            },
            Self::MissingTitle { key, filename } => PipelineError::MissingTitle {
                key: key.key,
                filename,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Take the source-table title for this episode.
    UseSource,
    /// Take the filename/media title for this episode.
    UseMedia,
    /// Prefer source titles for the rest of the run.
    AlwaysSource,
    /// Prefer filename/media titles for the rest of the run.
    AlwaysMedia,
    Date(ReleaseDate),
    Title(String),
    Quit,
}

pub trait Answerer {
    fn answer(&mut self, prompt: &Prompt) -> Result<Answer, PipelineError>;
}

/// Answers queued up front; an exhausted queue behaves like
/// [`NonInteractive`].
#[derive(Debug, Default)]
pub struct ScriptedAnswers {
    queue: VecDeque<Answer>,
    asked: Vec<Prompt>,
}

impl ScriptedAnswers {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            queue: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Prompts seen so far, in order.
    pub fn asked(&self) -> &[Prompt] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl Answerer for ScriptedAnswers {
    fn answer(&mut self, prompt: &Prompt) -> Result<Answer, PipelineError> {
        self.asked.push(prompt.clone());
        self.queue
            .pop_front()
            .ok_or_else(|| prompt.clone().into_error())
    }
}

/// Every prompt is a hard error.
pub struct NonInteractive;

impl Answerer for NonInteractive {
    fn answer(&mut self, prompt: &Prompt) -> Result<Answer, PipelineError> {
        Err(prompt.clone().into_error())
    }
}
