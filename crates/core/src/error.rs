use std::path::PathBuf;

use thiserror::Error;

use crate::types::EpisodeKey;

/// Failure taxonomy shared by every stage of the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("filename matches no known pattern: {filename}")]
    ParseFailure { filename: String },

    #[error("cannot determine season/episode for {filename}: {detail}")]
    UnresolvableIdentity { filename: String, detail: String },

    #[error("no release date for {key} ({filename})")]
    MissingRequiredDate { key: EpisodeKey, filename: String },

    #[error("no title for {key} ({filename})")]
    MissingTitle { key: EpisodeKey, filename: String },

    #[error("title conflict for {key}: source {source_title:?} vs media {media_title:?}")]
    TitleConflict {
        key: EpisodeKey,
        source_title: String,
        media_title: String,
    },

    #[error("external source unavailable: {0}")]
    ExternalSourceUnavailable(String),

    #[error("sidecar write failed for {path}: {reason}")]
    SidecarWriteFailure { path: PathBuf, reason: String },

    #[error("cancelled by user")]
    Cancelled,

    #[error("answer does not fit prompt: {0}")]
    InvalidAnswer(String),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseFailure { .. } => "parse_failure",
            Self::UnresolvableIdentity { .. } => "unresolvable_identity",
            Self::MissingRequiredDate { .. } => "missing_required_date",
            Self::MissingTitle { .. } => "missing_title",
            Self::TitleConflict { .. } => "title_conflict",
            Self::ExternalSourceUnavailable(_) => "external_source_unavailable",
            Self::SidecarWriteFailure { .. } => "sidecar_write_failure",
            Self::Cancelled => "cancelled",
            Self::InvalidAnswer(_) => "invalid_answer",
        }
    }

    /// Fatal errors end the run; everything else skips one file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ExternalSourceUnavailable(_) | Self::Cancelled)
    }
}

/// Errors raised while loading static configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid season number for {arc:?}: {value}")]
    InvalidSeason { arc: String, value: String },

    #[error("invalid episode number for {label:?}/{pattern:?}: {value}")]
    InvalidEpisode {
        label: String,
        pattern: String,
        value: String,
    },
}
