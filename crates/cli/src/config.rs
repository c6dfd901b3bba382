//! Configuration loaded from a TOML file, with defaults for every setting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use pacesync_core::exceptions::ExceptionMapping;
use pacesync_core::taxonomy::SeasonTaxonomy;
use pacesync_metadata::TitlePolicy;
use pacesync_metadata::retry::RetryPolicy;
use pacesync_metadata::sheets::{DEFAULT_EPISODE_GUIDE_URL, DEFAULT_TITLE_PLOT_URL, SheetsSource};
use pacesync_scanner::ProvisionalRange;
use pacesync_scanner::walk::WalkOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub show_title: String,

    /// Personal library root holding `Season N` folders.
    pub library_path: Option<PathBuf>,

    /// Canonical sidecar tree, e.g. `<repo>/One Pace`.
    pub repository_path: PathBuf,

    /// Season taxonomy JSON; the built-in copy is used when unset.
    pub seasons_path: Option<PathBuf>,

    pub exceptions_path: Option<PathBuf>,

    pub title_policy: TitlePolicy,

    pub video_extensions: Vec<String>,

    /// Read embedded container titles with ffprobe.
    pub probe_media: bool,
    pub ffprobe_path: PathBuf,

    pub sources: SourcesConfig,
    pub retry: RetryConfig,
    pub provisional: ProvisionalConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub title_plot_url: String,
    pub episode_guide_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Bare original numbers in `first..=last` map onto `season`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionalConfig {
    pub first: u32,
    pub last: u32,
    pub season: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            show_title: pacesync_core::SHOW_TITLE.to_string(),
            library_path: None,
            repository_path: PathBuf::from(pacesync_core::SHOW_TITLE),
            seasons_path: None,
            exceptions_path: None,
            title_policy: TitlePolicy::Ask,
            video_extensions: vec!["mkv".into(), "mp4".into()],
            probe_media: true,
            ffprobe_path: PathBuf::from("ffprobe"),
            sources: SourcesConfig::default(),
            retry: RetryConfig::default(),
            provisional: ProvisionalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            title_plot_url: DEFAULT_TITLE_PLOT_URL.to_string(),
            episode_guide_url: DEFAULT_EPISODE_GUIDE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            attempts: policy.attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
        }
    }
}

impl Default for ProvisionalConfig {
    fn default() -> Self {
        let range = ProvisionalRange::default();
        Self {
            first: range.first,
            last: range.last,
            season: range.season,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn load_taxonomy(&self) -> Result<SeasonTaxonomy> {
        match &self.seasons_path {
            Some(path) => SeasonTaxonomy::from_file(path)
                .with_context(|| format!("failed to load seasons from {}", path.display())),
            None => Ok(SeasonTaxonomy::builtin()),
        }
    }

    pub fn load_exceptions(&self) -> Result<ExceptionMapping> {
        match &self.exceptions_path {
            Some(path) => ExceptionMapping::from_file(path)
                .with_context(|| format!("failed to load exceptions from {}", path.display())),
            None => Ok(ExceptionMapping::empty()),
        }
    }

    pub fn provisional_range(&self) -> ProvisionalRange {
        ProvisionalRange {
            first: self.provisional.first,
            last: self.provisional.last,
            season: self.provisional.season,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry.attempts.max(1),
            base_delay: Duration::from_millis(self.retry.base_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    pub fn walk_options(&self, recursive: bool) -> WalkOptions {
        WalkOptions {
            recursive,
            extensions: self
                .video_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn sheets_source(&self) -> Result<SheetsSource> {
        SheetsSource::new(
            self.sources.title_plot_url.clone(),
            self.sources.episode_guide_url.clone(),
            Duration::from_secs(self.sources.timeout_secs),
            self.retry_policy(),
        )
        .context("failed to build HTTP client")
    }

    pub fn library_root(&self) -> Result<&Path> {
        self.library_path
            .as_deref()
            .context("library_path is not configured (set it in the config file or pass --library)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let config = AppConfig::from_file("/definitely/not/here.toml").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.show_title, "One Pace");
        assert_eq!(config.provisional_range(), ProvisionalRange::default());
    }

    #[test]
    fn partial_file_overrides_selected_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pacesync.toml");
        std::fs::write(
            &path,
            r#"
library_path = "/media/One Pace"
title_policy = "prefer_source"
video_extensions = [".MKV"]

[retry]
attempts = 5

[provisional]
season = 36
"#,
        )
        .unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.library_root().unwrap(), Path::new("/media/One Pace"));
        assert_eq!(config.title_policy, TitlePolicy::PreferSource);
        assert_eq!(config.retry_policy().attempts, 5);
        assert_eq!(config.retry_policy().base_delay, Duration::from_millis(500));
        assert_eq!(config.provisional_range().season, 36);
        assert_eq!(config.provisional_range().first, 1000);
        assert_eq!(config.walk_options(true).extensions, vec!["mkv".to_string()]);
    }

    #[test]
    fn unset_library_is_an_error() {
        assert!(AppConfig::default().library_root().is_err());
    }
}
