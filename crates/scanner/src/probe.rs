use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("spawn failed: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("probe failed: {0}")]
    Failed(String),
    #[error("parse JSON: {0}")]
    Parse(String),
}

/// Container tags read from a media file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeInfo {
    pub title: Option<String>,
}

pub trait MediaProber {
    fn probe(&self, path: &Path) -> Result<ProbeInfo, ProbeError>;
}

/// Prober for runs where embedded tags are not consulted.
pub struct NoProbe;

impl MediaProber for NoProbe {
    fn probe(&self, _path: &Path) -> Result<ProbeInfo, ProbeError> {
        Ok(ProbeInfo::default())
    }
}

/// Reads `format.tags.title` via an external ffprobe binary.
pub struct Ffprobe {
    binary: PathBuf,
}

impl Ffprobe {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProber for Ffprobe {
    fn probe(&self, path: &Path) -> Result<ProbeInfo, ProbeError> {
        let output = Command::new(&self.binary)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Failed(stderr.into_owned()));
        }

        let raw: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProbeError::Parse(e.to_string()))?;
        parse_probe_output(&raw)
    }
}

fn parse_probe_output(raw: &serde_json::Value) -> Result<ProbeInfo, ProbeError> {
    let format = raw
        .get("format")
        .ok_or_else(|| ProbeError::Parse("missing 'format'".into()))?;

    // Matroska writes TITLE, mp4 writes title.
    let title = format
        .get("tags")
        .and_then(|t| t.as_object())
        .and_then(|tags| {
            tags.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("title"))
                .and_then(|(_, v)| v.as_str())
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(ProbeInfo { title })
}

/// Raw embedded title; probe failures yield `None`.
pub fn embedded_title(prober: &dyn MediaProber, path: &Path) -> Option<String> {
    match prober.probe(path) {
        Ok(info) => info.title,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no embedded title");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_title_tag_case_insensitively() {
        let raw = json!({"format": {"format_name": "matroska", "tags": {"TITLE": "Alabasta 05 - Crocodile"}}});
        assert_eq!(
            parse_probe_output(&raw).unwrap().title.as_deref(),
            Some("Alabasta 05 - Crocodile")
        );
    }

    #[test]
    fn missing_tags_yield_no_title() {
        let raw = json!({"format": {"format_name": "mp4"}});
        assert_eq!(parse_probe_output(&raw).unwrap(), ProbeInfo::default());
        assert!(parse_probe_output(&json!({})).is_err());
    }

    struct Fixed(Result<&'static str, ()>);

    impl MediaProber for Fixed {
        fn probe(&self, _path: &Path) -> Result<ProbeInfo, ProbeError> {
            match self.0 {
                Ok(t) => Ok(ProbeInfo {
                    title: Some(t.to_string()),
                }),
                Err(()) => Err(ProbeError::Failed("boom".into())),
            }
        }
    }

    #[test]
    fn probe_failures_are_swallowed() {
        let p = Path::new("a.mkv");
        assert_eq!(
            embedded_title(&Fixed(Ok("Alabasta 05 - Crocodile")), p).as_deref(),
            Some("Alabasta 05 - Crocodile")
        );
        assert_eq!(embedded_title(&Fixed(Err(())), p), None);
        assert_eq!(embedded_title(&NoProbe, p), None);
    }
}
