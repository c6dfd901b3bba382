pub mod build;
pub mod document;
pub mod naming;
pub mod reconcile;
pub mod store;
pub mod xml;

use std::path::{Path, PathBuf};

use pacesync_core::error::PipelineError;
use thiserror::Error;

pub use build::{build_episode, build_plot, build_season, build_show};
pub use document::{ALLOWED_FIELDS, SidecarDocument, SidecarKind};
pub use naming::{SidecarName, episode_filename, episode_stem, parse_sidecar_filename};
pub use reconcile::{Reconciliation, Repair, clean, reconcile, repair_season, to_canonical_record};
pub use store::{FsSidecarStore, SidecarStore, load_records};

#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("document has no root element")]
    MissingRoot,
    #[error("unknown root element <{0}>")]
    UnknownRoot(String),
}

impl SidecarError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Surface as a per-episode pipeline failure for `path`.
    pub fn into_write_failure(self, path: &Path) -> PipelineError {
        PipelineError::SidecarWriteFailure {
            path: path.to_path_buf(),
            reason: self.to_string(),
        }
    }
}
