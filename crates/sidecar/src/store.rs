use std::fs;
use std::path::Path;

use pacesync_core::types::CanonicalRecord;
use tracing::warn;

use crate::SidecarError;
use crate::document::SidecarDocument;
use crate::reconcile::to_canonical_record;
use crate::xml;

pub trait SidecarStore {
    fn read(&self, path: &Path) -> Result<SidecarDocument, SidecarError>;
    fn write(&self, path: &Path, doc: &SidecarDocument) -> Result<(), SidecarError>;
}

/// Sidecars as `.nfo` files on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSidecarStore;

impl SidecarStore for FsSidecarStore {
    fn read(&self, path: &Path) -> Result<SidecarDocument, SidecarError> {
        let text = fs::read_to_string(path).map_err(|e| SidecarError::io(path, e))?;
        xml::parse(&text)
    }

    fn write(&self, path: &Path, doc: &SidecarDocument) -> Result<(), SidecarError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SidecarError::io(parent, e))?;
        }
        fs::write(path, xml::render(doc)).map_err(|e| SidecarError::io(path, e))
    }
}

/// Load every readable episode sidecar among `paths` as a canonical record.
/// Unreadable files are logged and skipped.
pub fn load_records<'a, I>(store: &dyn SidecarStore, paths: I) -> Vec<CanonicalRecord>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut records = Vec::new();
    for path in paths {
        match store.read(path) {
            Ok(doc) => {
                if let Some(record) = to_canonical_record(&doc, path) {
                    records.push(record);
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable sidecar"),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SidecarKind;

    #[test]
    fn write_then_load_records() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("Season 1/One Pace - S01E01 - Romance Dawn.nfo");
        let bad = dir.path().join("broken.nfo");
        let mut doc = SidecarDocument::new(SidecarKind::Episode);
        doc.push("title", "Romance Dawn");
        doc.push("season", "1");
        doc.push("episode", "1");
        doc.push("plot", "Manga Chapter(s): 1");
        FsSidecarStore.write(&good, &doc).unwrap();
        fs::write(&bad, "<movie>").unwrap();

        assert_eq!(FsSidecarStore.read(&good).unwrap(), doc);
        let records = load_records(&FsSidecarStore, [good.as_path(), bad.as_path()]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Romance Dawn");
    }
}
