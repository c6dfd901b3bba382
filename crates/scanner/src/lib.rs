#![allow(clippy::collapsible_if, clippy::manual_range_contains)]
pub mod classify;
pub mod parser;
pub mod probe;
pub mod walk;

pub use classify::{ClassificationReport, CoverageIndex, classify};
pub use parser::{FilenameParser, PatternMatcher, ProvisionalRange};
pub use probe::{Ffprobe, MediaProber, NoProbe, ProbeInfo};

use pacesync_core::types::LibraryFile;

/// Walk `root`, probe and parse every video file.
pub fn scan_library(
    root: &std::path::Path,
    opts: &walk::WalkOptions,
    parser: &FilenameParser,
    prober: &dyn MediaProber,
) -> Vec<LibraryFile> {
    walk::walk_media_dir(root, opts)
        .into_iter()
        .map(|entry| {
            let embedded = probe::embedded_title(prober, &entry.path);
            let (format, identity) = parser.parse_with_format(&entry.filename, embedded.as_deref());
            LibraryFile {
                path: entry.path,
                filename: entry.filename,
                format,
                identity: (!identity.is_empty()).then_some(identity),
            }
        })
        .collect()
}
