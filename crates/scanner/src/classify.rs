//! Library classification against the canonical repository.

use std::collections::BTreeSet;

use pacesync_core::coverage;
use pacesync_core::types::{CanonicalRecord, Classification, LibraryFile};
use serde::Serialize;
use tracing::debug;

use crate::walk::under_vcs_dir;

/// Original-source episode numbers already replaced by some canonical record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageIndex {
    episodes: BTreeSet<u32>,
}

impl CoverageIndex {
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a CanonicalRecord>,
    {
        let episodes = records
            .into_iter()
            .filter(|r| coverage::has_coverage_marker(&r.plot))
            .flat_map(|r| coverage::covered_episodes(&r.plot))
            .collect();
        Self { episodes }
    }

    pub fn contains(&self, original_number: u32) -> bool {
        self.episodes.contains(&original_number)
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.episodes.iter().copied()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationReport {
    pub valid: Vec<LibraryFile>,
    pub obsolete_original: Vec<LibraryFile>,
    pub missing_metadata: Vec<LibraryFile>,
    /// Files whose name carries no usable identity.
    pub unparseable: Vec<LibraryFile>,
    /// Season 0 and version-control files, never classified.
    pub excluded: usize,
    /// Sidecars beside library files that could not be read.
    pub unreadable_sidecars: usize,
}

impl ClassificationReport {
    /// Obsolete or missing-metadata files exist.
    pub fn has_issues(&self) -> bool {
        !self.obsolete_original.is_empty() || !self.missing_metadata.is_empty()
    }

    pub fn classified(&self) -> usize {
        self.valid.len() + self.obsolete_original.len() + self.missing_metadata.len()
    }
}

/// Classify one file given its sidecar plot text, if a sidecar exists.
pub fn classify_file(
    file: &LibraryFile,
    index: &CoverageIndex,
    sidecar_plot: Option<&str>,
) -> Classification {
    if sidecar_plot.is_some_and(coverage::has_coverage_marker) {
        return Classification::Valid;
    }
    let original = file.identity.as_ref().and_then(|i| i.original_number);
    match original {
        Some(n) if index.contains(n) => Classification::ObsoleteOriginal,
        _ => Classification::MissingMetadata,
    }
}

/// Classify every library file. `sidecar_plot` returns the plot text of the
/// sidecar next to a file, or `None` if there is none.
pub fn classify<F>(
    files: &[LibraryFile],
    records: &[CanonicalRecord],
    sidecar_plot: F,
) -> ClassificationReport
where
    F: Fn(&LibraryFile) -> Option<String>,
{
    let index = CoverageIndex::build(records);
    debug!(covered = index.len(), "built coverage index");

    let mut report = ClassificationReport::default();
    for file in files {
        if under_vcs_dir(&file.path) || file.season() == Some(0) {
            report.excluded += 1;
            continue;
        }
        if !file.identity.as_ref().is_some_and(|i| i.is_parseable()) {
            report.unparseable.push(file.clone());
            continue;
        }

        let plot = sidecar_plot(file);
        let class = classify_file(file, &index, plot.as_deref());
        debug!(file = %file.filename, class = %class, "classified");
        match class {
            Classification::Valid => report.valid.push(file.clone()),
            Classification::ObsoleteOriginal => report.obsolete_original.push(file.clone()),
            Classification::MissingMetadata => report.missing_metadata.push(file.clone()),
        }
    }

    for list in [
        &mut report.valid,
        &mut report.obsolete_original,
        &mut report.missing_metadata,
    ] {
        list.sort_by_key(sort_key);
    }
    report
}

fn sort_key(file: &LibraryFile) -> (Option<u32>, Option<u32>, Option<u32>) {
    match &file.identity {
        Some(id) => (id.season, id.episode, id.original_number),
        None => (None, None, None),
    }
}
