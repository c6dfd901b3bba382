//! Structural repair and change detection for existing sidecars.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use pacesync_core::types::CanonicalRecord;
use tracing::debug;

use crate::build::season_title;
use crate::document::{ALLOWED_FIELDS, SidecarDocument, SidecarKind};
use crate::naming::parse_sidecar_filename;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    Disallowed(String),
    Empty(String),
    Duplicate(String),
}

impl Repair {
    pub fn field(&self) -> &str {
        match self {
            Self::Disallowed(f) | Self::Empty(f) | Self::Duplicate(f) => f,
        }
    }
}

/// Drop fields outside the allow-list, empty fields and repeated fields.
/// The first non-empty occurrence of a field is the one kept.
pub fn clean(doc: &SidecarDocument) -> (SidecarDocument, Vec<Repair>) {
    let mut kept = Vec::with_capacity(doc.len());
    let mut repairs = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (name, value) in doc.fields() {
        if !ALLOWED_FIELDS.contains(&name.as_str()) {
            repairs.push(Repair::Disallowed(name.clone()));
        } else if value.trim().is_empty() {
            repairs.push(Repair::Empty(name.clone()));
        } else if !seen.insert(name.as_str()) {
            repairs.push(Repair::Duplicate(name.clone()));
        } else {
            kept.push((name.clone(), value.clone()));
        }
    }
    (SidecarDocument::with_fields(doc.kind, kept), repairs)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub content_changed: bool,
    pub rename_needed: bool,
    pub repairs: Vec<Repair>,
}

impl Reconciliation {
    /// Whether the sidecar must be rewritten, for content or structure.
    pub fn needs_write(&self) -> bool {
        self.content_changed || !self.repairs.is_empty()
    }
}

fn as_map(doc: &SidecarDocument) -> BTreeMap<&str, &str> {
    doc.fields()
        .iter()
        .map(|(n, v)| (n.as_str(), v.trim()))
        .collect()
}

/// Compare an existing sidecar against the one the builder produced, after
/// structural cleanup. Field order is not significant.
pub fn reconcile(
    existing: &SidecarDocument,
    built: &SidecarDocument,
    existing_filename: &str,
    expected_filename: &str,
) -> Reconciliation {
    let (cleaned, repairs) = clean(existing);
    let content_changed = cleaned.kind != built.kind || as_map(&cleaned) != as_map(built);
    let rename_needed = existing_filename != expected_filename;
    if !repairs.is_empty() {
        debug!(file = existing_filename, repairs = repairs.len(), "sidecar needs structural repair");
    }
    Reconciliation {
        content_changed,
        rename_needed,
        repairs,
    }
}

/// Clean a season document and make sure its title and number match the
/// taxonomy. Returns the repaired document and whether anything changed.
pub fn repair_season(doc: &SidecarDocument, season: u32, arc_name: &str) -> (SidecarDocument, bool) {
    let (mut cleaned, repairs) = clean(doc);
    let mut changed = !repairs.is_empty();
    if cleaned.kind == SidecarKind::Season {
        changed |= cleaned.ensure("title", &season_title(season, arc_name));
        changed |= cleaned.ensure("seasonnumber", &season.to_string());
    }
    (cleaned, changed)
}

/// Read an episode sidecar as a canonical record. Season and episode come
/// from the document, falling back to the filename.
pub fn to_canonical_record(doc: &SidecarDocument, path: &Path) -> Option<CanonicalRecord> {
    if doc.kind != SidecarKind::Episode {
        return None;
    }
    let from_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(parse_sidecar_filename);
    let number = |field: &str| doc.get(field).and_then(|v| v.trim().parse::<u32>().ok());

    let season = number("season").or(from_name.as_ref().map(|n| n.season))?;
    let episode = number("episode").or(from_name.as_ref().map(|n| n.episode))?;
    let title = match doc.get("title").filter(|t| !t.trim().is_empty()) {
        Some(t) => t.trim().to_string(),
        None => from_name.map(|n| n.display_title()).unwrap_or_default(),
    };

    let mut record = CanonicalRecord::from_fields(
        season,
        episode,
        &title,
        doc.get("plot").unwrap_or_default(),
        doc.get("premiered"),
        doc.get("aired"),
    );
    record.path = Some(path.to_path_buf());
    Some(record)
}
