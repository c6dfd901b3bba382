//! Detect mode: classify every library video against the repository.

use std::cell::Cell;
use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use pacesync_core::types::LibraryFile;
use pacesync_scanner::walk::walk_sidecars;
use pacesync_scanner::{ClassificationReport, classify, scan_library};
use pacesync_sidecar::load_records;
use serde::Serialize;
use tracing::{info, warn};

use crate::context::RunContext;

#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    valid: usize,
    obsolete_original: Vec<&'a PathBuf>,
    missing_metadata: Vec<&'a PathBuf>,
    unparseable: Vec<&'a PathBuf>,
    excluded: usize,
    unreadable_sidecars: usize,
}

/// Returns the report, already rendered in the requested format.
pub fn run(ctx: &RunContext, opts: &DetectOptions) -> Result<(ClassificationReport, String)> {
    let library = ctx.config.library_root()?;
    let files = scan_library(
        library,
        &ctx.config.walk_options(true),
        &ctx.parser,
        ctx.prober.as_ref(),
    );

    let mut sidecars = walk_sidecars(&ctx.config.repository_path, true);
    sidecars.extend(walk_sidecars(library, true));
    let records = load_records(ctx.store.as_ref(), sidecars.iter().map(|p| p.as_path()));
    info!(files = files.len(), records = records.len(), "classifying library");

    let unreadable = Cell::new(0);
    let mut report = classify(&files, &records, |file| {
        let path = file.sidecar_path();
        if !ctx.fs.exists(&path) {
            return None;
        }
        match ctx.store.read(&path) {
            Ok(doc) => Some(doc.get("plot").unwrap_or_default().to_string()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable sidecar, classified without it");
                unreadable.set(unreadable.get() + 1);
                None
            }
        }
    });
    report.unreadable_sidecars = unreadable.get();
    info!(
        valid = report.valid.len(),
        obsolete = report.obsolete_original.len(),
        missing = report.missing_metadata.len(),
        unparseable = report.unparseable.len(),
        excluded = report.excluded,
        unreadable = report.unreadable_sidecars,
        "classification finished"
    );

    let rendered = if opts.json {
        render_json(&report)?
    } else {
        render_text(&report)
    };
    Ok((report, rendered))
}

fn paths(files: &[LibraryFile]) -> Vec<&PathBuf> {
    files.iter().map(|f| &f.path).collect()
}

fn render_json(report: &ClassificationReport) -> Result<String> {
    let json = JsonReport {
        valid: report.valid.len(),
        obsolete_original: paths(&report.obsolete_original),
        missing_metadata: paths(&report.missing_metadata),
        unparseable: paths(&report.unparseable),
        excluded: report.excluded,
        unreadable_sidecars: report.unreadable_sidecars,
    };
    serde_json::to_string_pretty(&json).context("failed to serialize report")
}

pub fn render_text(report: &ClassificationReport) -> String {
    let mut out = String::new();
    let sections = [
        ("Obsolete originals (replaced by a condensed episode)", &report.obsolete_original),
        ("Missing metadata", &report.missing_metadata),
        ("Unparseable filenames", &report.unparseable),
    ];
    for (heading, files) in sections {
        if files.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{heading}:");
        for file in files {
            let _ = writeln!(out, "  {}", file.path.display());
        }
    }
    if report.unreadable_sidecars > 0 {
        let _ = writeln!(out, "{} sidecar(s) could not be read", report.unreadable_sidecars);
    }
    let _ = writeln!(
        out,
        "{} valid, {} obsolete, {} missing metadata, {} unparseable, {} excluded",
        report.valid.len(),
        report.obsolete_original.len(),
        report.missing_metadata.len(),
        report.unparseable.len(),
        report.excluded
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacesync_core::types::{EpisodeIdentity, FileFormat};

    fn file(path: &str) -> LibraryFile {
        LibraryFile {
            path: PathBuf::from(path),
            filename: path.rsplit('/').next().unwrap_or(path).to_string(),
            format: FileFormat::Unrecognized,
            identity: Some(EpisodeIdentity {
                season: Some(35),
                original_number: Some(1010),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn text_report_lists_problem_files() {
        let report = ClassificationReport {
            obsolete_original: vec![file("/lib/Season 35/Episode 1010.mkv")],
            excluded: 2,
            ..Default::default()
        };
        let text = render_text(&report);
        assert!(text.contains("Obsolete originals"));
        assert!(text.contains("/lib/Season 35/Episode 1010.mkv"));
        assert!(!text.contains("Missing metadata:"));
        assert!(text.ends_with("0 valid, 1 obsolete, 0 missing metadata, 0 unparseable, 2 excluded\n"));
    }

    #[test]
    fn json_report_carries_paths() {
        let report = ClassificationReport {
            missing_metadata: vec![file("/lib/Season 35/Episode 1011.mkv")],
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
        assert_eq!(value["missing_metadata"][0], "/lib/Season 35/Episode 1011.mkv");
        assert_eq!(value["valid"], 0);
        assert_eq!(value["unreadable_sidecars"], 0);
    }

    #[test]
    fn text_report_mentions_unreadable_sidecars() {
        let report = ClassificationReport {
            unreadable_sidecars: 1,
            ..Default::default()
        };
        assert!(render_text(&report).contains("1 sidecar(s) could not be read"));
    }
}
