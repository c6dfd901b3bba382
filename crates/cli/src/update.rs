//! Update-repo mode: rebuild every canonical sidecar in the repository from
//! fresh metadata and rewrite or rename the ones that drifted.

use std::path::{Path, PathBuf};

use anyhow::Result;
use pacesync_core::ReleaseDate;
use pacesync_core::coverage;
use pacesync_core::error::PipelineError;
use pacesync_core::types::{EpisodeIdentity, EpisodeKey};
use pacesync_metadata::{MetadataTables, Resolver};
use pacesync_scanner::walk::walk_sidecars;
use pacesync_sidecar::{build_episode, episode_filename, parse_sidecar_filename, reconcile, xml};
use tracing::{debug, info};

use crate::context::RunContext;
use crate::summary::{Outcome, Summary};

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Repository subtree to refresh; the whole repository when unset.
    pub directory: Option<PathBuf>,
    pub recursive: bool,
}

pub fn run(ctx: &mut RunContext, opts: &UpdateOptions) -> Result<Summary> {
    let tables = ctx.load_tables()?;
    let root = opts
        .directory
        .clone()
        .unwrap_or_else(|| ctx.config.repository_path.clone());

    let sidecars = walk_sidecars(&root, opts.recursive);
    info!(dir = %root.display(), count = sidecars.len(), "found repository sidecars");

    let mut summary = Summary::default();
    for path in &sidecars {
        let name = file_name(path);
        let result = update_one(ctx, &tables, path, &name);
        if !summary.record(&name, result) {
            break;
        }
    }
    summary.log("update-repo");
    Ok(summary)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn update_one(
    ctx: &mut RunContext,
    tables: &MetadataTables,
    path: &Path,
    filename: &str,
) -> Result<Outcome, PipelineError> {
    let existing = ctx
        .store
        .read(path)
        .map_err(|e| e.into_write_failure(path))?;
    let plot = existing.get("plot").unwrap_or_default();
    if !coverage::has_canonical_marker(plot) {
        debug!(file = filename, "not a condensed episode, leaving alone");
        return Ok(Outcome::Skipped("original_episode"));
    }
    let Some(name) = parse_sidecar_filename(filename) else {
        return Err(PipelineError::ParseFailure {
            filename: filename.to_string(),
        });
    };
    if name.season == 0 {
        return Ok(Outcome::Skipped("specials"));
    }

    // Keep the date already on record when the guide has none.
    if let Some(date) = existing.get("premiered").and_then(ReleaseDate::parse) {
        ctx.state
            .remember_date(EpisodeKey::new(name.season, name.episode), date);
    }
    let identity = EpisodeIdentity {
        season: Some(name.season),
        episode: Some(name.episode),
        title: Some(name.title.clone()),
        variant: name.variant.clone(),
        ..Default::default()
    };

    let resolver = Resolver::new(ctx.parser.taxonomy(), tables);
    let episode = resolver.resolve_with(&identity, filename, &mut ctx.state, ctx.answerer.as_mut())?;
    let built = build_episode(&episode, &ctx.config.show_title);
    let expected = episode_filename(
        &ctx.config.show_title,
        episode.season,
        episode.episode,
        &episode.display_title(),
        "nfo",
    );
    let outcome = reconcile(&existing, &built, filename, &expected);
    if !outcome.needs_write() && !outcome.rename_needed {
        debug!(file = filename, "up to date");
        return Ok(Outcome::Unchanged);
    }

    let question = if outcome.rename_needed {
        format!("Update {filename} and rename to {expected}?")
    } else {
        format!("Update {filename}?")
    };
    if !ctx.gate.allow(&question)? {
        return Ok(Outcome::Skipped("declined"));
    }

    let target = path.with_file_name(&expected);
    if outcome.rename_needed && ctx.fs.exists(&target) {
        let question = format!("{expected} already exists. Overwrite existing file?");
        if !ctx.gate.allow_destructive(&question)? {
            return Ok(Outcome::Skipped("overwrite_declined"));
        }
    }

    let write_failure = |p: &Path, e: std::io::Error| PipelineError::SidecarWriteFailure {
        path: p.to_path_buf(),
        reason: e.to_string(),
    };
    if outcome.needs_write() {
        ctx.fs
            .write(path, xml::render(&built).as_bytes())
            .map_err(|e| write_failure(path, e))?;
    }
    if outcome.rename_needed {
        ctx.fs
            .rename(path, &target)
            .map_err(|e| write_failure(&target, e))?;
    }
    info!(
        file = filename,
        content_changed = outcome.content_changed,
        repairs = outcome.repairs.len(),
        renamed = outcome.rename_needed,
        "sidecar updated"
    );
    Ok(Outcome::Updated)
}
