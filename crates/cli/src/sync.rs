//! Sync mode: copy show-level sidecars from the repository into the
//! library and give library videos their canonical names.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pacesync_core::error::PipelineError;
use pacesync_core::types::{FileFormat, IdentityKey, season_dir_name};
use pacesync_scanner::walk::{MediaEntry, walk_media_dir, walk_sidecars};
use pacesync_sidecar::{SidecarName, episode_filename, parse_sidecar_filename, repair_season, xml};
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::fsops::copy_if_different;
use crate::summary::{Outcome, Summary};

const POSTER_EXTENSIONS: &[&str] = &["png", "jpg"];

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Copy the sidecar next to each video instead of renaming the video.
    pub keep_original: bool,
}

/// Repository sidecars by `(season, episode, has_variant)`.
#[derive(Debug, Default)]
pub struct RepositoryIndex {
    by_key: HashMap<IdentityKey, (SidecarName, PathBuf)>,
}

impl RepositoryIndex {
    pub fn build(paths: &[PathBuf]) -> Self {
        let mut by_key = HashMap::new();
        for path in paths {
            let Some(name) = path
                .file_name()
                .and_then(|n| parse_sidecar_filename(&n.to_string_lossy()))
            else {
                debug!(path = %path.display(), "sidecar name not canonical, not indexed");
                continue;
            };
            let key = IdentityKey::new(name.season, name.episode, !name.variant.is_empty());
            by_key.insert(key, (name, path.clone()));
        }
        Self { by_key }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// The record for `key`, or the variant cut when the base is missing.
    pub fn find(&self, key: IdentityKey) -> Option<&(SidecarName, PathBuf)> {
        self.by_key.get(&key).or_else(|| {
            self.by_key.get(&IdentityKey {
                key: key.key,
                has_variant: true,
            })
        })
    }
}

pub fn run(ctx: &mut RunContext, opts: &SyncOptions) -> Result<Summary> {
    let library = ctx.config.library_root()?.to_path_buf();
    let repository = ctx.config.repository_path.clone();
    let index = RepositoryIndex::build(&walk_sidecars(&repository, true));
    info!(records = index.len(), repository = %repository.display(), "indexed repository");

    let mut summary = Summary::default();
    sync_show_files(ctx, &library, &repository, &mut summary)?;

    let walk = ctx.config.walk_options(false);
    let mut seen = BTreeSet::new();
    let seasons: Vec<(String, u32)> = ctx
        .parser
        .taxonomy()
        .iter()
        .filter(|(_, season)| seen.insert(*season))
        .map(|(arc, season)| (arc.to_string(), season))
        .collect();

    'seasons: for (arc, season) in seasons {
        let folder = library_season_dir(ctx, &library, season, &arc);
        if !ctx.fs.exists(&folder) {
            debug!(season, folder = %folder.display(), "season not in library");
            continue;
        }
        sync_season_sidecar(ctx, &repository, &folder, season, &arc, &mut summary);

        for entry in walk_media_dir(&folder, &walk) {
            let result = sync_video(ctx, &index, &entry, opts);
            if !summary.record(&entry.filename, result) {
                break 'seasons;
            }
        }
    }
    summary.log("sync");
    Ok(summary)
}

/// A library folder whose name mentions the arc, else `Season N`.
fn library_season_dir(ctx: &RunContext, library: &Path, season: u32, arc: &str) -> PathBuf {
    let standard = library.join(season_dir_name(season));
    if ctx.fs.exists(&standard) {
        return standard;
    }
    let needle = arc.to_lowercase();
    ctx.fs
        .list(library)
        .unwrap_or_default()
        .into_iter()
        .find(|p| {
            p.is_dir()
                && p.file_name()
                    .is_some_and(|n| n.to_string_lossy().to_lowercase().contains(&needle))
        })
        .unwrap_or(standard)
}

fn sync_show_files(
    ctx: &RunContext,
    library: &Path,
    repository: &Path,
    summary: &mut Summary,
) -> Result<()> {
    let show = repository.join("tvshow.nfo");
    if ctx.fs.exists(&show) {
        copy_counted(ctx, &show, &library.join("tvshow.nfo"), summary);
    }

    let entries = ctx
        .fs
        .list(repository)
        .with_context(|| format!("cannot list repository {}", repository.display()))?;
    for poster in entries.iter().filter(|p| is_poster(p)) {
        if let Some(name) = poster.file_name() {
            copy_counted(ctx, poster, &library.join(name), summary);
        }
    }
    Ok(())
}

fn is_poster(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| POSTER_EXTENSIONS.contains(&e.as_str()))
}

fn copy_counted(ctx: &RunContext, from: &Path, to: &Path, summary: &mut Summary) {
    match copy_if_different(ctx.fs.as_ref(), from, to) {
        Ok(true) => {
            info!(from = %from.display(), to = %to.display(), "copied");
            summary.processed += 1;
            summary.updated += 1;
        }
        Ok(false) => {
            summary.processed += 1;
            summary.unchanged += 1;
        }
        Err(e) => {
            warn!(from = %from.display(), to = %to.display(), error = %e, "copy failed");
            summary.fail("copy_failed");
        }
    }
}

/// Repair the repository's `season.nfo` in place, then mirror it.
fn sync_season_sidecar(
    ctx: &RunContext,
    repository: &Path,
    folder: &Path,
    season: u32,
    arc: &str,
    summary: &mut Summary,
) {
    let source = repository.join(season_dir_name(season)).join("season.nfo");
    if !ctx.fs.exists(&source) {
        debug!(season, "no season sidecar in repository");
        return;
    }
    match ctx.store.read(&source) {
        Ok(doc) => {
            let (repaired, changed) = repair_season(&doc, season, arc);
            if changed {
                if let Err(e) = ctx.fs.write(&source, xml::render(&repaired).as_bytes()) {
                    warn!(path = %source.display(), error = %e, "cannot repair season sidecar");
                    summary.fail("sidecar_write_failure");
                    return;
                }
                info!(season, path = %source.display(), "season sidecar repaired");
            }
        }
        Err(e) => {
            warn!(path = %source.display(), error = %e, "unreadable season sidecar");
            summary.fail("unreadable_sidecar");
            return;
        }
    }
    copy_counted(ctx, &source, &folder.join("season.nfo"), summary);
}

fn sync_video(
    ctx: &mut RunContext,
    index: &RepositoryIndex,
    entry: &MediaEntry,
    opts: &SyncOptions,
) -> Result<Outcome, PipelineError> {
    let (format, identity) = ctx.parser.parse_with_format(&entry.filename, None);
    // Only legacy names and exception-mapped files are renamed.
    let eligible = match format {
        FileFormat::LegacyBracket => true,
        FileFormat::Unrecognized => identity.key().is_some(),
        FileFormat::Plex => false,
    };
    if !eligible {
        return Ok(Outcome::Skipped("not_legacy"));
    }
    let Some(key) = identity.identity_key() else {
        return Err(PipelineError::UnresolvableIdentity {
            filename: entry.filename.clone(),
            detail: format!("arc {:?} not in taxonomy", identity.arc_name),
        });
    };
    if key.key.season == 0 {
        return Ok(Outcome::Skipped("specials"));
    }
    let Some((name, sidecar)) = index.find(key) else {
        warn!(file = %entry.filename, key = %key.key, "episode found but metadata is missing");
        return Ok(Outcome::Skipped("missing_metadata"));
    };

    if opts.keep_original {
        let target = entry.path.with_extension("nfo");
        return match copy_if_different(ctx.fs.as_ref(), sidecar, &target) {
            Ok(true) => {
                info!(file = %entry.filename, sidecar = %target.display(), "sidecar placed");
                Ok(Outcome::Updated)
            }
            Ok(false) => Ok(Outcome::Unchanged),
            Err(e) => Err(write_failure(&target, e)),
        };
    }

    let ext = entry
        .path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mkv".to_string());
    let new_name = episode_filename(
        &ctx.config.show_title,
        name.season,
        name.episode,
        &name.display_title(),
        &ext,
    );
    if new_name == entry.filename {
        return Ok(Outcome::Unchanged);
    }
    let target = entry.path.with_file_name(&new_name);
    if ctx.fs.exists(&target) {
        let question = format!("{new_name} already exists. Overwrite existing file?");
        if !ctx.gate.allow_destructive(&question)? {
            return Ok(Outcome::Skipped("overwrite_declined"));
        }
    }
    ctx.fs
        .rename(&entry.path, &target)
        .map_err(|e| write_failure(&target, e))?;
    info!(from = %entry.filename, to = %new_name, "renamed");
    Ok(Outcome::Updated)
}

fn write_failure(path: &Path, e: std::io::Error) -> PipelineError {
    PipelineError::SidecarWriteFailure {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}
