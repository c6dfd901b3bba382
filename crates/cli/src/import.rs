//! Import mode: resolve new video files, file them into the library and
//! write their sidecars to both trees.

use std::path::{Path, PathBuf};

use anyhow::Result;
use pacesync_core::error::PipelineError;
use pacesync_core::types::{LibraryFile, season_dir_name};
use pacesync_metadata::{MetadataTables, Resolver};
use pacesync_scanner::scan_library;
use pacesync_sidecar::{build_episode, episode_stem, xml};
use tracing::{info, warn};

use crate::context::RunContext;
use crate::fsops::Batch;
use crate::summary::{Outcome, Summary};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Folder holding the downloaded videos.
    pub directory: PathBuf,
    pub recursive: bool,
    /// Offer to delete each source video once it has been filed.
    pub delete_processed: bool,
}

/// Where one resolved episode ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Targets {
    video: PathBuf,
    library_sidecar: PathBuf,
    repository_sidecar: PathBuf,
}

impl Targets {
    fn new(library: &Path, repository: &Path, season: u32, stem: &str, ext: &str) -> Self {
        let dir = season_dir_name(season);
        Self {
            video: library.join(&dir).join(format!("{stem}.{ext}")),
            library_sidecar: library.join(&dir).join(format!("{stem}.nfo")),
            repository_sidecar: repository.join(&dir).join(format!("{stem}.nfo")),
        }
    }

    fn all(&self) -> [&Path; 3] {
        [&self.video, &self.library_sidecar, &self.repository_sidecar]
    }
}

pub fn run(ctx: &mut RunContext, opts: &ImportOptions) -> Result<Summary> {
    let tables = ctx.load_tables()?;
    let library = ctx.config.library_root()?.to_path_buf();
    let repository = ctx.config.repository_path.clone();

    let files = scan_library(
        &opts.directory,
        &ctx.config.walk_options(opts.recursive),
        &ctx.parser,
        ctx.prober.as_ref(),
    );
    info!(dir = %opts.directory.display(), count = files.len(), "found video files");

    let mut summary = Summary::default();
    for file in &files {
        let result = import_one(ctx, &tables, file, &library, &repository, opts);
        if !summary.record(&file.filename, result) {
            break;
        }
    }
    summary.log("import");
    Ok(summary)
}

fn import_one(
    ctx: &mut RunContext,
    tables: &MetadataTables,
    file: &LibraryFile,
    library: &Path,
    repository: &Path,
    opts: &ImportOptions,
) -> Result<Outcome, PipelineError> {
    let Some(identity) = &file.identity else {
        return Err(PipelineError::ParseFailure {
            filename: file.filename.clone(),
        });
    };
    if identity.season == Some(0) {
        return Ok(Outcome::Skipped("specials"));
    }

    let resolver = Resolver::new(ctx.parser.taxonomy(), tables);
    let episode = resolver.resolve_with(
        identity,
        &file.filename,
        &mut ctx.state,
        ctx.answerer.as_mut(),
    )?;
    if episode.season == 0 {
        return Ok(Outcome::Skipped("specials"));
    }

    let stem = episode_stem(
        &ctx.config.show_title,
        episode.season,
        episode.episode,
        &episode.display_title(),
    );
    let ext = file
        .path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "mkv".to_string());
    let targets = Targets::new(library, repository, episode.season, &stem, &ext);
    let copy_video = targets.video != file.path;

    let existing: Vec<&Path> = targets
        .all()
        .into_iter()
        .filter(|p| *p != file.path && ctx.fs.exists(p))
        .collect();
    if !existing.is_empty() {
        let names: Vec<String> = existing.iter().map(|p| p.display().to_string()).collect();
        let question = format!("Overwrite existing {}?", names.join(", "));
        if !ctx.gate.allow_destructive(&question)? {
            return Ok(Outcome::Skipped("overwrite_declined"));
        }
    }

    let sidecar = xml::render(&build_episode(&episode, &ctx.config.show_title));
    Batch::run(ctx.fs.as_ref(), |batch| {
        if copy_video {
            batch.copy(&file.path, &targets.video)?;
        }
        batch.write(&targets.library_sidecar, sidecar.as_bytes())?;
        batch.write(&targets.repository_sidecar, sidecar.as_bytes())
    })?;
    info!(
        file = %file.filename,
        key = %episode.key(),
        target = %targets.video.display(),
        "imported"
    );

    if opts.delete_processed && copy_video {
        let question = format!("Delete processed file {}?", file.filename);
        if ctx.gate.allow(&question)? {
            if let Err(e) = ctx.fs.delete(&file.path) {
                warn!(file = %file.filename, error = %e, "could not delete processed file");
            }
        }
    }
    Ok(Outcome::Imported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_follow_season_folders() {
        let t = Targets::new(
            Path::new("/lib"),
            Path::new("/repo/One Pace"),
            12,
            "One Pace - S12E05 - The Kingdom of Sand",
            "mkv",
        );
        assert_eq!(
            t.video,
            PathBuf::from("/lib/Season 12/One Pace - S12E05 - The Kingdom of Sand.mkv")
        );
        assert_eq!(
            t.library_sidecar,
            PathBuf::from("/lib/Season 12/One Pace - S12E05 - The Kingdom of Sand.nfo")
        );
        assert_eq!(
            t.repository_sidecar,
            PathBuf::from("/repo/One Pace/Season 12/One Pace - S12E05 - The Kingdom of Sand.nfo")
        );
    }
}
