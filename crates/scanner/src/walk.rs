use std::path::{Path, PathBuf};
use tracing::debug;

use crate::parser;

/// Entry discovered during a filesystem walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub path: PathBuf,
    pub filename: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub recursive: bool,
    /// Lowercase video extensions without the dot.
    pub extensions: Vec<String>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: vec!["mkv".into(), "mp4".into()],
        }
    }
}

/// Season and show sidecars share the extension but are not episodes.
pub const NON_EPISODE_SIDECARS: &[&str] = &["season.nfo", "tvshow.nfo"];

/// Version-control marker directories.
pub fn is_vcs_dir(name: &str) -> bool {
    matches!(name, ".git" | ".svn" | ".hg")
}

/// Whether any component of `path` is a version-control directory.
pub fn under_vcs_dir(path: &Path) -> bool {
    path.components()
        .any(|c| is_vcs_dir(&c.as_os_str().to_string_lossy()))
}

/// Collect video files under `root`, sorted by path.
pub fn walk_media_dir(root: &Path, opts: &WalkOptions) -> Vec<MediaEntry> {
    let mut entries = Vec::new();
    walk_recursive(root, opts.recursive, &mut |path, name| {
        if !parser::has_extension(name, &opts.extensions) {
            return;
        }
        let Ok(metadata) = std::fs::metadata(path) else {
            return;
        };
        entries.push(MediaEntry {
            path: path.to_path_buf(),
            filename: name.to_string(),
            size_bytes: metadata.len(),
        });
    });
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

/// Collect per-episode sidecars under `root`, sorted by path.
pub fn walk_sidecars(root: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk_recursive(root, recursive, &mut |path, name| {
        let lower = name.to_lowercase();
        if lower.ends_with(".nfo") && !NON_EPISODE_SIDECARS.contains(&lower.as_str()) {
            found.push(path.to_path_buf());
        }
    });
    found.sort();
    found
}

fn walk_recursive(dir: &Path, recursive: bool, visit: &mut dyn FnMut(&Path, &str)) {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };

    for entry in read_dir.flatten() {
        let path = entry.path();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if path.is_dir() {
            if is_vcs_dir(&name) || name.starts_with('.') {
                debug!(path = %path.display(), "skipping directory");
                continue;
            }
            if recursive {
                walk_recursive(&path, recursive, visit);
            }
        } else if !name.starts_with('.') {
            visit(&path, &name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn recursive_walk_skips_vcs_dirs() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Season 1/a.mkv"));
        touch(&dir.path().join("Season 1/a.nfo"));
        touch(&dir.path().join(".git/objects/b.mkv"));
        touch(&dir.path().join("c.MP4"));
        touch(&dir.path().join("d.avi"));

        let opts = WalkOptions {
            recursive: true,
            ..Default::default()
        };
        let names: Vec<_> = walk_media_dir(dir.path(), &opts)
            .into_iter()
            .map(|e| e.filename)
            .collect();
        assert_eq!(names, ["a.mkv", "c.MP4"]);
    }

    #[test]
    fn flat_walk_stays_in_root() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("Season 1/a.mkv"));
        touch(&dir.path().join("b.mkv"));
        let found = walk_media_dir(dir.path(), &WalkOptions::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].filename, "b.mkv");
    }

    #[test]
    fn sidecar_walk_ignores_season_and_show_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("tvshow.nfo"));
        touch(&dir.path().join("Season 2/season.nfo"));
        touch(&dir.path().join("Season 2/One Pace - S02E01 - X.nfo"));
        let found = walk_sidecars(dir.path(), true);
        assert_eq!(found, [dir.path().join("Season 2/One Pace - S02E01 - X.nfo")]);
    }

    #[test]
    fn vcs_detection() {
        assert!(under_vcs_dir(Path::new("/lib/.git/a.mkv")));
        assert!(!under_vcs_dir(Path::new("/lib/Season 1/a.mkv")));
    }
}
