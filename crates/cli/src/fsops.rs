//! Filesystem collaborator and per-episode write batches.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pacesync_core::error::PipelineError;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

pub trait Filesystem {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn delete(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
    /// Entries directly inside `dir`, sorted.
    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        ensure_parent(to)?;
        fs::copy(from, to).map(|_| ())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        ensure_parent(to)?;
        fs::rename(from, to)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(dir)?
            .map(|e| e.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        ensure_parent(path)?;
        fs::write(path, contents)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// Reads pass through; every mutation is logged and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunFs;

impl Filesystem for DryRunFs {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        info!(from = %from.display(), to = %to.display(), "dry run: would copy");
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        info!(from = %from.display(), to = %to.display(), "dry run: would rename");
        Ok(())
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        info!(path = %path.display(), "dry run: would delete");
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        LocalFs.exists(path)
    }

    fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        LocalFs.list(dir)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        info!(path = %path.display(), bytes = contents.len(), "dry run: would write");
        Ok(())
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        LocalFs.read(path)
    }
}

pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Copy unless `to` already holds identical bytes. Returns whether a copy
/// was made.
pub fn copy_if_different(fs: &dyn Filesystem, from: &Path, to: &Path) -> io::Result<bool> {
    let source = fs.read(from)?;
    if fs.exists(to) {
        match fs.read(to) {
            Ok(existing) if digest(&existing) == digest(&source) => {
                debug!(path = %to.display(), "unchanged");
                return Ok(false);
            }
            Ok(_) => {}
            Err(e) => warn!(path = %to.display(), error = %e, "cannot compare, copying"),
        }
    }
    fs.copy(from, to)?;
    debug!(from = %from.display(), to = %to.display(), "copied");
    Ok(true)
}

/// Files created for one episode. If any step fails, everything written so
/// far is deleted again.
pub struct Batch<'a> {
    fs: &'a dyn Filesystem,
    written: Vec<PathBuf>,
}

impl<'a> Batch<'a> {
    fn failure(path: &Path, e: io::Error) -> PipelineError {
        PipelineError::SidecarWriteFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }

    pub fn copy(&mut self, from: &Path, to: &Path) -> Result<(), PipelineError> {
        self.fs.copy(from, to).map_err(|e| Self::failure(to, e))?;
        self.written.push(to.to_path_buf());
        Ok(())
    }

    pub fn write(&mut self, path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
        self.fs
            .write(path, contents)
            .map_err(|e| Self::failure(path, e))?;
        self.written.push(path.to_path_buf());
        Ok(())
    }

    fn rollback(&mut self) {
        for path in self.written.drain(..).rev() {
            match self.fs.delete(&path) {
                Ok(()) => info!(path = %path.display(), "rolled back"),
                Err(e) => warn!(path = %path.display(), error = %e, "rollback failed"),
            }
        }
    }

    /// Run `op` as one all-or-nothing batch. Returns the written paths.
    pub fn run<F>(fs: &'a dyn Filesystem, op: F) -> Result<Vec<PathBuf>, PipelineError>
    where
        F: FnOnce(&mut Batch<'a>) -> Result<(), PipelineError>,
    {
        let mut batch = Batch {
            fs,
            written: Vec::new(),
        };
        match op(&mut batch) {
            Ok(()) => Ok(batch.written),
            Err(e) => {
                batch.rollback();
                Err(e)
            }
        }
    }
}
