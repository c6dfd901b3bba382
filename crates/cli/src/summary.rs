use std::collections::BTreeMap;
use std::fmt;

use pacesync_core::error::PipelineError;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// End-of-run counts. Every skip and failure is recorded with a reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub processed: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub reasons: BTreeMap<String, usize>,
    pub cancelled: bool,
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// New sidecars written.
    Imported,
    /// Existing files rewritten or renamed.
    Updated,
    Unchanged,
    Skipped(&'static str),
}

impl Summary {
    /// Fold in one file's result. Returns `false` once the run must stop.
    pub fn record(&mut self, file: &str, result: Result<Outcome, PipelineError>) -> bool {
        match result {
            Ok(Outcome::Imported) => self.processed += 1,
            Ok(Outcome::Updated) => {
                self.processed += 1;
                self.updated += 1;
            }
            Ok(Outcome::Unchanged) => {
                self.processed += 1;
                self.unchanged += 1;
            }
            Ok(Outcome::Skipped(reason)) => {
                debug!(file, reason, "skipped");
                self.skip(reason);
            }
            Err(PipelineError::Cancelled) => {
                warn!(file, "cancelled, stopping");
                self.cancelled = true;
                return false;
            }
            Err(err) if err.is_fatal() => {
                error!(file, error = %err, "fatal error, stopping");
                self.fail(err.code());
                return false;
            }
            Err(err) => self.record_error(file, &err),
        }
        true
    }

    pub fn skip(&mut self, reason: &str) {
        self.skipped += 1;
        *self.reasons.entry(reason.to_string()).or_default() += 1;
    }

    /// Count a per-file pipeline error as a skip or a failure.
    pub fn record_error(&mut self, file: &str, err: &PipelineError) {
        match err {
            PipelineError::SidecarWriteFailure { .. } => {
                warn!(file, error = %err, "episode failed");
                self.failed += 1;
                *self.reasons.entry(err.code().to_string()).or_default() += 1;
            }
            _ => {
                warn!(file, code = err.code(), error = %err, "skipping");
                self.skip(err.code());
            }
        }
    }

    pub fn fail(&mut self, reason: &str) {
        self.failed += 1;
        *self.reasons.entry(reason.to_string()).or_default() += 1;
    }

    pub fn log(&self, mode: &str) {
        info!(
            mode,
            processed = self.processed,
            updated = self.updated,
            unchanged = self.unchanged,
            skipped = self.skipped,
            failed = self.failed,
            cancelled = self.cancelled,
            "run finished"
        );
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  processed: {}", self.processed)?;
        writeln!(f, "  updated:   {}", self.updated)?;
        writeln!(f, "  unchanged: {}", self.unchanged)?;
        writeln!(f, "  skipped:   {}", self.skipped)?;
        writeln!(f, "  failed:    {}", self.failed)?;
        for (reason, count) in &self.reasons {
            writeln!(f, "    {reason}: {count}")?;
        }
        if self.cancelled {
            writeln!(f, "  (cancelled)")?;
        }
        Ok(())
    }
}
