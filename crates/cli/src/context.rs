//! Collaborators shared by every mode, built once at startup.

use anyhow::Result;
use pacesync_metadata::{Answerer, MetadataSource, MetadataTables, NonInteractive, RunState};
use pacesync_scanner::{Ffprobe, FilenameParser, MediaProber, NoProbe};
use pacesync_sidecar::{FsSidecarStore, SidecarStore};
use tracing::info;

use crate::config::AppConfig;
use crate::fsops::{DryRunFs, Filesystem, LocalFs};
use crate::prompt::{AutoConfirm, Confirmation, ConfirmGate, Confirmer, TerminalPrompter};

/// Flags that apply to every mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunFlags {
    pub dry_run: bool,
    pub force: bool,
    /// Ask on the terminal; otherwise prompts become per-file errors.
    pub interactive: bool,
}

pub struct RunContext {
    pub config: AppConfig,
    pub flags: RunFlags,
    pub fs: Box<dyn Filesystem>,
    pub store: Box<dyn SidecarStore>,
    pub parser: FilenameParser,
    pub prober: Box<dyn MediaProber>,
    pub source: Box<dyn MetadataSource>,
    pub answerer: Box<dyn Answerer>,
    pub gate: ConfirmGate,
    pub state: RunState,
}

impl RunContext {
    /// Wire up the real collaborators from `config`.
    pub fn from_config(config: AppConfig, flags: RunFlags) -> Result<Self> {
        let source = Box::new(config.sheets_source()?);
        let prober: Box<dyn MediaProber> = if config.probe_media {
            Box::new(Ffprobe::new(config.ffprobe_path.clone()))
        } else {
            Box::new(NoProbe)
        };
        let (answerer, confirmer): (Box<dyn Answerer>, Box<dyn Confirmer>) = if flags.interactive {
            (Box::new(TerminalPrompter), Box::new(TerminalPrompter))
        } else {
            (Box::new(NonInteractive), Box::new(AutoConfirm(Confirmation::No)))
        };
        Self::with_parts(config, flags, prober, source, answerer, confirmer)
    }

    /// Assemble a context from explicit collaborators. The filesystem and
    /// parser still follow `config` and `flags`.
    pub fn with_parts(
        config: AppConfig,
        flags: RunFlags,
        prober: Box<dyn MediaProber>,
        source: Box<dyn MetadataSource>,
        answerer: Box<dyn Answerer>,
        confirmer: Box<dyn Confirmer>,
    ) -> Result<Self> {
        let parser = FilenameParser::new(
            config.load_taxonomy()?,
            config.load_exceptions()?,
            config.provisional_range(),
        );
        info!(
            matchers = ?parser.matcher_names(),
            arcs = parser.taxonomy().len(),
            dry_run = flags.dry_run,
            "run context ready"
        );
        let fs: Box<dyn Filesystem> = if flags.dry_run {
            Box::new(DryRunFs)
        } else {
            Box::new(LocalFs)
        };
        let state = RunState::new(config.title_policy);
        Ok(Self {
            gate: ConfirmGate::new(flags.force, confirmer),
            config,
            flags,
            fs,
            store: Box::new(FsSidecarStore),
            parser,
            prober,
            source,
            answerer,
            state,
        })
    }

    /// Pull both feeds and build the lookup tables. Failure is fatal.
    pub fn load_tables(&self) -> Result<MetadataTables> {
        let tables = MetadataTables::load(self.source.as_ref(), self.parser.taxonomy())?;
        info!(
            source = self.source.name(),
            titles = tables.title_count(),
            "metadata tables loaded"
        );
        Ok(tables)
    }
}
