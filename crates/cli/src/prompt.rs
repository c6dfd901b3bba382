//! Interactive answers on the terminal, plus yes/no/all confirmations.

use std::collections::VecDeque;

use dialoguer::console::Term;
use dialoguer::{Input, Select};
use pacesync_core::ReleaseDate;
use pacesync_core::error::PipelineError;
use pacesync_metadata::{Answer, Answerer, Prompt};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    /// Yes, and stop asking for the rest of the run.
    All,
}

pub trait Confirmer {
    fn confirm(&mut self, question: &str) -> Result<Confirmation, PipelineError>;
}

/// Always gives the same answer.
pub struct AutoConfirm(pub Confirmation);

impl Confirmer for AutoConfirm {
    fn confirm(&mut self, question: &str) -> Result<Confirmation, PipelineError> {
        info!(question, answer = ?self.0, "auto-confirm");
        Ok(self.0)
    }
}

/// Queued confirmations; an exhausted queue answers `No`.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    queue: VecDeque<Confirmation>,
    pub asked: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = Confirmation>) -> Self {
        Self {
            queue: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }
}

impl Confirmer for ScriptedConfirm {
    fn confirm(&mut self, question: &str) -> Result<Confirmation, PipelineError> {
        self.asked.push(question.to_string());
        Ok(self.queue.pop_front().unwrap_or(Confirmation::No))
    }
}

/// Confirmation with the sticky "all" answer and `--force` folded in.
pub struct ConfirmGate {
    force: bool,
    confirmer: Box<dyn Confirmer>,
}

impl ConfirmGate {
    pub fn new(force: bool, confirmer: Box<dyn Confirmer>) -> Self {
        Self { force, confirmer }
    }

    pub fn is_forced(&self) -> bool {
        self.force
    }

    pub fn allow(&mut self, question: &str) -> Result<bool, PipelineError> {
        if self.force {
            return Ok(true);
        }
        Ok(match self.confirmer.confirm(question)? {
            Confirmation::Yes => true,
            Confirmation::No => false,
            Confirmation::All => {
                self.force = true;
                true
            }
        })
    }

    /// Ask even under `--force`; for destructive overwrites.
    pub fn allow_destructive(&mut self, question: &str) -> Result<bool, PipelineError> {
        Ok(matches!(
            self.confirmer.confirm(question)?,
            Confirmation::Yes | Confirmation::All
        ))
    }
}

/// Prompts on stderr with dialoguer.
pub struct TerminalPrompter;

fn terminal_error(e: dialoguer::Error) -> PipelineError {
    PipelineError::InvalidAnswer(format!("terminal: {e}"))
}

impl Answerer for TerminalPrompter {
    fn answer(&mut self, prompt: &Prompt) -> Result<Answer, PipelineError> {
        let term = Term::stderr();
        match prompt {
            Prompt::TitleConflict {
                key,
                filename,
                source_title,
                media_title,
            } => {
                let items = [
                    format!("Use source title: {source_title}"),
                    format!("Use media title: {media_title}"),
                    "Always use source titles".to_string(),
                    "Always use media titles".to_string(),
                    "Quit".to_string(),
                ];
                let choice = Select::new()
                    .with_prompt(format!("Title conflict for {} ({filename})", key.key))
                    .items(&items)
                    .default(0)
                    .interact_on(&term)
                    .map_err(terminal_error)?;
                Ok(match choice {
                    0 => Answer::UseSource,
                    1 => Answer::UseMedia,
                    2 => Answer::AlwaysSource,
                    3 => Answer::AlwaysMedia,
                    _ => Answer::Quit,
                })
            }
            Prompt::MissingDate { key, filename, title } => {
                let text: String = Input::new()
                    .with_prompt(format!(
                        "Release date for {} {title} ({filename}) as YYYY-MM-DD, empty to quit",
                        key.key
                    ))
                    .allow_empty(true)
                    .validate_with(|s: &String| -> Result<(), &str> {
                        if s.trim().is_empty() || ReleaseDate::parse(s).is_some() {
                            Ok(())
                        } else {
                            Err("expected YYYY-MM-DD")
                        }
                    })
                    .interact_text_on(&term)
                    .map_err(terminal_error)?;
                Ok(ReleaseDate::parse(&text).map_or(Answer::Quit, Answer::Date))
            }
            Prompt::MissingTitle { key, filename } => {
                let text: String = Input::new()
                    .with_prompt(format!("Title for {} ({filename}), empty to quit", key.key))
                    .allow_empty(true)
                    .interact_text_on(&term)
                    .map_err(terminal_error)?;
                let text = text.trim();
                Ok(if text.is_empty() {
                    Answer::Quit
                } else {
                    Answer::Title(text.to_string())
                })
            }
        }
    }
}

impl Confirmer for TerminalPrompter {
    fn confirm(&mut self, question: &str) -> Result<Confirmation, PipelineError> {
        let choice = Select::new()
            .with_prompt(question)
            .items(&["yes", "no", "all"])
            .default(1)
            .interact_on(&Term::stderr())
            .map_err(terminal_error)?;
        Ok(match choice {
            0 => Confirmation::Yes,
            2 => Confirmation::All,
            _ => Confirmation::No,
        })
    }
}
