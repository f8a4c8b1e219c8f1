//! The boundary between the pipelines and whatever presents them to a user.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::traits::TransferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// UI primitives the core needs from its host.
#[async_trait]
pub trait HostUi: Send + Sync {
    /// Asks for one line of text. `None` means the user dismissed the prompt.
    async fn prompt(&self, message: &str, masked: bool) -> Option<String>;

    /// Displays a message. Fire-and-forget.
    fn show(&self, level: MessageLevel, message: &str);

    /// Opens `path` as the user's new workspace.
    async fn open_workspace(&self, path: &Path, new_window: bool) -> Result<(), TransferError>;
}

/// Host for a terminal session: dialoguer prompts, stdout/stderr messages
/// and an optional editor command for opening workspaces.
#[derive(Debug, Clone, Default)]
pub struct TerminalHost {
    editor_command: Vec<String>,
}

impl TerminalHost {
    pub fn new(editor_command: Vec<String>) -> Self {
        Self { editor_command }
    }
}

#[async_trait]
impl HostUi for TerminalHost {
    async fn prompt(&self, message: &str, masked: bool) -> Option<String> {
        let message = message.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            if masked {
                dialoguer::Password::new()
                    .with_prompt(message)
                    .allow_empty_password(true)
                    .interact()
            } else {
                dialoguer::Input::<String>::new()
                    .with_prompt(message)
                    .allow_empty(true)
                    .interact_text()
            }
        })
        .await;

        match answer {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                debug!(error = %e, "Prompt dismissed");
                None
            }
            Err(e) => {
                debug!(error = %e, "Prompt task failed");
                None
            }
        }
    }

    fn show(&self, level: MessageLevel, message: &str) {
        match level {
            MessageLevel::Info => println!("{message}"),
            MessageLevel::Warning => eprintln!("warning: {message}"),
            MessageLevel::Error => eprintln!("error: {message}"),
        }
    }

    async fn open_workspace(&self, path: &Path, new_window: bool) -> Result<(), TransferError> {
        let Some((program, args)) = self.editor_command.split_first() else {
            println!("Workspace: {}", path.display());
            return Ok(());
        };

        info!(program = %program, new_window, path = %path.display(), "Opening workspace");
        let status = tokio::process::Command::new(program)
            .args(args)
            .arg(path)
            .status()
            .await
            .map_err(|e| TransferError::Workspace(format!("cannot start '{program}': {e}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(TransferError::Workspace(format!(
                "'{program}' exited with {status}"
            )))
        }
    }
}
