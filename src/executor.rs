use crate::model::{DependencyManifest, InstallerCommand};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

/// Runs an installer command inside a workspace.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Returns whether the command exited successfully.
    async fn run(&self, command: &InstallerCommand, cwd: &Path) -> std::io::Result<bool>;
}

/// Spawns installers as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &InstallerCommand, cwd: &Path) -> std::io::Result<bool> {
        let status = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .status()
            .await?;
        Ok(status.success())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub manifest: DependencyManifest,
    pub succeeded: bool,
}

/// Installs a received project's dependencies in the background.
///
/// Failures are logged and never reported as pipeline errors.
#[derive(Clone)]
pub struct BootstrapExecutor {
    runner: Arc<dyn CommandRunner>,
    delay: Duration,
}

impl BootstrapExecutor {
    pub fn with_runner(runner: Arc<dyn CommandRunner>, delay: Duration) -> Self {
        Self { runner, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the first recognized manifest at the root of `workspace`.
    pub fn detect(workspace: &Path) -> Option<DependencyManifest> {
        DependencyManifest::PRIORITY
            .into_iter()
            .find(|m| workspace.join(m.file_name()).is_file())
    }

    /// Runs the installer for `workspace` right away.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self, workspace: &Path) -> Option<InstallOutcome> {
        let manifest = Self::detect(workspace)?;
        let command = manifest.installer();

        info!(manifest = manifest.file_name(), command = %command, "Installing dependencies");

        let succeeded = match self.runner.run(&command, workspace).await {
            Ok(true) => {
                info!(command = %command, "Dependencies installed");
                true
            }
            Ok(false) => {
                warn!(command = %command, "Installer exited with a failure status");
                false
            }
            Err(e) => {
                warn!(command = %command, error = %e, "Installer could not be started");
                false
            }
        };

        Some(InstallOutcome {
            manifest,
            succeeded,
        })
    }

    /// Runs [`bootstrap`](Self::bootstrap) on a detached task after the
    /// configured delay.
    ///
    /// The delay gives the host time to finish opening the workspace; it is a
    /// heuristic, not a readiness guarantee.
    pub fn schedule(&self, workspace: PathBuf) -> JoinHandle<Option<InstallOutcome>> {
        let executor = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(executor.delay).await;
            executor.bootstrap(&workspace).await
        })
    }
}
