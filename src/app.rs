//! The two user actions, `send_code` and `receive_code`, wired to a host.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::executor::{BootstrapExecutor, CommandRunner, ProcessRunner};
use crate::host::{HostUi, MessageLevel};
use crate::model::{Credential, ShareLink};
use crate::traits::TransferError;
use crate::transfer::{
    backends, HttpDownloader, ReceivePipeline, ReceiveResult, SendPipeline, ZipArchiver,
    ZipExtractor,
};

pub const NO_FOLDER_OPEN: &str = "No folder is open.";

pub const RECEIVE_PROMPT: &str = "Enter the code share link";

pub struct App<H: HostUi> {
    host: H,
    config: Config,
    workspace_folder: Option<PathBuf>,
    credential: Option<Credential>,
    runner: Arc<dyn CommandRunner>,
    cancel: CancellationToken,
}

impl<H: HostUi> App<H> {
    pub fn new(host: H, config: Config) -> Self {
        Self {
            host,
            config,
            workspace_folder: None,
            credential: None,
            runner: Arc::new(ProcessRunner),
            cancel: CancellationToken::new(),
        }
    }

    /// Folder that `send_code` shares.
    pub fn with_workspace_folder(mut self, folder: Option<PathBuf>) -> Self {
        self.workspace_folder = folder;
        self
    }

    /// Token supplied up front, e.g. from the environment.
    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_command_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Shares the open folder and shows the resulting link.
    ///
    /// Errors are shown to the user and also returned.
    pub async fn send_code(&self) -> Result<ShareLink, TransferError> {
        let result = self.send().await;
        match &result {
            Ok(link) => self
                .host
                .show(MessageLevel::Info, &format!("Share link: {link}")),
            Err(e) => self.host.show(MessageLevel::Error, &e.to_string()),
        }
        result
    }

    async fn send(&self) -> Result<ShareLink, TransferError> {
        let folder = self
            .workspace_folder
            .as_deref()
            .ok_or_else(|| TransferError::InvalidSource(NO_FOLDER_OPEN.to_string()))?;

        let credential = self.upload_credential().await?;
        let uploader = backends::uploader(
            self.config.backend,
            &self.config.endpoints,
            self.config.http_client()?,
            credential,
        )?;
        let archiver = ZipArchiver::new(self.config.scratch_root())
            .with_exclude(self.config.exclude.clone());

        let sent = SendPipeline::new(archiver, uploader)
            .with_timeout(self.config.stage_timeout())
            .send(folder, &self.cancel)
            .await?;

        info!(
            link = %sent.link,
            total_ms = sent.stats.total_duration_ms,
            "Send finished"
        );
        Ok(sent.link)
    }

    /// Receives the project behind `link_text`, prompting for a link when
    /// none is given.
    ///
    /// Returns `Ok(None)` when the user dismisses the prompt.
    pub async fn receive_code(
        &self,
        link_text: Option<&str>,
    ) -> Result<Option<ReceiveResult>, TransferError> {
        let link = match link_text.map(str::trim).filter(|l| !l.is_empty()) {
            Some(link) => link.to_string(),
            None => match self.host.prompt(RECEIVE_PROMPT, false).await {
                Some(link) if !link.trim().is_empty() => link.trim().to_string(),
                _ => return Ok(None),
            },
        };

        let result = self.receive(&link).await;
        match &result {
            Ok(received) => self.host.show(
                MessageLevel::Info,
                &format!("Project received into {}", received.workspace.display()),
            ),
            Err(e) => self.host.show(MessageLevel::Error, &e.to_string()),
        }
        result.map(Some)
    }

    async fn receive(&self, link: &str) -> Result<ReceiveResult, TransferError> {
        let client = self.config.http_client()?;
        let scratch = self.config.scratch_root();
        let resolver = backends::resolver(
            self.config.backend,
            &self.config.endpoints,
            client.clone(),
            self.credential.clone(),
        );
        let bootstrapper =
            BootstrapExecutor::with_runner(Arc::clone(&self.runner), self.config.bootstrap_delay());

        let received = ReceivePipeline::new(
            resolver,
            HttpDownloader::new(client, &scratch),
            ZipExtractor::new(&scratch),
            bootstrapper,
        )
        .with_timeout(self.config.stage_timeout())
        .receive(link, &self.host, &self.cancel)
        .await?;

        info!(
            workspace = %received.workspace.display(),
            total_ms = received.stats.total_duration_ms,
            "Receive finished"
        );
        Ok(received)
    }

    /// The configured token, or a masked prompt when the backend needs one.
    async fn upload_credential(&self) -> Result<Option<Credential>, TransferError> {
        if self.credential.is_some() || !self.config.backend.requires_credential() {
            return Ok(self.credential.clone());
        }

        let backend = self.config.backend.display_name();
        self.host
            .prompt(&format!("Enter your {backend} token"), true)
            .await
            .and_then(Credential::new)
            .map(Some)
            .ok_or_else(|| TransferError::MissingCredential {
                backend: backend.to_string(),
            })
    }
}
