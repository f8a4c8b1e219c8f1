//! Send and receive pipeline executors.
//!
//! This module provides [`SendPipeline`] (Archive → Upload) and
//! [`ReceivePipeline`] (Resolve → Download → Extract → Open → Bootstrap) with:
//! - Async execution via `tokio`, blocking zip work on `spawn_blocking`
//! - A deadline and a cancellation token on every stage
//! - Structured logging via `tracing`
//! - Automatic cleanup of scratch artifacts via RAII (`Drop` on
//!   [`ExtractedWorkspace`], [`Archive`](crate::model::Archive) and
//!   [`LocalFile`](crate::model::LocalFile))

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::executor::{BootstrapExecutor, InstallOutcome};
use crate::host::HostUi;
use crate::model::ShareLink;
use crate::traits::{LinkResolver, TransferError, UploadBackend};
use crate::transfer::download::HttpDownloader;
use crate::transfer::traits::{Archiver, Extractor};

/// Default deadline for each stage.
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// Pipeline Types
// ============================================================================

/// A directory holding an extracted archive.
///
/// # RAII Cleanup
///
/// `ExtractedWorkspace` implements [`Drop`] and removes its directory unless
/// [`persist`](Self::persist) was called, so a receive that fails after
/// extraction leaves nothing behind. It deliberately does not implement
/// `Clone`.
#[derive(Debug)]
pub struct ExtractedWorkspace {
    /// Directory containing extracted files
    pub path: PathBuf,

    /// Number of regular files written
    pub files_extracted: usize,

    cleanup_on_drop: bool,
}

impl ExtractedWorkspace {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            files_extracted: 0,
            cleanup_on_drop: true,
        }
    }

    /// Resolves `relative` against the workspace root, rejecting any path
    /// that escapes it.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Extraction`] if `relative` is absolute or
    /// contains `..`.
    pub fn safe_child(&self, relative: &Path) -> Result<PathBuf, TransferError> {
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(TransferError::Extraction(format!(
                "Path traversal attempt rejected: '{}'",
                relative.display()
            )));
        }
        Ok(self.path.join(relative))
    }

    /// Keeps the directory on disk and hands its path to the caller.
    pub fn persist(mut self) -> PathBuf {
        self.cleanup_on_drop = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ExtractedWorkspace {
    fn drop(&mut self) {
        if self.cleanup_on_drop && self.path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove extraction directory"
                );
            }
        }
    }
}

/// Outcome of a successful send.
#[derive(Debug)]
pub struct SendResult {
    pub link: ShareLink,
    pub stats: SendStats,
}

#[derive(Debug, Default, Clone)]
pub struct SendStats {
    pub total_duration_ms: u64,
    pub archive_duration_ms: u64,
    pub upload_duration_ms: u64,
    pub archive_size_bytes: u64,
}

/// Outcome of a successful receive.
#[derive(Debug)]
pub struct ReceiveResult {
    /// Opened workspace directory, now owned by the user
    pub workspace: PathBuf,

    /// Detached dependency install; awaiting it is optional
    pub bootstrap: JoinHandle<Option<InstallOutcome>>,

    pub stats: ReceiveStats,
}

#[derive(Debug, Default, Clone)]
pub struct ReceiveStats {
    pub total_duration_ms: u64,
    pub resolve_duration_ms: u64,
    pub download_duration_ms: u64,
    pub extraction_duration_ms: u64,
    pub download_size_bytes: u64,
    pub files_extracted: usize,
}

// ============================================================================
// Stage Guard
// ============================================================================

/// Runs one stage under a deadline, giving up early if `cancel` fires.
pub async fn run_stage<T, F>(
    stage: &str,
    limit: Duration,
    cancel: &CancellationToken,
    work: F,
) -> Result<T, TransferError>
where
    F: Future<Output = Result<T, TransferError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransferError::Cancelled {
            stage: stage.to_string(),
        }),
        outcome = timeout(limit, work) => outcome.map_err(|_| TransferError::StageTimeout {
            stage: stage.to_string(),
            timeout_secs: limit.as_secs(),
        })?,
    }
}

fn join_error(e: tokio::task::JoinError) -> TransferError {
    TransferError::Other(format!("Task join error: {e}"))
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

// ============================================================================
// Send
// ============================================================================

/// Archive → Upload.
///
/// # Example
///
/// ```ignore
/// let pipeline = SendPipeline::new(ZipArchiver::new(scratch), uploader)
///     .with_timeout(Duration::from_secs(120));
/// let sent = pipeline.send(Path::new("/proj"), &CancellationToken::new()).await?;
/// println!("{}", sent.link);
/// ```
pub struct SendPipeline<A, U>
where
    A: Archiver,
    U: UploadBackend,
{
    archiver: Arc<A>,
    uploader: U,
    stage_timeout: Duration,
}

impl<A, U> SendPipeline<A, U>
where
    A: Archiver + 'static,
    U: UploadBackend,
{
    pub fn new(archiver: A, uploader: U) -> Self {
        Self {
            archiver: Arc::new(archiver),
            uploader,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Archives `source` and uploads it, stopping at the first failure.
    ///
    /// The scratch archive is removed before this returns, whatever the
    /// outcome.
    pub async fn send(
        &self,
        source: &Path,
        cancel: &CancellationToken,
    ) -> Result<SendResult, TransferError> {
        let start = Instant::now();
        let mut stats = SendStats::default();

        info!(source = %source.display(), "Starting archive stage");
        let archive_start = Instant::now();
        let archiver = Arc::clone(&self.archiver);
        let source_owned = source.to_path_buf();

        let archive = run_stage(
            self.archiver.stage_name(),
            self.stage_timeout,
            cancel,
            async move {
                tokio::task::spawn_blocking(move || archiver.create_archive(&source_owned))
                    .await
                    .map_err(join_error)?
            },
        )
        .await?;

        stats.archive_duration_ms = elapsed_ms(archive_start);
        stats.archive_size_bytes = archive.size_bytes;
        info!(
            duration_ms = stats.archive_duration_ms,
            size_bytes = stats.archive_size_bytes,
            "Archive stage completed"
        );

        info!(backend = self.uploader.backend_name(), "Starting upload stage");
        let upload_start = Instant::now();
        let link = run_stage(
            "upload",
            self.stage_timeout,
            cancel,
            self.uploader.upload(&archive),
        )
        .await?;
        drop(archive);

        stats.upload_duration_ms = elapsed_ms(upload_start);
        stats.total_duration_ms = elapsed_ms(start);
        info!(
            duration_ms = stats.upload_duration_ms,
            total_ms = stats.total_duration_ms,
            "Upload stage completed"
        );

        Ok(SendResult { link, stats })
    }
}

// ============================================================================
// Receive
// ============================================================================

/// Resolve → Download → Extract → Open workspace → Bootstrap.
pub struct ReceivePipeline<R, X>
where
    R: LinkResolver,
    X: Extractor,
{
    resolver: R,
    downloader: HttpDownloader,
    extractor: Arc<X>,
    bootstrapper: BootstrapExecutor,
    stage_timeout: Duration,
}

impl<R, X> ReceivePipeline<R, X>
where
    R: LinkResolver,
    X: Extractor + 'static,
{
    pub fn new(
        resolver: R,
        downloader: HttpDownloader,
        extractor: X,
        bootstrapper: BootstrapExecutor,
    ) -> Self {
        Self {
            resolver,
            downloader,
            extractor: Arc::new(extractor),
            bootstrapper,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Fetches the project behind `link` and opens it through `host`.
    ///
    /// Every failure up to and including opening the workspace aborts the
    /// run and removes the extraction directory. The dependency install is
    /// scheduled afterwards and cannot fail the receive.
    pub async fn receive<H>(
        &self,
        link: &str,
        host: &H,
        cancel: &CancellationToken,
    ) -> Result<ReceiveResult, TransferError>
    where
        H: HostUi + ?Sized,
    {
        let start = Instant::now();
        let mut stats = ReceiveStats::default();
        let link = link.trim();

        info!(backend = self.resolver.backend_name(), "Starting resolve stage");
        let stage_start = Instant::now();
        let direct = run_stage(
            "resolve",
            self.stage_timeout,
            cancel,
            self.resolver.resolve(link),
        )
        .await?;
        stats.resolve_duration_ms = elapsed_ms(stage_start);
        info!(
            duration_ms = stats.resolve_duration_ms,
            url = %direct.url,
            "Resolve stage completed"
        );

        let stage_start = Instant::now();
        let local = run_stage(
            "download",
            self.stage_timeout,
            cancel,
            self.downloader.download(&direct),
        )
        .await?;
        stats.download_duration_ms = elapsed_ms(stage_start);
        stats.download_size_bytes = local.size_bytes;

        // The downloaded archive moves into the task and is removed there once
        // extraction has finished, successfully or not.
        let stage_start = Instant::now();
        let extractor = Arc::clone(&self.extractor);
        let workspace = run_stage(
            self.extractor.stage_name(),
            self.stage_timeout,
            cancel,
            async move {
                tokio::task::spawn_blocking(move || {
                    let extracted = extractor.extract(local.path());
                    drop(local);
                    extracted
                })
                .await
                .map_err(join_error)?
            },
        )
        .await?;
        stats.extraction_duration_ms = elapsed_ms(stage_start);
        stats.files_extracted = workspace.files_extracted;
        info!(
            duration_ms = stats.extraction_duration_ms,
            files = stats.files_extracted,
            path = %workspace.path.display(),
            "Extraction stage completed"
        );

        run_stage(
            "open_workspace",
            self.stage_timeout,
            cancel,
            host.open_workspace(&workspace.path, true),
        )
        .await?;
        let workspace = workspace.persist();

        info!(
            delay_ms = self.bootstrapper.delay().as_millis() as u64,
            "Scheduling dependency install"
        );
        let bootstrap = self.bootstrapper.schedule(workspace.clone());

        stats.total_duration_ms = elapsed_ms(start);
        Ok(ReceiveResult {
            workspace,
            bootstrap,
            stats,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
