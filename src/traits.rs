use crate::model::{Archive, DirectDownloadUrl, ShareLink};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("{0}")]
    InvalidSource(String),
    #[error("Failed to create archive: {0}")]
    Archive(String),
    #[error("Upload failed: {message}")]
    Upload {
        backend: String,
        http_status: Option<u16>,
        message: String,
    },
    #[error("Invalid {backend} link: {link}")]
    InvalidLink { backend: String, link: String },
    #[error("No files found behind share link '{id}'")]
    NoContent { id: String },
    #[error("File entry '{entry}' has no download link")]
    MissingLink { entry: String },
    #[error("Could not resolve {backend} link: {message}")]
    Resolve {
        backend: String,
        http_status: Option<u16>,
        message: String,
    },
    #[error("Download failed: {0}")]
    Download(String),
    #[error("Extraction failed: {0}")]
    Extraction(String),
    #[error("Could not open workspace: {0}")]
    Workspace(String),
    #[error("A token is required to use {backend}")]
    MissingCredential { backend: String },
    #[error("Stage '{stage}' timed out after {timeout_secs}s")]
    StageTimeout { stage: String, timeout_secs: u64 },
    #[error("Stage '{stage}' was cancelled")]
    Cancelled { stage: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unexpected error: {0}")]
    Other(String),
}

/// A file host that accepts an archive and hands back a share link.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Returns the display name of the host (e.g., "GoFile", "file.io").
    fn backend_name(&self) -> &str;

    /// Uploads the archive and returns the link a recipient can paste.
    async fn upload(&self, archive: &Archive) -> Result<ShareLink, TransferError>;
}

/// Turns a pasted share link into something the downloader can fetch.
///
/// Implementations must reject a malformed link before issuing any request.
#[async_trait]
pub trait LinkResolver: Send + Sync {
    fn backend_name(&self) -> &str;

    async fn resolve(&self, link: &str) -> Result<DirectDownloadUrl, TransferError>;
}

#[async_trait]
impl<T: UploadBackend + ?Sized> UploadBackend for Box<T> {
    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }

    async fn upload(&self, archive: &Archive) -> Result<ShareLink, TransferError> {
        (**self).upload(archive).await
    }
}

#[async_trait]
impl<T: LinkResolver + ?Sized> LinkResolver for Box<T> {
    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }

    async fn resolve(&self, link: &str) -> Result<DirectDownloadUrl, TransferError> {
        (**self).resolve(link).await
    }
}
