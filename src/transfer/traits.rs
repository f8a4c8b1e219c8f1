//! Blocking stage traits for the transfer pipelines.
//!
//! Archive creation and extraction are CPU- and disk-bound, so their
//! implementations are synchronous and the pipelines drive them through
//! `tokio::task::spawn_blocking`. Network stages live behind the async
//! [`UploadBackend`](crate::traits::UploadBackend) and
//! [`LinkResolver`](crate::traits::LinkResolver) traits instead.

use std::path::Path;

use crate::model::Archive;
use crate::traits::TransferError;
use crate::transfer::pipeline::ExtractedWorkspace;

/// Packs a project folder into a single archive in scratch storage.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the pipeline shares them with a
/// blocking worker thread.
pub trait Archiver: Send + Sync {
    /// Creates a uniquely named archive of everything under `source`.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidSource`] if `source` is missing or is
    /// not a directory, and [`TransferError::Archive`] if the archive cannot
    /// be written.
    fn create_archive(&self, source: &Path) -> Result<Archive, TransferError>;

    /// Returns the name of this stage, used in logs and timeout errors.
    fn stage_name(&self) -> &'static str {
        "archive"
    }
}

/// Unpacks a downloaded archive into a fresh directory.
pub trait Extractor: Send + Sync {
    /// Extracts every entry of `archive` into a newly created, uniquely
    /// named directory and returns it.
    ///
    /// The returned [`ExtractedWorkspace`] removes the directory on drop
    /// unless it is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Extraction`] if the archive is malformed, an
    /// entry would escape the destination, or a write fails.
    fn extract(&self, archive: &Path) -> Result<ExtractedWorkspace, TransferError>;

    fn stage_name(&self) -> &'static str {
        "extract"
    }
}
