//! Transfer module - the send and receive pipelines.
//!
//! This module provides the building blocks of a folder transfer:
//! - **Traits**: [`Archiver`], [`Extractor`] for the blocking zip stages
//! - **Archives**: [`ZipArchiver`], [`ZipExtractor`]
//! - **Network**: [`HttpDownloader`] and the file hosts in [`backends`]
//! - **Pipeline**: [`SendPipeline`] and [`ReceivePipeline`]

pub mod archive;
pub mod backends;
pub mod download;
pub mod pipeline;
pub mod traits;

// Re-export commonly used types
pub use archive::{ZipArchiver, ZipExtractor};
pub use backends::BackendKind;
pub use download::HttpDownloader;
pub use pipeline::{
    run_stage, ExtractedWorkspace, ReceivePipeline, ReceiveResult, ReceiveStats, SendPipeline,
    SendResult, SendStats, DEFAULT_STAGE_TIMEOUT,
};
pub use traits::{Archiver, Extractor};
