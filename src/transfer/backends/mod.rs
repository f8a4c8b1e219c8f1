//! File host implementations of [`UploadBackend`] and [`LinkResolver`].
//!
//! - `gofile` - GoFile, multipart upload, content-id metadata lookup
//! - `fileio` - file.io, anonymous one-shot links that are directly fetchable
//! - `gist` - GitHub Gist, base64 text payload, token required for upload

pub mod fileio;
pub mod gist;
pub mod gofile;

use std::fmt;
use std::str::FromStr;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::config::Endpoints;
use crate::model::{Archive, Credential};
use crate::traits::{LinkResolver, TransferError, UploadBackend};

pub use fileio::FileIo;
pub use gist::Gist;
pub use gofile::GoFile;

/// Which file host a run talks to. Chosen once, from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Gofile,
    Fileio,
    Gist,
}

impl BackendKind {
    pub fn display_name(self) -> &'static str {
        match self {
            BackendKind::Gofile => gofile::NAME,
            BackendKind::Fileio => fileio::NAME,
            BackendKind::Gist => gist::NAME,
        }
    }

    /// Whether uploading needs a user-supplied token.
    pub fn requires_credential(self) -> bool {
        matches!(self, BackendKind::Gist)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Gofile => "gofile",
            BackendKind::Fileio => "fileio",
            BackendKind::Gist => "gist",
        })
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gofile" => Ok(BackendKind::Gofile),
            "fileio" | "file.io" => Ok(BackendKind::Fileio),
            "gist" => Ok(BackendKind::Gist),
            other => Err(format!(
                "unknown backend '{other}' (expected gofile, fileio or gist)"
            )),
        }
    }
}

/// Builds the upload side of `kind`.
pub fn uploader(
    kind: BackendKind,
    endpoints: &Endpoints,
    client: reqwest::Client,
    credential: Option<Credential>,
) -> Result<Box<dyn UploadBackend>, TransferError> {
    Ok(match kind {
        BackendKind::Gofile => Box::new(GoFile::new(client, endpoints, credential)),
        BackendKind::Fileio => Box::new(FileIo::new(client, endpoints)),
        BackendKind::Gist => {
            let credential = credential.ok_or_else(|| TransferError::MissingCredential {
                backend: gist::NAME.to_string(),
            })?;
            Box::new(Gist::new(client, endpoints, Some(credential)))
        }
    })
}

/// Builds the resolve side of `kind`.
pub fn resolver(
    kind: BackendKind,
    endpoints: &Endpoints,
    client: reqwest::Client,
    credential: Option<Credential>,
) -> Box<dyn LinkResolver> {
    match kind {
        BackendKind::Gofile => Box::new(GoFile::new(client, endpoints, credential)),
        BackendKind::Fileio => Box::new(FileIo::new(client, endpoints)),
        BackendKind::Gist => Box::new(Gist::new(client, endpoints, credential)),
    }
}

/// Appends `/`-separated segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, TransferError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| TransferError::Config(format!("'{base}' cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(path.split('/'));
    Ok(url)
}

/// Multipart form with the archive streamed from disk as the `file` field.
pub(crate) async fn archive_form(archive: &Archive) -> Result<Form, TransferError> {
    let file = tokio::fs::File::open(archive.path()).await?;
    let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
    let part = Part::stream_with_length(body, archive.size_bytes)
        .file_name(archive.file_name())
        .mime_str("application/zip")
        .map_err(|e| TransferError::Other(e.to_string()))?;
    Ok(Form::new().part("file", part))
}

/// Reads a JSON body, keeping the status for error reporting.
pub(crate) async fn json_response(
    response: reqwest::Response,
) -> Result<Value, (Option<u16>, String)> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| (Some(status.as_u16()), format!("cannot read response: {e}")))?;
    if !status.is_success() {
        return Err((Some(status.as_u16()), format!("server answered {status}: {}", snippet(&text))));
    }
    serde_json::from_str(&text)
        .map_err(|e| (Some(status.as_u16()), format!("response is not JSON: {e}")))
}

/// String at a JSON pointer such as `/data/downloadPage`.
pub(crate) fn string_at(body: &Value, pointer: &str) -> Option<String> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub(crate) fn upload_error(backend: &str, status: Option<u16>, message: String) -> TransferError {
    TransferError::Upload {
        backend: backend.to_string(),
        http_status: status,
        message,
    }
}

pub(crate) fn resolve_error(backend: &str, status: Option<u16>, message: String) -> TransferError {
    TransferError::Resolve {
        backend: backend.to_string(),
        http_status: status,
        message,
    }
}

pub(crate) fn invalid_link(backend: &str, link: &str) -> TransferError {
    TransferError::InvalidLink {
        backend: backend.to_string(),
        link: link.to_string(),
    }
}

/// Picks the first file entry of a metadata mapping and reads its link field.
pub(crate) fn first_entry_link(
    entries: Option<&serde_json::Map<String, Value>>,
    id: &str,
    field: &str,
) -> Result<String, TransferError> {
    let (key, entry) = entries
        .and_then(|map| map.iter().next())
        .ok_or_else(|| TransferError::NoContent { id: id.to_string() })?;
    entry
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TransferError::MissingLink { entry: key.clone() })
}

fn snippet(text: &str) -> String {
    const MAX: usize = 200;
    match text.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
