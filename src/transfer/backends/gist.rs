//! GitHub Gist. Gists only hold text, so the archive travels as a single
//! base64 file and the resolver marks its raw URL as base64-encoded.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use tracing::{debug, info, instrument};
use url::Url;

use super::{
    endpoint, first_entry_link, invalid_link, json_response, resolve_error, string_at,
    upload_error,
};
use crate::config::Endpoints;
use crate::model::{Archive, Credential, DirectDownloadUrl, PayloadEncoding, ShareLink};
use crate::traits::{LinkResolver, TransferError, UploadBackend};

pub const NAME: &str = "Gist";

const LINK_POINTER: &str = "/html_url";

const GIST_HOST: &str = "gist.github.com";

#[derive(Debug, Clone)]
pub struct Gist {
    client: reqwest::Client,
    api_url: Url,
    credential: Option<Credential>,
}

impl Gist {
    pub fn new(
        client: reqwest::Client,
        endpoints: &Endpoints,
        credential: Option<Credential>,
    ) -> Self {
        Self {
            client,
            api_url: endpoints.gist_api.clone(),
            credential,
        }
    }

    /// Extracts the gist id, the last path segment of a `gist.github.com` link.
    pub fn gist_id(link: &str) -> Result<String, TransferError> {
        let url = Url::parse(link.trim()).map_err(|_| invalid_link(NAME, link))?;
        if url.host_str() != Some(GIST_HOST) {
            return Err(invalid_link(NAME, link));
        }
        url.path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .filter(|id| id.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_string)
            .ok_or_else(|| invalid_link(NAME, link))
    }

    fn request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/vnd.github+json");
        match &self.credential {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }
}

#[async_trait]
impl UploadBackend for Gist {
    fn backend_name(&self) -> &str {
        NAME
    }

    #[instrument(skip(self, archive), fields(archive = %archive.path().display()))]
    async fn upload(&self, archive: &Archive) -> Result<ShareLink, TransferError> {
        if self.credential.is_none() {
            return Err(TransferError::MissingCredential {
                backend: NAME.to_string(),
            });
        }

        // The API takes JSON text only, so the whole archive is read here.
        let bytes = tokio::fs::read(archive.path()).await?;
        let name = archive.file_name();
        let payload = json!({
            "description": format!("codeshare: {name}"),
            "public": false,
            "files": {
                format!("{name}.b64"): { "content": STANDARD.encode(bytes) }
            }
        });

        let url = endpoint(&self.api_url, "gists")?;
        let response = self
            .request(self.client.post(url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| upload_error(NAME, None, e.to_string()))?;
        let body = json_response(response)
            .await
            .map_err(|(status, message)| upload_error(NAME, status, message))?;

        let link = string_at(&body, LINK_POINTER).ok_or_else(|| {
            upload_error(NAME, None, format!("response has no '{LINK_POINTER}' field"))
        })?;

        info!(link = %link, "Uploaded to Gist");
        Ok(ShareLink::new(link))
    }
}

#[async_trait]
impl LinkResolver for Gist {
    fn backend_name(&self) -> &str {
        NAME
    }

    #[instrument(skip(self))]
    async fn resolve(&self, link: &str) -> Result<DirectDownloadUrl, TransferError> {
        let id = Self::gist_id(link)?;
        let url = endpoint(&self.api_url, &format!("gists/{id}"))?;
        debug!(%url, "Fetching gist metadata");

        let response = self
            .request(self.client.get(url))
            .send()
            .await
            .map_err(|e| resolve_error(NAME, None, e.to_string()))?;
        let body = json_response(response)
            .await
            .map_err(|(status, message)| resolve_error(NAME, status, message))?;

        let files = body.get("files").and_then(|v| v.as_object());
        let raw = first_entry_link(files, &id, "raw_url")?;
        let raw = Url::parse(&raw)
            .map_err(|e| resolve_error(NAME, None, format!("bad raw URL '{raw}': {e}")))?;

        Ok(DirectDownloadUrl {
            url: raw,
            encoding: PayloadEncoding::Base64,
        })
    }
}
