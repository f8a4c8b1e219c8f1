//! file.io: anonymous, one-shot hosting. The share link is itself the
//! download location, so resolving needs no request.

use async_trait::async_trait;
use tracing::{info, instrument};
use url::Url;

use super::{archive_form, invalid_link, json_response, string_at, upload_error};
use crate::config::Endpoints;
use crate::model::{Archive, DirectDownloadUrl, ShareLink};
use crate::traits::{LinkResolver, TransferError, UploadBackend};

pub const NAME: &str = "file.io";

const LINK_POINTER: &str = "/link";

#[derive(Debug, Clone)]
pub struct FileIo {
    client: reqwest::Client,
    base_url: Url,
}

impl FileIo {
    pub fn new(client: reqwest::Client, endpoints: &Endpoints) -> Self {
        Self {
            client,
            base_url: endpoints.fileio.clone(),
        }
    }

    /// Accepts `http(s)://<file.io host>/<key>` links only.
    fn validate(&self, link: &str) -> Result<Url, TransferError> {
        let url = Url::parse(link.trim()).map_err(|_| invalid_link(NAME, link))?;
        let same_host = url.host_str().is_some() && url.host_str() == self.base_url.host_str();
        let has_key = url
            .path_segments()
            .is_some_and(|mut s| s.any(|segment| !segment.is_empty()));

        if matches!(url.scheme(), "http" | "https") && same_host && has_key {
            Ok(url)
        } else {
            Err(invalid_link(NAME, link))
        }
    }
}

#[async_trait]
impl UploadBackend for FileIo {
    fn backend_name(&self) -> &str {
        NAME
    }

    #[instrument(skip(self, archive), fields(archive = %archive.path().display()))]
    async fn upload(&self, archive: &Archive) -> Result<ShareLink, TransferError> {
        let form = archive_form(archive).await?;

        let response = self
            .client
            .post(self.base_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| upload_error(NAME, None, e.to_string()))?;
        let body = json_response(response)
            .await
            .map_err(|(status, message)| upload_error(NAME, status, message))?;

        let link = string_at(&body, LINK_POINTER).ok_or_else(|| {
            upload_error(NAME, None, format!("response has no '{LINK_POINTER}' field"))
        })?;

        info!(link = %link, "Uploaded to file.io");
        Ok(ShareLink::new(link))
    }
}

#[async_trait]
impl LinkResolver for FileIo {
    fn backend_name(&self) -> &str {
        NAME
    }

    async fn resolve(&self, link: &str) -> Result<DirectDownloadUrl, TransferError> {
        self.validate(link).map(DirectDownloadUrl::raw)
    }
}
