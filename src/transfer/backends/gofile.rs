//! GoFile: `POST {upload}/uploadfile`, `GET {api}/contents/{id}`.
//!
//! Share links look like `https://gofile.io/d/<content id>`.

use async_trait::async_trait;
use tracing::{debug, info, instrument};
use url::Url;

use super::{
    archive_form, endpoint, first_entry_link, invalid_link, json_response, resolve_error,
    string_at, upload_error,
};
use crate::config::Endpoints;
use crate::model::{Archive, Credential, DirectDownloadUrl, ShareLink};
use crate::traits::{LinkResolver, TransferError, UploadBackend};

pub const NAME: &str = "GoFile";

/// Field holding the share link in an upload response.
const LINK_POINTER: &str = "/data/downloadPage";

/// Field holding the file entries in a contents response.
const CONTENTS_POINTER: &str = "/data/contents";

/// Host of the share links handed out to users.
const SHARE_HOST: &str = "gofile.io";

#[derive(Debug, Clone)]
pub struct GoFile {
    client: reqwest::Client,
    upload_url: Url,
    api_url: Url,
    credential: Option<Credential>,
}

impl GoFile {
    pub fn new(
        client: reqwest::Client,
        endpoints: &Endpoints,
        credential: Option<Credential>,
    ) -> Self {
        Self {
            client,
            upload_url: endpoints.gofile_upload.clone(),
            api_url: endpoints.gofile_api.clone(),
            credential,
        }
    }

    /// Extracts the content id from `https://gofile.io/d/<id>`.
    pub fn content_id(link: &str) -> Result<String, TransferError> {
        let url = Url::parse(link.trim()).map_err(|_| invalid_link(NAME, link))?;
        let on_gofile = url
            .host_str()
            .is_some_and(|host| host == SHARE_HOST || host.ends_with(&format!(".{SHARE_HOST}")));
        if !matches!(url.scheme(), "http" | "https") || !on_gofile {
            return Err(invalid_link(NAME, link));
        }

        let mut segments = url
            .path_segments()
            .ok_or_else(|| invalid_link(NAME, link))?;
        match (segments.next(), segments.next()) {
            (Some("d"), Some(id)) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(invalid_link(NAME, link)),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credential {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }
}

#[async_trait]
impl UploadBackend for GoFile {
    fn backend_name(&self) -> &str {
        NAME
    }

    #[instrument(skip(self, archive), fields(archive = %archive.path().display()))]
    async fn upload(&self, archive: &Archive) -> Result<ShareLink, TransferError> {
        let url = endpoint(&self.upload_url, "uploadfile")?;
        let form = archive_form(archive).await?;

        let response = self
            .authorize(self.client.post(url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| upload_error(NAME, None, e.to_string()))?;
        let body = json_response(response)
            .await
            .map_err(|(status, message)| upload_error(NAME, status, message))?;

        let link = string_at(&body, LINK_POINTER).ok_or_else(|| {
            upload_error(
                NAME,
                None,
                format!("response has no '{LINK_POINTER}' field"),
            )
        })?;

        info!(link = %link, "Uploaded to GoFile");
        Ok(ShareLink::new(link))
    }
}

#[async_trait]
impl LinkResolver for GoFile {
    fn backend_name(&self) -> &str {
        NAME
    }

    #[instrument(skip(self))]
    async fn resolve(&self, link: &str) -> Result<DirectDownloadUrl, TransferError> {
        let id = Self::content_id(link)?;
        let url = endpoint(&self.api_url, &format!("contents/{id}"))?;
        debug!(%url, "Fetching content metadata");

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| resolve_error(NAME, None, e.to_string()))?;
        let body = json_response(response)
            .await
            .map_err(|(status, message)| resolve_error(NAME, status, message))?;

        let contents = body.pointer(CONTENTS_POINTER).and_then(|v| v.as_object());
        let direct = first_entry_link(contents, &id, "link")?;
        let direct = Url::parse(&direct)
            .map_err(|e| resolve_error(NAME, None, format!("bad download link '{direct}': {e}")))?;

        Ok(DirectDownloadUrl::raw(direct))
    }
}
