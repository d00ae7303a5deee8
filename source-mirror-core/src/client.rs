//! HTTP implementation of [`TreeFetcher`] and [`ContentFetcher`] for the file-tree API.
//!
//! Listing: `GET {api_base}/api/file-tree/{deployment}?base={source_root}/{path}&teamId={team}`,
//! answered with a JSON array of `{name, type, link?}`.
//!
//! Content: `GET {link}` with `teamId` merged into the link's own query, answered
//! with a JSON object whose `data` field carries the file as base64.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::MirrorConfig;
use crate::contract::{ContentFetcher, TreeEntry, TreeFetcher};
use crate::error::{ContentError, ListingError, MirrorError};
use crate::path::RemotePath;

/// Body of a content response. Only `data` is used.
#[derive(Debug, Default, Deserialize)]
pub struct ContentResponse {
    #[serde(default)]
    pub data: Option<String>,
}

pub struct ApiClient<'a> {
    http: reqwest::Client,
    config: &'a MirrorConfig,
}

impl<'a> ApiClient<'a> {
    pub fn new(config: &'a MirrorConfig) -> Result<Self, MirrorError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| MirrorError::Client {
            reason: e.to_string(),
        })?;
        Url::parse(&config.api_base).map_err(|e| MirrorError::Client {
            reason: format!("invalid api_base {:?}: {e}", config.api_base),
        })?;
        info!(api_base = %config.api_base, "Initialized ApiClient");
        Ok(ApiClient { http, config })
    }
}

/// Builds the listing URL for `path`. The root path yields `base={source_root}/`.
///
/// Query values are form-encoded, so slashes in `base` go out as `%2F`
/// (`base=src%2Fparent%2Fx`); the API decodes them back to `src/parent/x`.
pub fn listing_url(config: &MirrorConfig, path: &RemotePath) -> Result<Url, ListingError> {
    let raw = format!(
        "{}/api/file-tree/{}",
        config.api_base.trim_end_matches('/'),
        config.deployment
    );
    let mut url = Url::parse(&raw).map_err(|e| ListingError::InvalidUrl(format!("{raw}: {e}")))?;

    let root = config.source_root.trim_matches('/');
    let base = if root.is_empty() {
        path.as_str().to_string()
    } else {
        format!("{root}/{path}")
    };
    url.query_pairs_mut()
        .append_pair("base", &base)
        .append_pair("teamId", &config.team_id);
    Ok(url)
}

/// Resolves `link` against the API base and sets its `teamId` query parameter,
/// keeping every other parameter.
pub fn content_url(config: &MirrorConfig, link: &str) -> Result<Url, ContentError> {
    let invalid = |reason: String| ContentError::InvalidLink {
        link: link.to_string(),
        reason,
    };
    let base = Url::parse(&config.api_base).map_err(|e| invalid(e.to_string()))?;
    let mut url = base.join(link).map_err(|e| invalid(e.to_string()))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "teamId")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("teamId", &config.team_id);
    Ok(url)
}

/// Decodes the base64 payload of a content response.
///
/// Whitespace inside the payload (line-wrapped base64) is ignored.
pub fn decode_payload(response: ContentResponse) -> Result<Vec<u8>, ContentError> {
    let data = response.data.ok_or(ContentError::MissingPayload)?;
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(compact)?)
}

#[async_trait]
impl<'a> TreeFetcher for ApiClient<'a> {
    async fn list_entries(&self, path: &RemotePath) -> Result<Vec<TreeEntry>, ListingError> {
        let url = listing_url(self.config, path)?;
        info!(url = %url, "[LIST] Fetching file tree");

        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(&self.config.credential)
            .send()
            .await
            .map_err(|source| ListingError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ListingError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let entries: Vec<TreeEntry> = resp.json().await.map_err(|source| ListingError::Decode {
            url: url.to_string(),
            source,
        })?;
        debug!(path = %path, count = entries.len(), "[LIST] File tree received");
        Ok(entries)
    }
}

#[async_trait]
impl<'a> ContentFetcher for ApiClient<'a> {
    async fn fetch_content(&self, link: &str) -> Result<Vec<u8>, ContentError> {
        let url = content_url(self.config, link)?;
        info!(url = %url, "[FETCH] Downloading file");

        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(&self.config.credential)
            .send()
            .await
            .map_err(|source| ContentError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: ContentResponse = resp.json().await.map_err(|source| ContentError::Decode {
            url: url.to_string(),
            source,
        })?;
        decode_payload(body)
    }
}
