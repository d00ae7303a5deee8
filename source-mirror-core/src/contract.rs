//! # contract: remote tree interface
//!
//! This module defines the data returned by the file-tree API and the two traits
//! the walker depends on:
//!
//! - [`TreeFetcher`] lists the immediate children of a remote directory.
//! - [`ContentFetcher`] pulls the decoded bytes of a single file.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`, so tests can script listings and
//!   payloads without a network (`MockTreeFetcher`, `MockContentFetcher`).
//! - The mocks are exported behind the `test-export-mocks` feature for use from
//!   integration tests.
//!
//! ## Implementations
//! - [`crate::client::ApiClient`] implements both against the HTTP API.

use async_trait::async_trait;
use serde::Deserialize;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::{ContentError, ListingError};
use crate::path::RemotePath;

/// Kind of a listed entry, as reported in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    /// Anything else the API reports (lambdas, symlinks, ...). Not mirrored.
    #[serde(other)]
    Other,
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Content reference; present for files.
    #[serde(default)]
    pub link: Option<String>,
}

impl TreeEntry {
    pub fn file(name: impl Into<String>, link: impl Into<String>) -> Self {
        TreeEntry {
            name: name.into(),
            kind: EntryKind::File,
            link: Some(link.into()),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        TreeEntry {
            name: name.into(),
            kind: EntryKind::Directory,
            link: None,
        }
    }
}

/// Lists a remote directory.
///
/// `Ok(vec![])` means the directory is genuinely empty; a failed request is always
/// an `Err`, so callers can tell the two apart.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TreeFetcher: Send + Sync {
    /// Returns the entries of `path` in the order the server sent them.
    async fn list_entries(&self, path: &RemotePath) -> Result<Vec<TreeEntry>, ListingError>;
}

/// Retrieves the raw bytes behind a content reference.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetches and decodes the payload behind `link`.
    async fn fetch_content(&self, link: &str) -> Result<Vec<u8>, ContentError>;
}
