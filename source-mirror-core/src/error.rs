//! Error types for listing, content retrieval and whole-run outcomes.
//!
//! Listing and content errors are per-call and never abort a walk on their own;
//! the walker logs them and moves on. Only [`MirrorError`] halts a run.

use thiserror::Error;

/// A directory listing request failed.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("listing request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("listing request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("listing response from {url} could not be decoded: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid listing URL: {0}")]
    InvalidUrl(String),
}

/// Fetching or persisting a single file failed.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("file entry has no content link")]
    MissingLink,

    #[error("invalid content link {link}: {reason}")]
    InvalidLink { link: String, reason: String },

    #[error("content request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("content request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("content response from {url} could not be decoded: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("content response has no data payload")]
    MissingPayload,

    #[error("content payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Conditions that stop a run before any download is attempted.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("failed to retrieve the root file tree: {0}")]
    RootListing(#[source] ListingError),

    #[error("root file tree is empty")]
    EmptyRoot,

    #[error("failed to set up the API client: {reason}")]
    Client { reason: String },

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
