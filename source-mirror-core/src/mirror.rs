//! Top-level pipeline: list the remote tree and mirror it onto the local filesystem.
//!
//! # Flow
//! 1. [`run`] fetches the root listing. A failed or empty root stops the run before
//!    anything is written.
//! 2. [`mirror`] walks the listing depth-first. Directories are listed and created
//!    (even when empty), files are fetched and written via [`fetch_and_store`].
//! 3. A [`MirrorReport`] tallies what was written and what was skipped.
//!
//! # Error Handling
//! Below the root nothing is fatal. A failed listing leaves an empty local directory
//! behind, a failed file is skipped, and the walk continues with the next entry.
//!
//! # Traversal
//! The walk keeps an explicit stack of pending directories instead of recursing, so
//! tree depth is bounded by memory rather than call stack. Entries are still visited
//! in server order, each directory fully before its next sibling.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::client::ApiClient;
use crate::config::MirrorConfig;
use crate::contract::{ContentFetcher, EntryKind, TreeEntry, TreeFetcher};
use crate::error::{ContentError, MirrorError};
use crate::path::{is_safe_entry_name, RemotePath};
use crate::retrieve::fetch_and_store;

/// Outcome of a mirror run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MirrorReport {
    /// Directory entries created locally.
    pub directories_created: usize,
    /// Directory entries whose local directory could not be created.
    pub directories_failed: usize,
    pub files_written: usize,
    pub bytes_written: u64,
    /// File entries that were not written (fetch, decode or write failure).
    pub files_skipped: usize,
    /// Directory listings that failed and were treated as empty.
    pub listings_failed: usize,
    /// Entries with an unsupported type or a name that is not a single path component.
    pub entries_ignored: usize,
}

struct Frame {
    entries: std::vec::IntoIter<TreeEntry>,
    local_dir: PathBuf,
}

/// Mirrors `entries` into `local_dir`, descending into every directory entry.
///
/// `output_root` is the local root of the whole mirror; the remote path of each
/// nested directory is its local path relative to it.
pub async fn mirror<F, C>(
    fetcher: &F,
    content: &C,
    output_root: &Path,
    local_dir: &Path,
    entries: Vec<TreeEntry>,
) -> MirrorReport
where
    F: TreeFetcher + ?Sized,
    C: ContentFetcher + ?Sized,
{
    let mut report = MirrorReport::default();

    if let Err(e) = fs::create_dir_all(local_dir) {
        error!(error = ?e, path = %local_dir.display(), "[MIRROR] Failed to create directory");
        report.directories_failed += 1;
        return report;
    }

    let mut stack = vec![Frame {
        entries: entries.into_iter(),
        local_dir: local_dir.to_path_buf(),
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(entry) = frame.entries.next() else {
            stack.pop();
            continue;
        };

        if !is_safe_entry_name(&entry.name) {
            warn!(name = ?entry.name, dir = %frame.local_dir.display(), "[MIRROR] Ignoring entry with unsafe name");
            report.entries_ignored += 1;
            continue;
        }
        let target = frame.local_dir.join(&entry.name);

        match entry.kind {
            EntryKind::Directory => {
                let Some(remote) = RemotePath::from_local(output_root, &target) else {
                    warn!(path = %target.display(), root = %output_root.display(), "[MIRROR] Directory is outside the output root");
                    report.entries_ignored += 1;
                    continue;
                };
                info!(name = %entry.name, remote = %remote, path = %target.display(), "[MIRROR] Entering directory");

                let children = match fetcher.list_entries(&remote).await {
                    Ok(children) => {
                        if children.is_empty() {
                            info!(remote = %remote, "[MIRROR] Directory is empty");
                        }
                        children
                    }
                    Err(e) => {
                        error!(error = %e, remote = %remote, "[MIRROR][ERROR] Listing failed, treating directory as empty");
                        report.listings_failed += 1;
                        Vec::new()
                    }
                };

                if let Err(e) = fs::create_dir_all(&target) {
                    error!(error = ?e, path = %target.display(), "[MIRROR][ERROR] Failed to create directory");
                    report.directories_failed += 1;
                    continue;
                }
                report.directories_created += 1;
                stack.push(Frame {
                    entries: children.into_iter(),
                    local_dir: target,
                });
            }
            EntryKind::File => {
                let Some(link) = entry.link.as_deref() else {
                    let e = ContentError::MissingLink;
                    warn!(error = %e, path = %target.display(), "[MIRROR] Skipping file");
                    report.files_skipped += 1;
                    continue;
                };
                match fetch_and_store(content, link, &target).await {
                    Ok(bytes) => {
                        report.files_written += 1;
                        report.bytes_written += bytes;
                    }
                    Err(ContentError::MissingPayload) => {
                        warn!(link = %link, path = %target.display(), "[MIRROR] No content data found, skipping file");
                        report.files_skipped += 1;
                    }
                    Err(e) => {
                        error!(error = %e, link = %link, path = %target.display(), "[MIRROR][ERROR] Failed to download file");
                        report.files_skipped += 1;
                    }
                }
            }
            EntryKind::Other => {
                warn!(name = %entry.name, "[MIRROR] Ignoring entry of unsupported type");
                report.entries_ignored += 1;
            }
        }
    }

    report
}

/// Runs a full mirror: root listing, then the walk into `config.output_dir`.
///
/// Fails only when the root listing fails or is empty, or the output directory
/// cannot be created; in each case nothing has been downloaded.
pub async fn run<F, C>(
    config: &MirrorConfig,
    fetcher: &F,
    content: &C,
) -> Result<MirrorReport, MirrorError>
where
    F: TreeFetcher + ?Sized,
    C: ContentFetcher + ?Sized,
{
    info!(output_dir = %config.output_dir.display(), deployment = %config.deployment, "[MIRROR] Starting source download");

    let root = match fetcher.list_entries(&RemotePath::root()).await {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = %e, "[MIRROR][ERROR] Failed to retrieve initial file tree, aborting");
            return Err(MirrorError::RootListing(e));
        }
    };
    if root.is_empty() {
        error!("[MIRROR][ERROR] Initial file tree is empty, aborting");
        return Err(MirrorError::EmptyRoot);
    }
    info!(entries = root.len(), "[MIRROR] Root listing received");

    fs::create_dir_all(&config.output_dir).map_err(|source| MirrorError::OutputDir {
        path: config.output_dir.display().to_string(),
        source,
    })?;

    let report = mirror(fetcher, content, &config.output_dir, &config.output_dir, root).await;
    info!(?report, "[MIRROR] Download complete");
    Ok(report)
}

/// Runs a full mirror against the HTTP API described by `config`.
pub async fn mirror_deployment(config: &MirrorConfig) -> Result<MirrorReport, MirrorError> {
    let client = ApiClient::new(config)?;
    run(config, &client, &client).await
}
