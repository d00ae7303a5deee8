use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::contract::ContentFetcher;
use crate::error::ContentError;

/// Fetches the file behind `link` and writes it to `local_file`, creating missing
/// parent directories and overwriting any existing file.
///
/// Nothing touches the filesystem unless the fetch and decode succeed. Returns the
/// number of bytes written.
pub async fn fetch_and_store<C>(
    content: &C,
    link: &str,
    local_file: &Path,
) -> Result<u64, ContentError>
where
    C: ContentFetcher + ?Sized,
{
    let bytes = content.fetch_content(link).await?;

    if let Some(parent) = local_file.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
            debug!(path = %parent.display(), "Created parent directory");
        }
    }
    fs::write(local_file, &bytes)?;

    info!(path = %local_file.display(), bytes = bytes.len(), "[FETCH] Saved");
    Ok(bytes.len() as u64)
}
