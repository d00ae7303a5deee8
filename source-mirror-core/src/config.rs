use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_API_BASE: &str = "https://vercel.com";
pub const DEFAULT_SOURCE_ROOT: &str = "src";

/// Everything a mirror run needs, fixed for the lifetime of the process.
#[derive(Clone)]
pub struct MirrorConfig {
    /// Bearer token sent with every request.
    pub credential: String,
    /// Deployment id or live URL used in the file-tree endpoint path.
    pub deployment: String,
    /// Team scope added as `teamId` to every request.
    pub team_id: String,
    /// Local root of the mirror.
    pub output_dir: PathBuf,
    pub api_base: String,
    /// Remote directory the listing `base` parameter is rooted at.
    pub source_root: String,
    pub timeout: Option<Duration>,
}

impl MirrorConfig {
    pub fn new(
        credential: impl Into<String>,
        deployment: impl Into<String>,
        team_id: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        MirrorConfig {
            credential: credential.into(),
            deployment: deployment.into(),
            team_id: team_id.into(),
            output_dir: output_dir.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            source_root: DEFAULT_SOURCE_ROOT.to_string(),
            timeout: None,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            deployment = %self.deployment,
            team_id = %self.team_id,
            output_dir = %self.output_dir.display(),
            api_base = %self.api_base,
            "Loaded MirrorConfig"
        );
        debug!(?self, "MirrorConfig loaded (full debug)");
    }
}

impl fmt::Debug for MirrorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorConfig")
            .field("credential", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("team_id", &self.team_id)
            .field("output_dir", &self.output_dir)
            .field("api_base", &self.api_base)
            .field("source_root", &self.source_root)
            .field("timeout", &self.timeout)
            .finish()
    }
}
