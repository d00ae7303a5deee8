/// `load_config` module: loads a static YAML config file and injects the API token
/// from the environment, producing the core [`MirrorConfig`].
///
/// # Responsibilities
/// - Parse the user-supplied YAML (no secrets) into type-safe structs
/// - Apply defaults for optional keys (`api_base`, `source_root`, `timeout_secs`)
/// - Read the bearer token from `VERCEL_TOKEN` (a `.env` file is honoured by `main`)
/// - Report every failure with a message that names the file or variable at fault
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use serde::Deserialize;
use source_mirror_core::config::{MirrorConfig, DEFAULT_API_BASE, DEFAULT_SOURCE_ROOT};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

pub const TOKEN_ENV_VAR: &str = "VERCEL_TOKEN";

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    /// Deployment id or live URL, as used in the file-tree endpoint.
    pub deployment: String,
    pub team_id: String,
    pub output_dir: PathBuf,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_source_root")]
    pub source_root: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_source_root() -> String {
    DEFAULT_SOURCE_ROOT.to_string()
}

/// Loads a static YAML config file and injects the token from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MirrorConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let file: FileConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if file.deployment.trim().is_empty() {
        anyhow::bail!("Config key `deployment` must not be empty");
    }
    if file.team_id.trim().is_empty() {
        anyhow::bail!("Config key `team_id` must not be empty");
    }

    let credential = match std::env::var(TOKEN_ENV_VAR) {
        Ok(token) if !token.trim().is_empty() => {
            info!("{TOKEN_ENV_VAR} found in env");
            token
        }
        Ok(_) => {
            error!("{TOKEN_ENV_VAR} is empty");
            anyhow::bail!("{TOKEN_ENV_VAR} environment variable is empty");
        }
        Err(e) => {
            error!(error = ?e, "{TOKEN_ENV_VAR} environment variable not set");
            return Err(anyhow::anyhow!(
                "{TOKEN_ENV_VAR} environment variable not set: {e}"
            ));
        }
    };

    let mut config = MirrorConfig::new(credential, file.deployment, file.team_id, file.output_dir);
    config.api_base = file.api_base;
    config.source_root = file.source_root;
    config.timeout = file.timeout_secs.map(Duration::from_secs);

    config.trace_loaded();
    Ok(config)
}
