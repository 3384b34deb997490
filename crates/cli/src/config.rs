//! CLI configuration utilities

use anyhow::{Context, Result, bail};
use bazaar_http::ClientConfig;
use std::path::{Path, PathBuf};

/// Default config file name inside the data directory
pub const CONFIG_FILE: &str = "config.json";

/// Credential file, relative to the data directory
pub const TOKEN_FILE: &str = "auth/tokens.json";

/// Search history file, relative to the data directory
pub const SEARCH_HISTORY_FILE: &str = "search_history.json";

/// Data directory: the explicit one, else the platform data directory
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bazaar")
    })
}

/// Load client configuration from the explicit file, or from the data
/// directory's config file when one exists
pub fn load_client_config(data_dir: &Path, explicit: Option<&Path>) -> Result<ClientConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = data_dir.join(CONFIG_FILE);
            default.exists().then_some(default)
        }
    };

    ClientConfig::load(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration from the environment".to_string(),
    })
}

/// Save client configuration to a JSON file
pub fn save_client_config<P: AsRef<Path>>(config: &ClientConfig, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Generate a default configuration file, refusing to overwrite unless forced
pub fn generate_default_config<P: AsRef<Path>>(path: P, force: bool) -> Result<()> {
    let path = path.as_ref();
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    save_client_config(&ClientConfig::default(), path)
}
