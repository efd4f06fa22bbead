//! Optional config file loading. Search order: ./tululu.toml, then
//! $XDG_CONFIG_HOME/tululu/config.toml (or ~/.config/tululu/config.toml).

use serde::Deserialize;
use std::path::PathBuf;

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Destination folder when --dest_folder is not set.
    pub dest_folder: Option<PathBuf>,
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Delay in seconds between requests.
    pub request_delay_secs: Option<u64>,
    /// Pause before a retry, in seconds (base step for exponential backoff).
    pub retry_backoff_secs: Option<u64>,
    /// `fixed` (default) or `exponential`.
    pub backoff: Option<String>,
    /// Upper bound for exponential backoff, in seconds.
    pub max_backoff_secs: Option<u64>,
    /// Total attempts per page or book on network errors. Unset retries forever.
    pub max_attempts: Option<u32>,
    pub base_url: Option<String>,
    pub category: Option<u32>,
    /// Last valid listing page of the category.
    pub last_page: Option<u32>,
    /// Append debug logs to this file.
    pub log_file: Option<PathBuf>,
}

/// Search order: (1) ./tululu.toml, (2) $XDG_CONFIG_HOME/tululu/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("tululu.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("tululu").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
            let config: Config = toml::from_str(&s)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
            return Ok(Some(config));
        }
    }
    Ok(None)
}
