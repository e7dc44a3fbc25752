//! Configuration management for docdash using the prefer crate.
//!
//! Settings are layered: built-in defaults, then a config file (given with
//! `--config` or discovered by prefer), then environment and command-line
//! overrides carried in [`LoadOptions`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default backend address.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Default state filename inside the data directory.
pub const STATE_FILENAME: &str = "state.json";

/// Largest page size accepted for document listings.
pub const MAX_PAGE_SIZE: usize = 200;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Base URL of the document API.
    pub api_url: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Lifetime of cached analytics reads in seconds.
    pub cache_ttl_secs: u64,
    /// Default page size for document listings.
    pub page_size: usize,
    /// File holding the active session, identity and UI flags.
    pub state_file: PathBuf,
    /// Public dashboard address used when printing shareable links.
    pub dashboard_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        let state_file = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docdash")
            .join(STATE_FILENAME);

        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: 30,
            cache_ttl_secs: 300,
            page_size: 20,
            state_file,
            dashboard_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Backend base URL.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "api")]
    pub api_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Cache TTL in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
    /// Listing page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
    /// State file path; `~` and relative paths are resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<String>,
    /// Dashboard address for shareable links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_url: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a docdash config file in the standard locations.
    pub async fn load() -> Self {
        match prefer::load("docdash").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Ignoring config {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file, parsed by extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => {
                toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {}", e))
            }
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Directory of the config file, used for relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Expand `~` and resolve relative paths against `base_dir`.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref url) = self.api_url {
            settings.api_url = url.clone();
            // The dashboard is usually served by the same host.
            settings.dashboard_url = url.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ttl) = self.cache_ttl_secs {
            settings.cache_ttl_secs = ttl;
        }
        if let Some(size) = self.page_size {
            settings.page_size = (size as usize).clamp(1, MAX_PAGE_SIZE);
        }
        if let Some(ref state_file) = self.state_file {
            settings.state_file = self.resolve_path(state_file, base_dir);
        }
        if let Some(ref url) = self.dashboard_url {
            settings.dashboard_url = url.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// `--api-url` / `DOCDASH_API_URL`.
    pub api_url: Option<String>,
    /// `--state-file` / `DOCDASH_STATE_FILE`.
    pub state_file: Option<PathBuf>,
}

async fn load_file_config(options: &LoadOptions) -> Result<Config, String> {
    match options.config_path {
        // An explicit file must load; discovery failures fall back silently.
        Some(ref path) => Config::load_from_path(path).await,
        None => Ok(Config::load().await),
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), String> {
    let config = load_file_config(&options).await?;
    let mut settings = Settings::default();

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(url) = options.api_url.filter(|s| !s.is_empty()) {
        tracing::debug!("Using API URL override: {}", url);
        if config.dashboard_url.is_none() {
            settings.dashboard_url = url.clone();
        }
        settings.api_url = url;
    }
    if let Some(path) = options.state_file {
        let path = config.resolve_path(&path.to_string_lossy(), &base_dir);
        tracing::debug!("Using state file override: {}", path.display());
        settings.state_file = path;
    }

    Ok((settings, config))
}
