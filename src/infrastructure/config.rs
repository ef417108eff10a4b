use crate::domain::error::WizardError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "research-wizard";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_enable_emoji")]
    pub enable_emoji: bool,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub quotes: QuoteConfig,
    #[serde(default)]
    pub research: ResearchConfig,
    #[serde(default)]
    pub logging: Logging,
}

/// Each freshness window is read by exactly one check: `prune` on load,
/// `subject` on select and `scan` before re-running a global scan.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub path: Option<String>,
    #[serde(default = "default_prune_window_secs")]
    pub prune_window_secs: u64,
    #[serde(default = "default_subject_window_secs")]
    pub subject_window_secs: u64,
    #[serde(default = "default_scan_window_secs")]
    pub scan_window_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuoteConfig {
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(default = "default_quote_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ResearchConfig {
    pub spool_dir: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Logging {
    #[serde(default = "default_enable")]
    pub enable: bool,
    pub path: Option<String>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl CacheConfig {
    pub fn prune_window(&self) -> Duration {
        Duration::from_secs(self.prune_window_secs)
    }

    pub fn subject_window(&self) -> Duration {
        Duration::from_secs(self.subject_window_secs)
    }

    pub fn scan_window(&self) -> Duration {
        Duration::from_secs(self.scan_window_secs)
    }

    /// True when a scan could be considered fresh by its view while the
    /// store would already prune it on the next start.
    pub fn windows_disagree(&self) -> bool {
        self.scan_window_secs > self.prune_window_secs
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            path: None,
            prune_window_secs: default_prune_window_secs(),
            subject_window_secs: default_subject_window_secs(),
            scan_window_secs: default_scan_window_secs(),
        }
    }
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            enable: true,
            endpoint: default_quote_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            enable: true,
            path: None,
            level: "WARN".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            enable_emoji: true,
            cache: CacheConfig::default(),
            quotes: QuoteConfig::default(),
            research: ResearchConfig::default(),
            logging: Logging::default(),
        }
    }
}

// Defaults
fn default_theme() -> String {
    "default".to_string()
}
fn default_enable_emoji() -> bool {
    true
}
fn default_namespace() -> String {
    "invest_ai_persistent_cache_v4".to_string()
}
fn default_prune_window_secs() -> u64 {
    10 * 60
}
fn default_subject_window_secs() -> u64 {
    10 * 60
}
fn default_scan_window_secs() -> u64 {
    6 * 60 * 60
}
fn default_quote_endpoint() -> String {
    "https://m.stock.naver.com/api/stock".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_enable() -> bool {
    true
}
fn default_log_level() -> String {
    "WARN".to_string()
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
}

/// Cache database path: `[cache] path` if set, otherwise the config directory.
pub fn get_database_path(config: &Config) -> PathBuf {
    if let Some(path) = config.cache.path.as_deref().filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("cache.db")
}

pub fn get_spool_dir(config: &Config) -> PathBuf {
    if let Some(dir) = config.research.spool_dir.as_deref().filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("spool")
}

pub fn parse_config(content: &str) -> Result<Config, WizardError> {
    Ok(toml::from_str::<Config>(content)?)
}

pub fn load_config() -> Result<Config, WizardError> {
    let config_path = get_config_path();

    if let Some(path) = config_path {
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            match parse_config(&content) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    eprintln!(
                        "Warning: Failed to parse config file: {}. Using defaults.",
                        e
                    );
                }
            }
        }
    }

    Ok(Config::default())
}

pub fn generate_config_sample() -> Result<(), WizardError> {
    let config_path = get_config_path();

    if let Some(path) = config_path {
        if path.exists() {
            eprintln!("Config file already exists at: {}", path.display());
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let sample = Config::default();
        let toml_content = toml::to_string_pretty(&sample)
            .map_err(|e| WizardError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, toml_content)
            .map_err(|e| WizardError::Config(format!("Failed to write config file: {}", e)))?;
        println!("Generated config file at: {}", path.display());
    } else {
        return Err(WizardError::Config(
            "Cannot determine config directory".to_string(),
        ));
    }

    Ok(())
}
