use serde::{Deserialize, Serialize};
use std::fs;

use crate::paths;

/// Root configuration structure for cpdeploy.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CpdeployConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// All configurable defaults that can be overridden via cpdeploy.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_api")]
    pub api: ApiConfig,

    #[serde(default = "default_wordpress")]
    pub wordpress: WordpressConfig,

    #[serde(default = "default_salts")]
    pub salts: SaltsConfig,

    #[serde(default = "default_permissions")]
    pub permissions: PermissionsConfig,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            api: default_api(),
            wordpress: default_wordpress(),
            salts: default_salts(),
            permissions: default_permissions(),
        }
    }
}

/// Configuration for the control-panel API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub default_port: u16,

    /// Per-call timeout. WP-CLI installs can be slow, so this is generous.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whole-deployment deadline, checked between steps. `null` disables it.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: Option<u64>,

    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Configuration for the WordPress install itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordpressConfig {
    #[serde(default = "default_download_url")]
    pub download_url: String,

    #[serde(default = "default_db_charset")]
    pub db_charset: String,

    #[serde(default = "default_db_host")]
    pub db_host: String,

    #[serde(default = "default_privileges")]
    pub privileges: String,

    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,

    #[serde(default = "default_elementor_slug")]
    pub elementor_slug: String,
}

/// How fallback security constants are generated when the key service is down
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SaltMode {
    /// Eight independent random values.
    #[default]
    Strict,
    /// One random value reused for all eight constants.
    Faithful,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaltsConfig {
    #[serde(default = "default_salt_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub mode: SaltMode,

    #[serde(default = "default_salt_length")]
    pub length: usize,
}

/// Octal modes applied by the permission hardening step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    #[serde(default = "default_dir_mode")]
    pub dir_mode: String,

    #[serde(default = "default_file_mode")]
    pub file_mode: String,

    #[serde(default = "default_config_mode")]
    pub config_mode: String,
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_api() -> ApiConfig {
    ApiConfig {
        default_port: default_api_port(),
        timeout_secs: default_timeout_secs(),
        deadline_secs: default_deadline_secs(),
        accept_invalid_certs: false,
    }
}

fn default_api_port() -> u16 {
    2083
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_deadline_secs() -> Option<u64> {
    Some(1800)
}

fn default_wordpress() -> WordpressConfig {
    WordpressConfig {
        download_url: default_download_url(),
        db_charset: default_db_charset(),
        db_host: default_db_host(),
        privileges: default_privileges(),
        table_prefix: default_table_prefix(),
        uploads_dir: default_uploads_dir(),
        elementor_slug: default_elementor_slug(),
    }
}

fn default_download_url() -> String {
    "https://wordpress.org/latest.zip".to_string()
}

fn default_db_charset() -> String {
    "utf8".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_privileges() -> String {
    "ALL PRIVILEGES".to_string()
}

fn default_table_prefix() -> String {
    "wp_".to_string()
}

fn default_uploads_dir() -> String {
    "wp-content/uploads".to_string()
}

fn default_elementor_slug() -> String {
    "elementor".to_string()
}

fn default_salts() -> SaltsConfig {
    SaltsConfig {
        endpoint: default_salt_endpoint(),
        mode: SaltMode::default(),
        length: default_salt_length(),
    }
}

fn default_salt_endpoint() -> String {
    "https://api.wordpress.org/secret-key/1.1/salt/".to_string()
}

fn default_salt_length() -> usize {
    64
}

fn default_permissions() -> PermissionsConfig {
    PermissionsConfig {
        dir_mode: default_dir_mode(),
        file_mode: default_file_mode(),
        config_mode: default_config_mode(),
    }
}

fn default_dir_mode() -> String {
    "755".to_string()
}

fn default_file_mode() -> String {
    "644".to_string()
}

fn default_config_mode() -> String {
    "600".to_string()
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load defaults, merging file config with built-in defaults.
/// If cpdeploy.json is missing or invalid, silently returns built-in defaults.
pub fn load_defaults() -> Defaults {
    load_config().defaults
}

/// Load the full cpdeploy.json config, falling back to defaults on any error.
pub fn load_config() -> CpdeployConfig {
    match load_config_from_file() {
        Ok(config) => config,
        Err(err) if err.code == crate::ErrorCode::ConfigInvalidJson => {
            log_status!("config", "{}; using built-in defaults", err.message);
            CpdeployConfig::default()
        }
        Err(_) => CpdeployConfig::default(),
    }
}

fn load_config_from_file() -> crate::Result<CpdeployConfig> {
    let path = paths::cpdeploy_json()?;

    if !path.exists() {
        return Err(crate::Error::other("cpdeploy.json not found"));
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    parse_config(&content)
}

/// Parse a cpdeploy.json document. Missing sections and keys take built-in values.
pub fn parse_config(content: &str) -> crate::Result<CpdeployConfig> {
    serde_json::from_str(content)
        .map_err(|e| crate::Error::config_invalid_json("cpdeploy.json", e))
}

/// Save config to cpdeploy.json file (creates if missing).
pub fn save_config(config: &CpdeployConfig) -> crate::Result<()> {
    let path = paths::cpdeploy_json()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            crate::Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
        })?;
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| {
        crate::Error::internal_json(e.to_string(), Some("serialize cpdeploy.json".to_string()))
    })?;

    crate::utils::io::write_file_atomic(&path, &content, "write cpdeploy.json")
}

/// Check if cpdeploy.json file exists
pub fn config_exists() -> bool {
    paths::cpdeploy_json()
        .map(|p| p.exists())
        .unwrap_or(false)
}

/// Delete cpdeploy.json file (reset to defaults)
pub fn reset_config() -> crate::Result<bool> {
    let path = paths::cpdeploy_json()?;

    if path.exists() {
        fs::remove_file(&path).map_err(|e| {
            crate::Error::internal_io(e.to_string(), Some(format!("delete {}", path.display())))
        })?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Get the path to cpdeploy.json (for display purposes)
pub fn config_path() -> crate::Result<String> {
    Ok(paths::cpdeploy_json()?.display().to_string())
}

/// Get built-in defaults (ignoring any file config)
pub fn builtin_defaults() -> Defaults {
    Defaults::default()
}
