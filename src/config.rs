//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the site root next to the pages it configures:
//!
//! ```text
//! site/
//! ├── config.toml              # Optional; overrides stock defaults
//! ├── index.html
//! ├── kitchen.html
//! ├── content/
//! │   ├── home.json
//! │   └── kitchen.json
//! └── assets/optimized/images/
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [loader]
//! content_dir = "content"   # Directory (or URL path) holding page documents
//! # base_url = "https://example.com"  # Fetch documents over HTTP instead
//! grace_period_ms = 100     # Pause before the injection pass
//!
//! [routes]
//! default = "home"          # Document for pages not listed below
//!
//! [routes.pages]            # Extra page → document entries
//! # "bathroom.html" = "bathroom"
//!
//! [images]
//! base_dir = "assets/optimized/images"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the configuration file in the site root.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Where and how page documents are fetched.
    pub loader: LoaderConfig,
    /// Page → document routing.
    pub routes: RoutesConfig,
    /// Responsive image naming.
    pub images: ImagesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loader.content_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "loader.content_dir must not be empty".into(),
            ));
        }
        if let Some(url) = &self.loader.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "loader.base_url must start with http:// or https://, got {url:?}"
                )));
            }
        }
        if self.routes.default.trim().is_empty() {
            return Err(ConfigError::Validation(
                "routes.default must not be empty".into(),
            ));
        }
        if let Some((page, _)) = self.routes.pages.iter().find(|(_, id)| id.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "routes.pages.{page:?} must name a document"
            )));
        }
        if self.images.base_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "images.base_dir must not be empty".into(),
            ));
        }
        if self.images.base_dir.contains("..") {
            return Err(ConfigError::Validation(
                "images.base_dir must not contain '..'".into(),
            ));
        }
        Ok(())
    }
}

/// Content document loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Directory holding `{page}.json`, relative to the site root (or to
    /// `base_url` when fetching over HTTP).
    pub content_dir: String,
    /// When set, documents are fetched from `{base_url}/{content_dir}/`.
    pub base_url: Option<String>,
    /// Pause before the injection pass, in milliseconds.
    pub grace_period_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            content_dir: "content".to_string(),
            base_url: None,
            grace_period_ms: 100,
        }
    }
}

/// Page → document routing on top of the built-in table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    /// Document used for any page not in the table.
    pub default: String,
    /// Additional or overriding `page file → document id` entries.
    pub pages: BTreeMap<String, String>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            default: "home".to_string(),
            pages: BTreeMap::new(),
        }
    }
}

/// Responsive image settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Directory (URL path, relative to the site root) holding optimized images.
    pub base_dir: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            base_dir: crate::images::DEFAULT_BASE_DIR.to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of pages bound in parallel by `build`.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the site root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# content-bind configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content documents
# ---------------------------------------------------------------------------
[loader]
# Directory holding one {page}.json per page, relative to the site root.
content_dir = "content"

# Fetch documents over HTTP instead of reading them from disk. Requests carry
# a cache-busting ?t= parameter and Cache-Control: no-cache.
# base_url = "https://example.com"

# Pause before the injection pass, in milliseconds.
grace_period_ms = 100

# ---------------------------------------------------------------------------
# Page routing
# ---------------------------------------------------------------------------
[routes]
# Document used for any page that is not listed.
# Built in: index.html -> home, kitchen.html -> kitchen,
#           master-bedroom.html -> master-bedroom, closet.html -> closet,
#           kids-bedroom.html -> kids
default = "home"

# Extra page -> document entries (override the built-in ones too).
[routes.pages]
# "bathroom.html" = "bathroom"

# ---------------------------------------------------------------------------
# Responsive images
# ---------------------------------------------------------------------------
[images]
# Directory of optimized images, named {base}-{width}.avif / .webp
base_dir = "assets/optimized/images"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum pages bound in parallel by `build`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
