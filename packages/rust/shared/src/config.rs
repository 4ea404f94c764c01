//! Application configuration for legisharvest.
//!
//! User config lives at `~/.legisharvest/legisharvest.toml`. Every value has a
//! built-in default, so a missing file means "run with the defaults".

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "legisharvest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".legisharvest";

/// Default database file name inside the config directory.
const DB_FILE_NAME: &str = "legisharvest.db";

// ---------------------------------------------------------------------------
// Config structs (matching legisharvest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Harvest loop limits and HTTP identity.
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// Upstream source URLs.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Target index names.
    #[serde(default)]
    pub indexes: IndexesConfig,
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database path. Defaults to `~/.legisharvest/legisharvest.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

/// `[harvest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Wall-clock budget per hearings invocation, in seconds.
    #[serde(default = "default_time_budget")]
    pub time_budget_secs: u64,

    /// Oldest congress number a sweep reaches (inclusive).
    #[serde(default = "default_congress_floor")]
    pub congress_floor: u32,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// User-Agent sent with every upstream request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            time_budget_secs: default_time_budget(),
            congress_floor: default_congress_floor(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_time_budget() -> u64 {
    300
}
fn default_congress_floor() -> u32 {
    84
}
fn default_request_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.97 Safari/537.36".into()
}

/// `[sources]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// govinfo base URL; committee catalog and listings are resolved against it.
    #[serde(default = "default_govinfo_base")]
    pub govinfo_base_url: String,

    /// House representatives roster page.
    #[serde(default = "default_house_roster")]
    pub house_roster_url: String,

    /// Senate contact information XML.
    #[serde(default = "default_senate_members")]
    pub senate_members_url: String,

    /// Senate committee assignments page.
    #[serde(default = "default_senate_assignments")]
    pub senate_assignments_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            govinfo_base_url: default_govinfo_base(),
            house_roster_url: default_house_roster(),
            senate_members_url: default_senate_members(),
            senate_assignments_url: default_senate_assignments(),
        }
    }
}

fn default_govinfo_base() -> String {
    "https://www.govinfo.gov/".into()
}
fn default_house_roster() -> String {
    "https://www.house.gov/representatives".into()
}
fn default_senate_members() -> String {
    "https://www.senate.gov/general/contact_information/senators_cfm.xml".into()
}
fn default_senate_assignments() -> String {
    "https://www.senate.gov/general/committee_assignments/assignments.htm".into()
}

/// `[indexes]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexesConfig {
    #[serde(default = "default_hearings_index")]
    pub hearings: String,

    #[serde(default = "default_members_index")]
    pub members: String,
}

impl Default for IndexesConfig {
    fn default() -> Self {
        Self {
            hearings: default_hearings_index(),
            members: default_members_index(),
        }
    }
}

fn default_hearings_index() -> String {
    "federal_congressional_hearings".into()
}
fn default_members_index() -> String {
    "federal_congressional_members".into()
}

impl AppConfig {
    /// Resolve the database path, falling back to the config directory.
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join(DB_FILE_NAME)),
        }
    }

    /// Parse and validate a source URL from the `[sources]` section.
    pub fn source_url(&self, raw: &str) -> Result<url::Url> {
        url::Url::parse(raw)
            .map_err(|e| HarvestError::config(format!("invalid source URL '{raw}': {e}")))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.legisharvest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| HarvestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.legisharvest/legisharvest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HarvestError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| HarvestError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HarvestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HarvestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
