use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::checksum::HashAlgorithm;

/// Curl transfer limits (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout.
    pub timeout_secs: u64,
    /// Abort if the rate stays below this many bytes/sec for `low_speed_time_secs`.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
    pub max_redirections: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 600,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            max_redirections: 10,
        }
    }
}

impl TransferConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }
}

/// Where resolved assets live. `Durable` keeps verified copies in `cache_dir`;
/// `Remote` has no local storage and serves assets straight from their URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    Durable,
    Remote,
}

/// Global configuration loaded from `~/.config/acache/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcacheConfig {
    #[serde(default)]
    pub storage: StorageMode,
    /// Directory for downloaded assets. Defaults to `$XDG_CACHE_HOME/acache/assets`.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Directory holding assets shipped with the application (`asset_<hash>.<kind>`).
    #[serde(default)]
    pub embedded_dir: Option<PathBuf>,
    /// Asset manifest (TOML or JSON) used to resolve module identifiers.
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    /// Device pixel ratio used to pick among scaled variants.
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f32,
    /// Optional transfer limits; if missing, built-in defaults are used.
    #[serde(default)]
    pub transfer: Option<TransferConfig>,
}

fn default_pixel_ratio() -> f32 {
    1.0
}

impl Default for AcacheConfig {
    fn default() -> Self {
        Self {
            storage: StorageMode::Durable,
            cache_dir: None,
            embedded_dir: None,
            manifest: None,
            hash_algorithm: HashAlgorithm::Md5,
            pixel_ratio: default_pixel_ratio(),
            transfer: None,
        }
    }
}

impl AcacheConfig {
    /// Configured cache dir, or the XDG default (created if missing).
    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("acache")?;
        Ok(xdg_dirs.create_cache_directory("assets")?)
    }

    pub fn transfer_or_default(&self) -> TransferConfig {
        self.transfer.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("acache")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AcacheConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AcacheConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: AcacheConfig = toml::from_str(&data)?;
    Ok(cfg)
}
