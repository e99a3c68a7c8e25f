//! Application settings and paths.
//!
//! Settings live in `settings.json` under the platform configuration
//! directory (`~/.config/netpulse` on Linux). A missing file means
//! defaults; unknown or absent fields fall back field by field.

use crate::bandwidth;
use crate::error::{ConfigError, ConfigResult};
use crate::scanner::JobConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.json";

/// Application directory paths.
#[derive(Debug, Clone)]
pub struct Paths {
    pub config_dir: PathBuf,
}

impl Paths {
    pub fn new() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "netpulse", "netpulse").ok_or(ConfigError::DirectoryNotFound)?;
        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Echoes per ping when no count is given.
    pub default_ping_count: u32,
    pub ping_timeout_ms: u64,
    /// Worker tasks per scan.
    pub max_concurrent_scans: usize,
    pub port_scan_timeout_ms: u64,
    pub discovery_timeout_ms: u64,
    pub default_ports: String,
    /// Probes per second, 0 for unlimited.
    pub rate_limit: u32,
    pub bandwidth_test_duration_secs: u64,
    pub trace_max_hops: u8,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_ping_count: 4,
            ping_timeout_ms: 1000,
            max_concurrent_scans: 50,
            port_scan_timeout_ms: 3000,
            discovery_timeout_ms: 1000,
            default_ports: "1-1000".to_string(),
            rate_limit: 0,
            bandwidth_test_duration_secs: bandwidth::DEFAULT_WINDOW.as_secs(),
            trace_max_hops: 30,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location.
    pub fn load() -> ConfigResult<Self> {
        Self::load_or_default(&Paths::new()?.settings_file())
    }

    /// Load settings from `path`, using defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        let paths = Paths::new()?;
        fs::create_dir_all(&paths.config_dir)?;
        self.save_to(&paths.settings_file())
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Scanner settings for port scans.
    pub fn job_config(&self) -> JobConfig {
        JobConfig::new()
            .with_concurrency(self.max_concurrent_scans)
            .with_timeout(Duration::from_millis(self.port_scan_timeout_ms))
            .with_rate_limit(self.rate_limit)
    }

    /// Scanner settings for host discovery.
    pub fn discovery_config(&self) -> JobConfig {
        self.job_config()
            .with_timeout(Duration::from_millis(self.discovery_timeout_ms))
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}
