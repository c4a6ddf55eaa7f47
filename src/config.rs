use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_MERGED_FILE, PROCESSED_SUFFIX};
use crate::domain::Platform;
use crate::error::{BillError, Result};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "bill_cleaner.toml";

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "BILL_CLEANER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub merged_file_name: String,
    pub write_report: bool,
    pub platforms: PlatformsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformsConfig {
    pub alipay: PlatformConfig,
    pub wechat: PlatformConfig,
    pub jingdong: PlatformConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub enabled: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/input"),
            output_dir: PathBuf::from("data/output"),
            log_dir: PathBuf::from("data/log"),
            merged_file_name: DEFAULT_MERGED_FILE.to_string(),
            write_report: true,
            platforms: PlatformsConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path`, else `$BILL_CLEANER_CONFIG`, else `bill_cleaner.toml`.
    /// A missing file yields defaults; an explicitly named one must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var(CONFIG_ENV_VAR) {
                Ok(p) => (PathBuf::from(p), true),
                Err(_) => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            },
        };

        if !config_path.exists() {
            if explicit {
                return Err(BillError::Config(format!(
                    "Config file '{}' does not exist",
                    config_path.display()
                )));
            }
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            BillError::Config(format!("Failed to read config file '{}': {}", config_path.display(), e))
        })?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let name = self.merged_file_name.trim();
        if name.is_empty() {
            return Err(BillError::Config("merged_file_name must not be empty".to_string()));
        }
        if name.ends_with(PROCESSED_SUFFIX) {
            return Err(BillError::Config(format!(
                "merged_file_name must not end with '{}'",
                PROCESSED_SUFFIX
            )));
        }
        Ok(())
    }

    pub fn is_enabled(&self, platform: Platform) -> bool {
        match platform {
            Platform::Alipay => self.platforms.alipay.enabled,
            Platform::Wechat => self.platforms.wechat.enabled,
            Platform::Jingdong => self.platforms.jingdong.enabled,
        }
    }

    /// Create input, output and log directories if missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.input_dir, &self.output_dir, &self.log_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
