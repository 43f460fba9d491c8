use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};

/// the only repository format this crate reads and writes
pub const REPOSITORY_FORMAT_VERSION: u32 = 0;

/// default zlib level, matching git
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// repository configuration stored in config.toml
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,
}

/// the `[core]` table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub repository_format_version: u32,
    #[serde(default)]
    pub filemode: bool,
    #[serde(default)]
    pub bare: bool,
    /// zlib level used for new objects, 0-9
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

fn default_compression_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            repository_format_version: REPOSITORY_FORMAT_VERSION,
            filemode: false,
            bare: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl CoreConfig {
    /// compression level clamped to the range zlib accepts
    pub fn compression(&self) -> u32 {
        self.compression_level.min(9)
    }
}

impl Config {
    /// load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).with_path(path)?;
        Ok(())
    }
}
