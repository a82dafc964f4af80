//! Import limits and their persistence

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Limits applied before any pixel copy happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Largest encoded file the pipeline will read from disk, in bytes.
    pub max_file_size: u64,
    /// Hard cap on either decoded dimension.
    pub max_texture_size: u32,
    /// Mip chain length the resolution cap is derived from. 1x1 counts as a
    /// mip, so a count of 14 caps dimensions at 8192, not 16384.
    pub max_mip_count: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_file_size: 999_999_999,
            max_texture_size: 8192,
            max_mip_count: 14,
        }
    }
}

impl ImportConfig {
    pub fn max_supported_resolution(&self) -> u32 {
        1 << (self.max_mip_count.max(1) - 1)
    }

    /// Resolution policy, evaluated from header dimensions before decoding
    /// pixels.
    pub fn is_resolution_valid(&self, width: u32, height: u32, allow_non_power_of_two: bool) -> bool {
        let max_resolution = self.max_supported_resolution();
        if width > max_resolution || height > max_resolution {
            return false;
        }

        if !allow_non_power_of_two && !(width.is_power_of_two() && height.is_power_of_two()) {
            return false;
        }

        width <= self.max_texture_size && height <= self.max_texture_size
    }

    pub fn load() -> Option<Self> {
        let config_path = Self::config_path()?;

        fs::read_to_string(&config_path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
    }

    pub fn save(&self) -> Option<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).ok()?;
        }

        serde_json::to_string_pretty(self)
            .ok()
            .and_then(|json| fs::write(&config_path, json).ok())
    }

    fn config_path() -> Option<PathBuf> {
        let home = std::env::home_dir()?;
        Some(home.join(".config").join("rawimage").join("config.json"))
    }
}
