use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::DEFAULT_MANIFEST_NAME;
use super::error::ConfigError;
use super::record::ChipId;

/// Structure representing the application configuration. Contains the raw data location and
/// the chip of interest.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub raw_data_root: PathBuf,
    pub manifest_name: String,
    pub days: Option<Vec<String>>,
    pub chip_group: String,
    pub chip_number: u32,
}

impl Default for Config {
    /// Generate a new Config object. All fields will be empty/invalid
    fn default() -> Self {
        Self {
            raw_data_root: PathBuf::from("None"),
            manifest_name: String::from(DEFAULT_MANIFEST_NAME),
            days: None,
            chip_group: String::from(""),
            chip_number: 0,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    pub fn chip(&self) -> ChipId {
        ChipId::new(&self.chip_group, self.chip_number)
    }

    /// Get the day folders to load, sorted by name.
    ///
    /// If no days are listed, every folder under the raw data root is a day.
    pub fn day_directories(&self) -> Result<Vec<PathBuf>, ConfigError> {
        if !self.raw_data_root.exists() {
            return Err(ConfigError::BadFilePath(self.raw_data_root.clone()));
        }

        let mut day_dirs: Vec<PathBuf> = match &self.days {
            Some(days) => {
                let mut dirs = Vec::with_capacity(days.len());
                for day in days {
                    let day_dir = self.raw_data_root.join(day);
                    if !day_dir.is_dir() {
                        return Err(ConfigError::BadFilePath(day_dir));
                    }
                    dirs.push(day_dir);
                }
                dirs
            }
            None => {
                let mut dirs = Vec::new();
                for item in self.raw_data_root.read_dir()? {
                    let item_path = item?.path();
                    if item_path.is_dir() {
                        dirs.push(item_path);
                    }
                }
                dirs
            }
        };

        day_dirs.sort();
        day_dirs.dedup();
        Ok(day_dirs)
    }
}
