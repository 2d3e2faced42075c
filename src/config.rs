//! User configuration management
//!
//! Configuration is stored in TOML format at `~/.unpm/config.toml`.
//!
//! # Examples
//!
//! ```no_run
//! use unpm::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! println!("template url: {}", config.template.url);
//! println!("clones dir: {}", config.clones_dir()?.display());
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// User configuration file (`~/.unpm/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Template settings
    #[serde(default)]
    pub template: TemplateConfig,

    /// Clone settings
    #[serde(default)]
    pub clones: ClonesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Archive URL for the package template (tar.gz)
    #[serde(default = "default_template_url")]
    pub url: String,
}

fn default_template_url() -> String {
    "https://codeload.github.com/unpm/unity-package-template/tar.gz/refs/heads/main".to_string()
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            url: default_template_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClonesConfig {
    /// Directory package repositories are cloned into
    #[serde(default = "default_clones_dir")]
    pub dir: String,
}

fn default_clones_dir() -> String {
    "~/.unpm/clones".to_string()
}

impl Default for ClonesConfig {
    fn default() -> Self {
        Self {
            dir: default_clones_dir(),
        }
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// Uses UNPM_CONFIG_DIR if set, otherwise ~/.unpm/config.toml
    pub fn default_path() -> Result<PathBuf> {
        // Check for custom config directory (useful for testing)
        if let Ok(config_dir) = std::env::var("UNPM_CONFIG_DIR") {
            return Ok(PathBuf::from(config_dir).join("config.toml"));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| Error::Other("Could not find home directory".to_string()))?;

        Ok(home.join(".unpm").join("config.toml"))
    }

    /// Load config from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Clones directory with `~` expanded
    pub fn clones_dir(&self) -> Result<PathBuf> {
        let expanded = shellexpand::tilde(&self.clones.dir);
        Ok(PathBuf::from(expanded.as_ref()))
    }
}
