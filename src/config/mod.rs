//! Configuration management for WL Playground
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files. Every section and every field falls back to its
//! default, so an empty file (or no file at all) gives the stock 640x480
//! window.

use crate::animation::{Direction, Grayscale};
use crate::buffer::{BufferLayout, BYTES_PER_PIXEL, SLOT_COUNT};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PlaygroundConfig {
    /// Window geometry and identity
    #[serde(default)]
    pub window: WindowConfig,

    /// Background animation
    #[serde(default)]
    pub animation: AnimationConfig,

    /// Shared memory naming
    #[serde(default)]
    pub shm: ShmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Buffer width (pixels)
    pub width: u32,

    /// Buffer height (pixels)
    pub height: u32,

    /// Toplevel title, set once at startup
    pub title: String,

    /// Toplevel app id
    pub app_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    /// Grayscale level of the first frame (0-255)
    pub initial_level: u8,

    /// Initial direction ("lighten" or "darken")
    pub initial_direction: Direction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShmConfig {
    /// Prefix for shm_open names; must start with '/'
    pub name_prefix: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            title: "WL Playground".to_string(),
            app_id: "wl-playground".to_string(),
        }
    }
}

impl WindowConfig {
    /// Buffer layout for this window size
    pub fn layout(&self) -> BufferLayout {
        BufferLayout::new(self.width, self.height)
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            initial_level: 0,
            initial_direction: Direction::Lighten,
        }
    }
}

impl AnimationConfig {
    pub fn initial_shade(&self) -> Grayscale {
        Grayscale::new(self.initial_level, self.initial_direction)
    }
}

impl Default for ShmConfig {
    fn default() -> Self {
        Self {
            name_prefix: crate::shm::DEFAULT_NAME_PREFIX.to_string(),
        }
    }
}

impl PlaygroundConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_home(path.as_ref())?;

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: PlaygroundConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            anyhow::bail!(
                "Invalid window size {}x{}: both dimensions must be non-zero",
                self.window.width,
                self.window.height
            );
        }

        // wl_shm.create_pool takes the pool size as an i32
        let pool_size = u64::from(self.window.width)
            * u64::from(self.window.height)
            * BYTES_PER_PIXEL as u64
            * SLOT_COUNT as u64;
        if pool_size > i32::MAX as u64 {
            anyhow::bail!(
                "Invalid window size {}x{}: pool of {} bytes exceeds the wl_shm limit",
                self.window.width,
                self.window.height,
                pool_size
            );
        }

        let prefix = &self.shm.name_prefix;
        if !prefix.starts_with('/') || prefix[1..].contains('/') || prefix.len() < 2 {
            anyhow::bail!(
                "Invalid shm name_prefix {:?}: expected a single '/name' component",
                prefix
            );
        }
        if prefix.contains('\0') {
            anyhow::bail!("Invalid shm name_prefix: contains a NUL byte");
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}

/// Expand a leading `~` to `$HOME`
fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Ok(Path::new(&home).join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}


#[cfg(test)]
mod property_tests;
