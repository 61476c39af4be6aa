//! Startup configuration.
//!
//! Read from `exposure-playground.toml` in the working directory (or an
//! explicit `--config` path). Every key is optional; command-line flags are
//! applied on top by `main`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PlaygroundError, Result};
use crate::state::{UiState, Variant};

pub const DEFAULT_CONFIG_FILE: &str = "exposure-playground.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub variant: Variant,
    pub window: WindowConfig,
    /// Directory holding WGSL overrides; embedded sources are used when unset.
    pub shader_dir: Option<PathBuf>,
    pub ui: UiState,
}

impl Config {
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| PlaygroundError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PlaygroundError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `explicit` if given, otherwise the default file if present,
    /// otherwise built-in defaults. Returns the file actually read.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load_from_path(path)?, Some(path.to_path_buf())));
        }

        let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            let config = Self::load_from_path(&candidate)?;
            return Ok((config, Some(candidate)));
        }

        Ok((Self::default(), None))
    }
}
