//! Saved configurations and the pointer to the active one.
//!
//! `save` writes `<output_dir>/conf.json` and records its path in a small
//! pointer file, so later commands (`apply`, `log`) can find the last saved
//! configuration without repeating every flag.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config_file::InstallConfig;
use crate::error::{InstallError, Result};

/// Default location of the pointer file
pub const DEFAULT_POINTER_PATH: &str = "/tmp/.cache/config-location";

/// File name of a saved configuration inside its output dir
pub const CONFIG_FILENAME: &str = "conf.json";

/// Log written by `openshift-install` into its working directory
pub const INSTALL_LOG_FILENAME: &str = ".openshift_install.log";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    pointer_path: PathBuf,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(DEFAULT_POINTER_PATH)
    }
}

impl ConfigStore {
    pub fn new(pointer_path: impl Into<PathBuf>) -> Self {
        Self {
            pointer_path: pointer_path.into(),
        }
    }

    pub fn pointer_path(&self) -> &Path {
        &self.pointer_path
    }

    /// Write the configuration into its output dir and make it the active one.
    pub fn save(&self, config: &InstallConfig) -> Result<PathBuf> {
        fs::create_dir_all(&config.output_dir)?;
        let path = std::path::absolute(config.output_dir.join(CONFIG_FILENAME))?;
        config.save_to_file(&path)?;

        if let Some(parent) = self.pointer_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.pointer_path, path.display().to_string())?;
        info!(
            "Saved configuration to {} (pointer {})",
            path.display(),
            self.pointer_path.display()
        );
        Ok(path)
    }

    /// Path of the active configuration, from the pointer file.
    pub fn active_path(&self) -> Result<PathBuf> {
        let content = fs::read_to_string(&self.pointer_path).map_err(|e| {
            InstallError::config(format!(
                "No saved configuration found ({}: {}). Run `save` first.",
                self.pointer_path.display(),
                e
            ))
        })?;
        let path = content.trim();
        if path.is_empty() {
            return Err(InstallError::config(format!(
                "Pointer file {} is empty",
                self.pointer_path.display()
            )));
        }
        Ok(PathBuf::from(path))
    }

    pub fn load_active(&self) -> Result<InstallConfig> {
        InstallConfig::load_from_file(self.active_path()?)
    }

    /// Contents of the installer log next to the active configuration.
    pub fn read_install_log(&self) -> Result<String> {
        let config_path = self.active_path()?;
        let dir = config_path.parent().unwrap_or(Path::new("."));
        let log = dir.join(INSTALL_LOG_FILENAME);
        fs::read_to_string(&log).map_err(|e| {
            InstallError::config(format!("Could not read installer log {}: {}", log.display(), e))
        })
    }
}
