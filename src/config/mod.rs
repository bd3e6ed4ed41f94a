//! Configuration for kitprobe.
//!
//! This is the concrete shape of the "user-provided set of search hints"
//! §1 refers to but never structures: extra scan directories, MinGW
//! search roots, a `cmake` path override, and an architecture list
//! override for the Vendor Kit Builder (§4.E).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Caller-provided search hints loaded from a TOML config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KitProbeConfig {
    /// Additional directories scanned by the Directory Scanner (§4.C)
    /// beyond `PATH`.
    #[serde(default)]
    pub extra_scan_dirs: Vec<PathBuf>,

    /// `minGWSearchDirs` (§4.F): roots that get `/bin` appended and are
    /// scanned only on Windows.
    #[serde(default)]
    pub min_gw_search_dirs: Vec<PathBuf>,

    /// Explicit `cmake` path, bypassing `resolve_cmake`'s `auto`
    /// discovery (§4.A) when set.
    #[serde(default)]
    pub cmake_path: Option<PathBuf>,

    /// Overrides the fixed architecture list the Vendor Kit Builder
    /// iterates (§4.E / §6) when non-empty.
    #[serde(default)]
    pub architectures: Vec<String>,
}

impl Default for KitProbeConfig {
    fn default() -> Self {
        Self {
            extra_scan_dirs: Vec::new(),
            min_gw_search_dirs: Vec::new(),
            cmake_path: None,
            architectures: Vec::new(),
        }
    }
}

/// The default config-file path: `<roaming config dir>/kitprobe/config.toml`.
pub fn get_config_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("dev", "kitprobe", "kitprobe") {
        proj_dirs.config_dir().join("config.toml")
    } else {
        dirs_fallback().join("config.toml")
    }
}

fn dirs_fallback() -> PathBuf {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\kitprobe"))
            .join("kitprobe")
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join(".config")
            .join("kitprobe")
    }
}

/// Loads configuration from disk; missing file yields [`KitProbeConfig::default`].
pub fn load_config() -> Result<KitProbeConfig> {
    let path = get_config_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        let config: KitProbeConfig = toml::from_str(&content)
            .map_err(|e| crate::error::KitError::Config(e.to_string()))?;
        return Ok(config);
    }
    Ok(KitProbeConfig::default())
}

/// Saves configuration to disk in TOML format, creating parent
/// directories as needed.
pub fn save_config(config: &KitProbeConfig) -> Result<()> {
    let path = get_config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| crate::error::KitError::Config(e.to_string()))?;
    std::fs::write(&path, content)?;
    Ok(())
}
