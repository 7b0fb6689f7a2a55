pub mod analyze;
pub mod batch;
pub mod config;

use std::path::{Path, PathBuf};

use tracing::debug;

use yomi_core::YomiConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yomi")
        .join("config.json")
}

/// Load the configuration from `--config`, else the default file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<YomiConfig> {
    if let Some(path) = config_path {
        let path = Path::new(path);
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(YomiConfig::from_file(path)?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config from {}", default_path.display());
        Ok(YomiConfig::from_file(&default_path)?)
    } else {
        Ok(YomiConfig::default())
    }
}
