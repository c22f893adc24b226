//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub config_path: PathBuf,
    pub force: bool,
}

/// Config file for `--config`: a `.toml` path is used as is, anything else
/// is treated as a directory holding `config.toml`
pub fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    match path {
        Some(p) if p.extension().is_some_and(|e| e == "toml") => p.to_path_buf(),
        Some(dir) => dir.join("config.toml"),
        None => Config::default_config_path(),
    }
}

/// Write the default configuration, refusing to overwrite without `force`
pub fn cmd_init(options: &InitOptions) -> Result<PathBuf> {
    let InitOptions { config_path, force } = options;

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    config.paths.base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_base_dir);
    config.paths.config_file = config_path.clone();
    config.save()?;

    info!("Initialized renderlens config at {}", config_path.display());
    Ok(config_path.clone())
}
