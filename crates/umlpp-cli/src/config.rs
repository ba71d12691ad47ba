//! Configuration file loading.
//!
//! Finds and loads the TOML configuration from an explicit path, the local
//! directory or the platform configuration directory. On top of the engine
//! settings the CLI adds `[stdlib] index`, the location of the standard
//! library listing.
//!
//! ```toml
//! [fetch]
//! timeout_ms = 5000
//!
//! [stdlib]
//! extension = ".puml"
//! index = "https://example.com/stdlib/index.json"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use umlpp::{
    EngineConfig, UmlppError,
    config::{FetchConfig, StdlibConfig},
};

/// Problems with the configuration file itself.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("configuration file {} does not exist", .0.display())]
    MissingFile(PathBuf),
}

impl From<ConfigError> for UmlppError {
    fn from(err: ConfigError) -> Self {
        UmlppError::Io(std::io::Error::other(err.to_string()))
    }
}

/// CLI configuration: the engine sections plus the stdlib index location.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    fetch: FetchConfig,

    #[serde(default)]
    stdlib: CliStdlibConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CliStdlibConfig {
    #[serde(flatten)]
    engine: StdlibConfig,

    /// Path or URL of a JSON `[{"path": ..., "url": ...}]` listing
    #[serde(default)]
    index: Option<String>,
}

impl CliConfig {
    pub fn engine(&self) -> EngineConfig {
        EngineConfig::new(self.fetch.clone(), self.stdlib.engine.clone())
    }

    pub fn stdlib_index(&self) -> Option<&str> {
        self.stdlib.index.as_deref()
    }
}

/// Load the CLI configuration.
///
/// An explicit path must exist. Otherwise the first existing file among
/// `umlpp/config.toml` in the working directory and `config.toml` in the
/// platform configuration directory is used, falling back to defaults.
///
/// # Errors
///
/// Fails when the explicit file is missing or any chosen file does not parse.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<CliConfig, UmlppError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading explicit configuration");
        return load_config_file(path);
    }

    for (path, origin) in search_paths() {
        if path.is_file() {
            info!(path = path.display().to_string(), origin; "Loading configuration");
            return load_config_file(&path);
        }
        debug!(path = path.display().to_string(), origin; "No configuration here");
    }

    debug!("Using default configuration");
    Ok(CliConfig::default())
}

fn search_paths() -> Vec<(PathBuf, &'static str)> {
    let mut paths = vec![(PathBuf::from("umlpp/config.toml"), "local")];
    match ProjectDirs::from("com", "umlpp", "umlpp") {
        Some(dirs) => paths.push((dirs.config_dir().join("config.toml"), "platform")),
        None => debug!("No platform configuration directory"),
    }
    paths
}

fn load_config_file(path: &Path) -> Result<CliConfig, UmlppError> {
    if !path.is_file() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }
    let content = fs::read_to_string(path)?;
    parse_config(path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<CliConfig, UmlppError> {
    toml::from_str(content).map_err(|err| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
        .into()
    })
}
