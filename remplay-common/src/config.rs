//! Configuration file loading and compiled defaults
//!
//! Settings resolve in this priority order (highest first):
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! Steps 1 and 2 are handled by the binary's argument parser; this module
//! provides steps 3 and 4. A missing default config file is not an error.

use crate::process::CommandTemplate;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "remplay";

/// Config file name inside [`CONFIG_DIR_NAME`]
const CONFIG_FILE_NAME: &str = "config.toml";

/// Compiled fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub source_path: PathBuf,
    pub port: u16,
    pub bind: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let source_path = dirs::audio_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Music")))
            .unwrap_or_else(|| PathBuf::from("./music"));

        Self {
            source_path,
            port: 3003,
            bind: "0.0.0.0".to_string(),
        }
    }
}

/// Contents of `config.toml`
///
/// Every field is optional; anything left out falls through to the
/// compiled default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub source_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub bind: Option<String>,
    pub no_tunnel: Option<bool>,
    #[serde(default)]
    pub commands: CommandsConfig,
}

/// External command overrides (`[commands.*]` tables)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandsConfig {
    pub player: Option<CommandTemplate>,
    pub volume: Option<CommandTemplate>,
    pub list: Option<CommandTemplate>,
    pub tunnel: Option<CommandTemplate>,
}

/// Platform config file location, e.g. `~/.config/remplay/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the TOML config
///
/// An explicitly requested file must exist. When no path is given the
/// platform default is tried, and its absence yields an empty config.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;

    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Parse config file contents
pub fn parse_toml_config(content: &str) -> std::result::Result<TomlConfig, toml::de::Error> {
    toml::from_str(content)
}
