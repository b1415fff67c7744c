//! Startup configuration
//!
//! Each setting resolves as: command-line flag, then environment variable
//! (both through clap), then `config.toml`, then the compiled default. The
//! shared secret has no default; startup fails without one.

use std::path::PathBuf;

use clap::Parser;
use remplay_common::api::SharedSecret;
use remplay_common::config::{load_toml_config, CompiledDefaults, TomlConfig};
use remplay_common::CommandTemplate;

use crate::error::{Error, Result};

/// Command-line arguments for remplay
#[derive(Parser, Debug, Default)]
#[command(name = "remplay")]
#[command(about = "Remote controller for a local music player")]
#[command(version)]
pub struct Args {
    /// Root folder containing music files
    #[arg(long = "source-path", env = "REMPLAY_SOURCE_PATH")]
    pub source_path: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "REMPLAY_PORT")]
    pub port: Option<u16>,

    /// Shared secret required on every mutating request
    #[arg(long, env = "REMPLAY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "REMPLAY_BIND")]
    pub bind: Option<String>,

    /// Serve locally only, without publishing a public tunnel
    #[arg(long = "no-tunnel", env = "REMPLAY_NO_TUNNEL")]
    pub no_tunnel: bool,

    /// Path to a TOML config file
    #[arg(short, long, env = "REMPLAY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// External commands used at runtime
#[derive(Debug, Clone)]
pub struct Commands {
    /// Plays one file; `{file}` is the absolute track path
    pub player: CommandTemplate,
    /// Sets mixer volume; `{volume}` is 0-100
    pub volume: CommandTemplate,
    /// Lists files recursively; `{root}` is the source path
    pub list: CommandTemplate,
    /// Starts the tunnel agent; `{port}` is the local HTTP port
    pub tunnel: CommandTemplate,
}

impl Default for Commands {
    fn default() -> Self {
        Self {
            player: CommandTemplate::new("mplayer", &["{file}"]),
            volume: CommandTemplate::new("amixer", &["sset", "Master", "{volume}%"]),
            list: CommandTemplate::new("tree", &["-f", "-N", "--noreport", "{root}"]),
            tunnel: CommandTemplate::new("ngrok", &["http", "{port}", "--log", "stdout"]),
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub source_path: String,
    pub port: u16,
    pub bind: String,
    pub secret: SharedSecret,
    pub tunnel_enabled: bool,
    pub commands: Commands,
}

impl Config {
    /// Read the config file named by `args` (or the platform default) and
    /// resolve against it
    pub fn load(args: Args) -> Result<Self> {
        let toml = load_toml_config(args.config.as_deref())?;
        Self::resolve(args, toml, CompiledDefaults::for_current_platform())
    }

    /// Merge arguments, file contents and defaults
    pub fn resolve(args: Args, toml: TomlConfig, defaults: CompiledDefaults) -> Result<Self> {
        let password = args
            .password
            .or(toml.password)
            .ok_or_else(|| Error::Config("password parameter is required".to_string()))?;
        let secret = SharedSecret::new(password)
            .ok_or_else(|| Error::Config("password must not be empty".to_string()))?;

        let source_path = args
            .source_path
            .or(toml.source_path)
            .unwrap_or(defaults.source_path);
        let source_path = normalize_root(&source_path.to_string_lossy());

        let fallback = Commands::default();
        let commands = Commands {
            player: toml.commands.player.unwrap_or(fallback.player),
            volume: toml.commands.volume.unwrap_or(fallback.volume),
            list: toml.commands.list.unwrap_or(fallback.list),
            tunnel: toml.commands.tunnel.unwrap_or(fallback.tunnel),
        };

        Ok(Self {
            source_path,
            port: args.port.or(toml.port).unwrap_or(defaults.port),
            bind: args.bind.or(toml.bind).unwrap_or(defaults.bind),
            secret,
            tunnel_enabled: !(args.no_tunnel || toml.no_tunnel.unwrap_or(false)),
            commands,
        })
    }
}

/// Strip trailing separators so prefix stripping yields clean short paths
fn normalize_root(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
