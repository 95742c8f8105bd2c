use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use furrow_engine::codec::DEFAULT_MAX_FRAME_BYTES;
use furrow_engine::{LogLayout, Timeouts};
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

#[derive(Debug, Parser)]
#[command(
    name = "furrow",
    version,
    about = "Watch a two-player farming simulation from the terminal."
)]
pub struct Cli {
    /// Root URL of the game server.
    #[arg(long, global = true, env = "FURROW_SERVER")]
    pub server: Option<String>,

    /// YAML config file (defaults to <config dir>/furrow/config.yaml when present).
    #[arg(long, global = true, env = "FURROW_CONFIG")]
    pub config: Option<PathBuf>,

    /// combined, interleaved or by-player.
    #[arg(long, global = true)]
    pub log_layout: Option<LogLayout>,

    #[arg(long, global = true, value_name = "SECS")]
    pub open_timeout: Option<u64>,

    #[arg(long, global = true, value_name = "SECS")]
    pub read_timeout: Option<u64>,

    #[arg(long, global = true, value_name = "SECS")]
    pub request_timeout: Option<u64>,

    #[arg(long, global = true)]
    pub no_color: bool,

    /// -v info, -vv debug, -vvv trace.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Subcommand)]
pub enum Command {
    /// Start a game and follow it until it ends (Ctrl-C stops it).
    #[default]
    Watch,
    /// Render the current game state once.
    State,
    /// Ask the server to stop the running game.
    Stop,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: Option<String>,
    pub log_layout: Option<LogLayout>,
    pub open_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub max_frame_bytes: Option<usize>,
    pub color: Option<bool>,
    pub log_level: Option<String>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("furrow").join("config.yaml"))
}

impl FileConfig {
    pub fn parse(yaml: &str) -> anyhow::Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("parse furrow config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("load config: {}", path.display()))
    }

    /// An explicit path must exist; the default location is optional.
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: Url,
    pub layout: LogLayout,
    pub timeouts: Timeouts,
    pub max_frame_bytes: usize,
    pub color: bool,
    pub log_level: Level,
}

impl Settings {
    /// Command line (and its env fallbacks) wins over the file, the file over defaults.
    pub fn resolve(cli: &Cli, file: FileConfig) -> anyhow::Result<Self> {
        let raw_server = cli
            .server
            .clone()
            .or(file.server)
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let server =
            Url::parse(&raw_server).with_context(|| format!("invalid server url: {raw_server}"))?;

        let defaults = Timeouts::default();
        let secs = |flag: Option<u64>, configured: Option<u64>, fallback: Duration| {
            flag.or(configured).map(Duration::from_secs).unwrap_or(fallback)
        };
        let timeouts = Timeouts {
            open: secs(cli.open_timeout, file.open_timeout_secs, defaults.open),
            read: secs(cli.read_timeout, file.read_timeout_secs, defaults.read),
            request: secs(cli.request_timeout, file.request_timeout_secs, defaults.request),
        };

        let log_level = match cli.verbose {
            0 => match file.log_level.as_deref() {
                Some(name) => Level::from_str(name)
                    .map_err(|_| anyhow::anyhow!("invalid log_level in config: {name}"))?,
                None => Level::WARN,
            },
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        Ok(Self {
            server,
            layout: cli.log_layout.or(file.log_layout).unwrap_or_default(),
            timeouts,
            max_frame_bytes: file.max_frame_bytes.unwrap_or(DEFAULT_MAX_FRAME_BYTES),
            color: !cli.no_color && file.color.unwrap_or(true),
            log_level,
        })
    }
}
