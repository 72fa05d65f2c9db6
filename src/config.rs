use crate::error::{AdbError, Result};
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5037;
/// Capacity of the pipe between a shell demultiplexer and its reader.
pub const DEFAULT_SHELL_BUFFER: usize = 64 * 1024;

const PORT_ENV: &str = "ANDROID_ADB_SERVER_PORT";

/// Settings for one client. Every connection opened by the client carries
/// its own copy, so sessions with different verbosity can coexist.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Log every request, status token and frame header at debug level.
    pub debug: bool,
    pub shell_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            shell_buffer: DEFAULT_SHELL_BUFFER,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_shell_buffer(mut self, capacity: usize) -> Self {
        self.shell_buffer = capacity.max(1);
        self
    }

    /// Load `~/.adbwire.toml` if present, then apply the port override from
    /// the environment.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        if let Ok(port) = std::env::var(PORT_ENV) {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| AdbError::Config(format!("{} is not a port: {}", PORT_ENV, port)))?;
        }

        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", path);
        let content = fs::read_to_string(path)
            .map_err(|e| AdbError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: ClientConfig = toml::from_str(&content)
            .map_err(|e| AdbError::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        debug!("Parsed config: {:?}", config);
        Ok(config)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".adbwire.toml"))
    }

    /// Address in `host:port` form, with `localhost` pinned to IPv4 the way
    /// the adb server binds it.
    pub fn server_address(&self) -> String {
        let host = if self.host == "localhost" {
            "127.0.0.1"
        } else {
            self.host.as_str()
        };
        format!("{}:{}", host, self.port)
    }
}
