//! Configuration structures for tcp-relay.
//!
//! A [`SessionConfig`] is assembled once, before any socket exists, from
//! built-in defaults, an optional TOML [`FileConfig`] and the command line.
//! It is never mutated afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Wildcard bind address used when none is given.
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Port used when none is given.
pub const DEFAULT_PORT: u16 = 3000;

/// Pending connection queue length for the listening socket.
pub const DEFAULT_BACKLOG: i32 = 10;

/// Size of the reusable transfer buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Which side of the relay this process plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Connect out and stream input to the peer.
    Send,
    /// Accept a peer and stream its bytes to output.
    Listen,
}

/// Knobs shared by both directions of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Bytes moved per read/write iteration.
    pub buffer_size: usize,

    /// Listen backlog.
    pub backlog: i32,

    /// Connect/read/write timeout. `None` blocks indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            backlog: DEFAULT_BACKLOG,
            timeout: None,
        }
    }
}

/// Immutable description of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Send or listen.
    pub mode: Mode,

    /// Target address (send) or bind address (listen).
    pub address: String,

    /// Target or bind port.
    pub port: u16,

    /// Keep accepting after each drained connection.
    pub repeat: bool,

    /// Transfer settings.
    pub transfer: TransferConfig,
}

impl SessionConfig {
    /// Listening session on the wildcard address and default port.
    pub fn listen() -> Self {
        Self {
            mode: Mode::Listen,
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            repeat: false,
            transfer: TransferConfig::default(),
        }
    }

    /// Sending session to `address:port`.
    pub fn send(address: impl Into<String>, port: u16) -> Self {
        Self {
            mode: Mode::Send,
            address: address.into(),
            port,
            repeat: false,
            transfer: TransferConfig::default(),
        }
    }

    /// Reject settings no socket could honour.
    pub fn validate(&self) -> Result<()> {
        if self.transfer.buffer_size == 0 {
            return Err(Error::Config("buffer_size must be greater than zero".into()));
        }
        if self.transfer.backlog <= 0 {
            return Err(Error::Config("backlog must be greater than zero".into()));
        }
        if self.transfer.timeout == Some(Duration::ZERO) {
            return Err(Error::Config("timeout must be greater than zero".into()));
        }
        if self.repeat && self.mode == Mode::Send {
            return Err(Error::Config("repeat only applies to listening mode".into()));
        }
        Ok(())
    }
}

/// On-disk configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Listening defaults.
    #[serde(default)]
    pub listen: ListenConfig,

    /// Transfer settings.
    #[serde(default)]
    pub transfer: TransferFileConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FileConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Transfer settings with the file's values applied.
    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            buffer_size: self.transfer.buffer_size,
            backlog: self.listen.backlog,
            timeout: self.transfer.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// `[listen]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    /// Bind address.
    #[serde(default = "default_address")]
    pub address: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Listen backlog.
    #[serde(default = "default_backlog")]
    pub backlog: i32,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            backlog: default_backlog(),
        }
    }
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_backlog() -> i32 {
    DEFAULT_BACKLOG
}

/// `[transfer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferFileConfig {
    /// Transfer buffer size in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Timeout in seconds (optional).
    pub timeout_secs: Option<u64>,
}

impl Default for TransferFileConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            timeout_secs: None,
        }
    }
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional).
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
