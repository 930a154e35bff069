//! Configuration for the Gibson client
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{GibsonError, Result};

/// Endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "unix:///var/run/gibson.sock";

/// Where the server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP `host:port`
    Tcp { host: String, port: u16 },

    /// Local domain socket path
    Unix(PathBuf),
}

impl Endpoint {
    /// Parse an endpoint string.
    ///
    /// Accepted forms:
    /// - `tcp://host:port` or `host:port`
    /// - `unix:///path/to/socket` or `/path/to/socket`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(GibsonError::Config("empty endpoint".to_string()));
        }

        if let Some(path) = s.strip_prefix("unix://") {
            return Self::unix(path);
        }
        if s.starts_with('/') {
            return Self::unix(s);
        }

        let addr = s.strip_prefix("tcp://").unwrap_or(s);
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| GibsonError::Config(format!("missing port in endpoint '{}'", s)))?;

        // Bracketed IPv6 literals, e.g. [::1]:10128
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(GibsonError::Config(format!("missing host in endpoint '{}'", s)));
        }

        let port = port
            .parse::<u16>()
            .map_err(|_| GibsonError::Config(format!("invalid port in endpoint '{}'", s)))?;
        if port == 0 {
            return Err(GibsonError::Config(format!("port 0 in endpoint '{}'", s)));
        }

        Ok(Endpoint::Tcp {
            host: host.to_string(),
            port,
        })
    }

    fn unix(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(GibsonError::Config("empty socket path".to_string()));
        }
        Ok(Endpoint::Unix(PathBuf::from(path)))
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::Unix(PathBuf::from("/var/run/gibson.sock"))
    }
}

impl FromStr for Endpoint {
    type Err = GibsonError;

    fn from_str(s: &str) -> Result<Self> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp { host, port } if host.contains(':') => write!(f, "tcp://[{}]:{}", host, port),
            Endpoint::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}

/// Main configuration for a client connection
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Server endpoint (TCP or Unix socket)
    pub endpoint: Endpoint,

    /// Connect timeout (milliseconds, 0 = OS default, TCP only)
    pub connect_timeout_ms: u64,

    /// Socket read timeout (milliseconds, 0 = wait forever)
    pub read_timeout_ms: u64,

    /// Socket write timeout (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,

    /// Disable Nagle's algorithm on TCP connections
    pub nodelay: bool,

    // -------------------------------------------------------------------------
    // Reader Configuration
    // -------------------------------------------------------------------------
    /// Size of each socket read (bytes)
    pub read_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            connect_timeout_ms: 0,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            nodelay: true,
            read_buffer_size: 16 * 1024, // 16 KB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server endpoint
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.config.endpoint = endpoint;
        self
    }

    /// Parse and set the server endpoint
    pub fn endpoint_str(mut self, endpoint: &str) -> Result<Self> {
        self.config.endpoint = Endpoint::parse(endpoint)?;
        Ok(self)
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Set the socket read size (in bytes, minimum 1)
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size.max(1);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
