//! Socket Streams
//!
//! TCP or Unix domain socket behind one type, and the [`Transport`] that
//! writes requests to it.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crate::client::Transport;
use crate::config::{Config, Endpoint};
use crate::error::{GibsonError, Result};

/// A connected socket
#[derive(Debug)]
pub enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Stream {
    /// Connect to the configured endpoint and apply socket options
    pub fn connect(config: &Config) -> Result<Self> {
        let stream = match &config.endpoint {
            Endpoint::Tcp { host, port } => {
                let stream = connect_tcp(host, *port, config.connect_timeout_ms)?;
                // Disable Nagle's algorithm for low latency
                stream.set_nodelay(config.nodelay)?;
                Stream::Tcp(stream)
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => Stream::Unix(UnixStream::connect(path)?),
            #[cfg(not(unix))]
            Endpoint::Unix(path) => {
                return Err(GibsonError::Config(format!(
                    "Unix sockets are not supported on this platform: {}",
                    path.display()
                )))
            }
        };

        stream.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;
        Ok(stream)
    }

    /// Configure socket timeouts (0 = none)
    pub fn set_timeouts(&self, read_ms: u64, write_ms: u64) -> io::Result<()> {
        let read = (read_ms > 0).then(|| Duration::from_millis(read_ms));
        let write = (write_ms > 0).then(|| Duration::from_millis(write_ms));

        match self {
            Stream::Tcp(s) => {
                s.set_read_timeout(read)?;
                s.set_write_timeout(write)
            }
            #[cfg(unix)]
            Stream::Unix(s) => {
                s.set_read_timeout(read)?;
                s.set_write_timeout(write)
            }
        }
    }

    /// Second handle to the same socket
    pub fn try_clone(&self) -> io::Result<Self> {
        match self {
            Stream::Tcp(s) => s.try_clone().map(Stream::Tcp),
            #[cfg(unix)]
            Stream::Unix(s) => s.try_clone().map(Stream::Unix),
        }
    }

    /// Shut down both directions, waking any blocked reader
    pub fn shutdown(&self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Stream::Unix(s) => s.shutdown(Shutdown::Both),
        }
    }

    /// Peer address for logging
    pub fn peer_addr(&self) -> String {
        match self {
            Stream::Tcp(s) => s
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            #[cfg(unix)]
            Stream::Unix(s) => s
                .peer_addr()
                .ok()
                .and_then(|a| a.as_pathname().map(|p| p.display().to_string()))
                .unwrap_or_else(|| "unix socket".to_string()),
        }
    }
}

fn connect_tcp(host: &str, port: u16, timeout_ms: u64) -> Result<TcpStream> {
    if timeout_ms == 0 {
        return Ok(TcpStream::connect((host, port))?);
    }

    let timeout = Duration::from_millis(timeout_ms);
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(match last_err {
        Some(e) => e.into(),
        None => GibsonError::Config(format!("could not resolve {}:{}", host, port)),
    })
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.read(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.write(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.flush(),
            #[cfg(unix)]
            Stream::Unix(s) => s.flush(),
        }
    }
}

/// Write half of a connection
#[derive(Debug)]
pub struct StreamTransport {
    /// `None` once disconnected
    stream: Option<Stream>,
}

impl StreamTransport {
    pub fn new(stream: Stream) -> Self {
        Self {
            stream: Some(stream),
        }
    }
}

impl Transport for StreamTransport {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport disconnected"))?;
        stream.write_all(buf)?;
        stream.flush()
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            // The peer may already be gone
            let _ = stream.shutdown();
        }
    }
}
