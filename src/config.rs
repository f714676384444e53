//! Runtime configuration
//!
//! Read from the environment: `HOST`, `PORT` and an optional `CHAT_ROOMS`
//! list of topic room names.

use tracing::warn;

use crate::chat_server::DEFAULT_TOPICS;

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listening port
pub const DEFAULT_PORT: u16 = 8888;

/// Channel buffer size for server commands
pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// Per-connection outbound event queue size
pub const OUTBOUND_BUFFER_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address to bind, `host:port`
    pub addr: String,
    /// Topic room names, in display order
    pub topics: Vec<String>,
}

impl Config {
    /// Load from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                warn!("Invalid PORT '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let topics: Vec<String> = lookup("CHAT_ROOMS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let topics = if topics.is_empty() {
            DEFAULT_TOPICS.iter().map(|name| name.to_string()).collect()
        } else {
            topics
        };

        Self {
            addr: format!("{}:{}", host, port),
            topics,
        }
    }

    /// Replace the bind address, e.g. from the command line
    pub fn with_addr(mut self, addr: Option<String>) -> Self {
        if let Some(addr) = addr {
            self.addr = addr;
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
