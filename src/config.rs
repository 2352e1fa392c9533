//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// GraphQL directory endpoint
    pub explorer_url: String,
    /// Message relay used to reach nodes by twin id
    pub relay_url: String,
    /// Remote key/value store; in-memory store when unset
    pub store_url: Option<String>,
    /// Capacity of the in-memory durable store
    pub store_max_entries: usize,
    /// Twin id validity in seconds
    pub twin_cache_ttl: u64,
    /// Interval in seconds between twin cache purges
    pub twin_cache_purge_interval: u64,
    /// Node payload TTL in seconds
    pub node_cache_ttl: u64,
    /// Deadline in seconds for one node session
    pub fetch_timeout: u64,
    /// Directory request timeout in seconds
    pub directory_timeout: u64,
    /// Interval in seconds between fleet warm sweeps
    pub warm_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `EXPLORER_URL` - GraphQL directory endpoint
    /// - `RELAY_URL` - Message relay base URL
    /// - `STORE_URL` - Remote key/value store base URL (default: in-memory)
    /// - `STORE_MAX_ENTRIES` - In-memory store capacity (default: 100000)
    /// - `TWIN_CACHE_TTL` - Twin id validity in seconds (default: 600)
    /// - `TWIN_CACHE_PURGE_INTERVAL` - Twin purge frequency in seconds (default: 900)
    /// - `NODE_CACHE_TTL` - Node payload TTL in seconds (default: 1800)
    /// - `FETCH_TIMEOUT` - Node session deadline in seconds (default: 30)
    /// - `DIRECTORY_TIMEOUT` - Directory request timeout in seconds (default: 10)
    /// - `WARM_INTERVAL` - Fleet warm frequency in seconds (default: 1800)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            explorer_url: env::var("EXPLORER_URL").unwrap_or(defaults.explorer_url),
            relay_url: env::var("RELAY_URL").unwrap_or(defaults.relay_url),
            store_url: env::var("STORE_URL").ok().filter(|v| !v.is_empty()),
            store_max_entries: parse_var("STORE_MAX_ENTRIES", defaults.store_max_entries),
            twin_cache_ttl: parse_secs("TWIN_CACHE_TTL", defaults.twin_cache_ttl),
            twin_cache_purge_interval: parse_secs(
                "TWIN_CACHE_PURGE_INTERVAL",
                defaults.twin_cache_purge_interval,
            ),
            node_cache_ttl: parse_secs("NODE_CACHE_TTL", defaults.node_cache_ttl),
            fetch_timeout: parse_secs("FETCH_TIMEOUT", defaults.fetch_timeout),
            directory_timeout: parse_secs("DIRECTORY_TIMEOUT", defaults.directory_timeout),
            warm_interval: parse_secs("WARM_INTERVAL", defaults.warm_interval),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    pub fn node_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.node_cache_ttl)
    }

    pub fn warm_interval(&self) -> Duration {
        Duration::from_secs(self.warm_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            explorer_url: "https://graphql.grid.tf/graphql".to_string(),
            relay_url: "http://127.0.0.1:8051".to_string(),
            store_url: None,
            store_max_entries: 100_000,
            twin_cache_ttl: 600,
            twin_cache_purge_interval: 900,
            node_cache_ttl: 1800,
            fetch_timeout: 30,
            directory_timeout: 10,
            warm_interval: 1800,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_var`] for durations in seconds; zero keeps the default.
fn parse_secs(name: &str, default: u64) -> u64 {
    match parse_var(name, default) {
        0 => default,
        secs => secs,
    }
}
