//! Server configuration, parsed from the command line.

use crate::storage::DEFAULT_TTL_SECS;
use crate::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SNAPSHOT_PATH};
use clap::Parser;
use std::path::PathBuf;

/// ttlkv - an in-memory key-value store with per-key TTL, served over HTTP
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "ttlkv")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Snapshot file, rewritten after every put and delete
    #[arg(short, long, default_value = DEFAULT_SNAPSHOT_PATH)]
    pub snapshot: PathBuf,

    /// TTL in seconds for puts that do not give one
    #[arg(long, default_value_t = DEFAULT_TTL_SECS)]
    pub default_ttl: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            snapshot: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            default_ttl: DEFAULT_TTL_SECS,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    pub fn from_args() -> Self {
        Config::parse()
    }

    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parsed_defaults() {
        let parsed = Config::parse_from(["ttlkv"]);
        assert_eq!(parsed, Config::default());
        assert_eq!(parsed.bind_address(), "0.0.0.0:8080");
        assert_eq!(parsed.default_ttl, 2_592_000);
    }

    #[test]
    fn test_overrides() {
        let config = Config::parse_from([
            "ttlkv",
            "--host",
            "127.0.0.1",
            "-p",
            "9000",
            "--snapshot",
            "/tmp/kv.json",
            "--default-ttl",
            "60",
        ]);

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.snapshot, PathBuf::from("/tmp/kv.json"));
        assert_eq!(config.default_ttl, 60);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Config::try_parse_from(["ttlkv", "--port", "http"]).is_err());
    }
}
