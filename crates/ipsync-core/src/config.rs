//! Configuration for ipsync
//!
//! Configuration is resolved from environment variables first and from a
//! JSON file second:
//!
//! 1. Environment (`IP_SET_COUNT`, `API_KEY`, `API_SECRET`, `API`,
//!    `SITE_DOMAIN`, `IP_ECHO_URL`). Accepted as soon as key and secret are
//!    both non-empty.
//! 2. The JSON file, if a path was given and it exists. The file is taken
//!    as-is: no validation, and missing fields take zero values.
//! 3. Otherwise loading fails with [`Error::Config`].

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Distinct-IP target applied when `IP_SET_COUNT` is unset
pub const DEFAULT_IP_SET_COUNT: usize = 2;

/// IP-echo service queried by the sampler
pub const DEFAULT_IP_ECHO_URL: &str = "https://ip.3322.net";

/// Environment variable names
pub mod vars {
    pub const IP_SET_COUNT: &str = "IP_SET_COUNT";
    pub const API_KEY: &str = "API_KEY";
    pub const API_SECRET: &str = "API_SECRET";
    pub const API: &str = "API";
    pub const SITE_DOMAIN: &str = "SITE_DOMAIN";
    pub const IP_ECHO_URL: &str = "IP_ECHO_URL";
}

/// Resolved run configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Number of distinct public IPs to collect
    pub ip_set_count: usize,

    /// Site API key
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// Site API secret
    /// ⚠️ NEVER log this value
    pub api_secret: String,

    /// Site API base URL, e.g. `https://waf.example.com/api`
    pub api: String,

    /// Substring matched against site domains
    pub site_domain: String,

    /// IP-echo endpoint
    pub ip_echo_url: String,
}

// Zero values everywhere except the echo endpoint. `ip_set_count` stays 0
// here: the default of 2 belongs to the environment path only.
impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ip_set_count: 0,
            api_key: String::new(),
            api_secret: String::new(),
            api: String::new(),
            site_domain: String::new(),
            ip_echo_url: default_ip_echo_url(),
        }
    }
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("ip_set_count", &self.ip_set_count)
            .field("api_key", &"<REDACTED>")
            .field("api_secret", &"<REDACTED>")
            .field("api", &self.api)
            .field("site_domain", &self.site_domain)
            .field("ip_echo_url", &self.ip_echo_url)
            .finish()
    }
}

fn default_ip_echo_url() -> String {
    DEFAULT_IP_ECHO_URL.to_string()
}

impl SyncConfig {
    /// Resolve configuration from the process environment, falling back to
    /// the JSON file at `path`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(|name| env::var(name).ok(), path)
    }

    /// Same as [`SyncConfig::load`] with an injectable environment lookup
    pub fn load_with<F>(lookup: F, path: Option<&Path>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match Self::from_lookup(lookup) {
            Ok(config) if !config.api_key.is_empty() => return Ok(config),
            Ok(_) => debug!("Environment configuration has no API key"),
            Err(e) => debug!("Environment configuration rejected: {}", e),
        }

        let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
            return Err(load_failure());
        };

        if !path.exists() {
            debug!("Config file {} does not exist", path.display());
            return Err(load_failure());
        }

        Self::from_file(path).map_err(|e| {
            debug!("Config file {} rejected: {}", path.display(), e);
            load_failure()
        })
    }

    /// Read configuration from environment variables
    ///
    /// Empty variables count as unset. Fails if `IP_SET_COUNT` is not an
    /// integer or if either credential is empty.
    ///
    /// `IP_SET_COUNT` must be a non-negative integer; surrounding whitespace
    /// is ignored. A negative value rejects the whole environment attempt,
    /// and [`SyncConfig::load_with`] logs the reason at debug level before
    /// trying the file.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let ip_set_count = match get(vars::IP_SET_COUNT) {
            Some(raw) => raw.trim().parse().map_err(|e| {
                Error::config(format!("invalid {}: {}", vars::IP_SET_COUNT, e))
            })?,
            None => DEFAULT_IP_SET_COUNT,
        };

        let config = Self {
            ip_set_count,
            api_key: get(vars::API_KEY).unwrap_or_default(),
            api_secret: get(vars::API_SECRET).unwrap_or_default(),
            api: get(vars::API).unwrap_or_default(),
            site_domain: get(vars::SITE_DOMAIN).unwrap_or_default(),
            ip_echo_url: get(vars::IP_ECHO_URL).unwrap_or_else(default_ip_echo_url),
        };

        if config.api_key.is_empty() || config.api_secret.is_empty() {
            return Err(Error::config(format!(
                "{} and {} are required",
                vars::API_KEY,
                vars::API_SECRET
            )));
        }

        Ok(config)
    }

    /// Parse a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            Error::config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

fn load_failure() -> Error {
    Error::config("failed to load configuration from environment or file")
}
