//! # Configuration Module
//!
//! Host-supplied settings the core needs while handling a request: which ports
//! imply HTTPS, the default ports, and session cookie settings.
//!
//! ## Environment Variables
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `BASECORE_HTTP_PORTS` | comma-separated plain HTTP ports | `80,8080` |
//! | `BASECORE_HTTPS_PORTS` | comma-separated HTTPS ports | `443,8443` |
//! | `BASECORE_SESSION_NAME` | session cookie name | `BASESESSID` |
//! | `BASECORE_SESSION_TTL` | session lifetime in seconds | `3600` |
//!
//! ## YAML
//!
//! ```yaml
//! ports:
//!   http: [80, 8080]
//!   https: [443]
//! session:
//!   name: SID
//!   ttl_secs: 900
//! ```
//!
//! Missing keys fall back to the defaults above.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Port sets used to derive the request scheme and default port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Ports {
    pub http: Vec<u16>,
    pub https: Vec<u16>,
    pub default_http: u16,
    pub default_https: u16,
}

impl Default for Ports {
    fn default() -> Self {
        Self {
            http: vec![80, 8080],
            https: vec![443, 8443],
            default_http: 80,
            default_https: 443,
        }
    }
}

impl Ports {
    #[must_use]
    pub fn is_https_port(&self, port: u16) -> bool {
        self.https.contains(&port)
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie name carrying the session id
    pub name: String,
    /// Lifetime in seconds
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "BASESESSID".to_string(),
            ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ports: Ports,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values are ignored and the default is kept.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = AppConfig::default();
        if let Some(ports) = env_ports("BASECORE_HTTP_PORTS") {
            config.ports.default_http = ports.first().copied().unwrap_or(80);
            config.ports.http = ports;
        }
        if let Some(ports) = env_ports("BASECORE_HTTPS_PORTS") {
            config.ports.default_https = ports.first().copied().unwrap_or(443);
            config.ports.https = ports;
        }
        if let Ok(name) = env::var("BASECORE_SESSION_NAME") {
            if !name.trim().is_empty() {
                config.session.name = name.trim().to_string();
            }
        }
        if let Some(ttl) = env::var("BASECORE_SESSION_TTL")
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            config.session.ttl_secs = ttl;
        }
        config
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse configuration YAML")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_yaml_str(&text)
    }
}

fn env_ports(var: &str) -> Option<Vec<u16>> {
    let raw = env::var(var).ok()?;
    parse_ports(&raw)
}

fn parse_ports(raw: &str) -> Option<Vec<u16>> {
    let ports: Vec<u16> = raw
        .split(',')
        .filter_map(|p| p.trim().parse().ok())
        .collect();
    if ports.is_empty() {
        None
    } else {
        Some(ports)
    }
}
