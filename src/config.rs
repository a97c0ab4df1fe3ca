//! Configuration management for blindfold-broker
//!
//! Configuration is resolved once at startup (file, then environment
//! overrides), validated, and handed to each component by reference.
//! Nothing below this module reads the process environment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Default key broker base URL
pub const DEFAULT_BROKER_URL: &str = "http://shade-agent:3001";

/// Default storage upload endpoint
pub const DEFAULT_UPLOAD_URL: &str = "https://api.pinata.cloud/pinning/pinFileToIPFS";

/// Default public gateway (content address is appended as a path segment)
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.pinata.cloud/ipfs";

/// Key broker bounded wait, in seconds; fixed per call type
pub const BROKER_TIMEOUT_SECS: u64 = 15;

/// Storage upload and fetch bounded wait, in seconds; fixed per call type
pub const STORAGE_TIMEOUT_SECS: u64 = 30;

/// Default listen port
pub const DEFAULT_PORT: u16 = 8000;

/// Default bind address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

/// Key broker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Base URL of the key-derivation service
    #[serde(default = "default_broker_url")]
    pub base_url: String,
}

impl BrokerConfig {
    /// Bounded wait per key request
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(BROKER_TIMEOUT_SECS)
    }
}

fn default_broker_url() -> String {
    DEFAULT_BROKER_URL.to_string()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            base_url: default_broker_url(),
        }
    }
}

/// Storage provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Provider API key (sent as `pinata_api_key`)
    #[serde(default)]
    pub api_key: String,

    /// Provider API secret (sent as `pinata_secret_api_key`)
    #[serde(default)]
    pub secret_key: String,

    /// Provider JWT
    #[serde(default)]
    pub jwt: String,

    /// Multipart upload endpoint
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Public gateway base
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
}

impl StorageConfig {
    /// Bounded wait per upload or fetch
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(STORAGE_TIMEOUT_SECS)
    }
}

fn default_upload_url() -> String {
    DEFAULT_UPLOAD_URL.to_string()
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            api_key: String::new(),
            secret_key: String::new(),
            jwt: String::new(),
            upload_url: default_upload_url(),
            gateway_url: default_gateway_url(),
        }
    }
}

// Credentials never reach logs.
impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("api_key", &redact(&self.api_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("jwt", &redact(&self.jwt))
            .field("upload_url", &self.upload_url)
            .field("gateway_url", &self.gateway_url)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: default_bind_addr(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Socket address to listen on
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid listen address: {}", e)))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Key broker
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Storage provider
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a JSON file, with `${VAR}` substitution and
    /// environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, env_lookup)
    }

    /// Load a config file, resolving variables through `lookup`
    pub fn load_with<P, F>(path: P, lookup: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Failed to read config file: {}", e))
        })?;

        let content = substitute_env_vars(&content, &lookup)?;

        let mut config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config file: {}", e))
        })?;

        config.apply_overrides(&lookup)?;

        config.validate()?;
        Ok(config)
    }

    /// Create a config from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Create a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = get("SHADE_API_URL") {
            self.broker.base_url = url;
        }

        if let Some(key) = get("PINATA_API_KEY") {
            self.storage.api_key = key;
        }

        if let Some(secret) = get("PINATA_SECRET_KEY") {
            self.storage.secret_key = secret;
        }

        if let Some(jwt) = get("PINATA_JWT") {
            self.storage.jwt = jwt;
        }

        if let Some(url) = get("PINATA_UPLOAD_URL") {
            self.storage.upload_url = url;
        }

        if let Some(url) = get("PINATA_GATEWAY_URL") {
            self.storage.gateway_url = url;
        }

        if let Some(addr) = get("BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = get("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid PORT: {}", port)))?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("PINATA_API_KEY", &self.storage.api_key),
            ("PINATA_SECRET_KEY", &self.storage.secret_key),
            ("PINATA_JWT", &self.storage.jwt),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "Missing Pinata credentials: {} required",
                missing.join(", ")
            )));
        }

        for (name, url) in [
            ("broker URL", &self.broker.base_url),
            ("upload URL", &self.storage.upload_url),
            ("gateway URL", &self.storage.gateway_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!("Invalid {}: {}", name, url)));
            }
        }

        self.server.socket_addr()?;

        Ok(())
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Substitute `${VAR_NAME}` patterns in config content
fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| Error::Internal(format!("Bad substitution pattern: {}", e)))?;

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        if let Some(value) = lookup(&cap[1]) {
            result = result.replace(&cap[0], &value);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const CREDS: [(&str, &str); 3] = [
        ("PINATA_API_KEY", "key"),
        ("PINATA_SECRET_KEY", "secret"),
        ("PINATA_JWT", "jwt"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(vars(&CREDS)).unwrap();

        assert_eq!(config.broker.base_url, DEFAULT_BROKER_URL);
        assert_eq!(config.broker.timeout(), Duration::from_secs(15));
        assert_eq!(config.storage.timeout(), Duration::from_secs(30));
        assert_eq!(config.storage.upload_url, DEFAULT_UPLOAD_URL);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_missing_credentials_fatal() {
        let err = Config::from_lookup(vars(&[("PINATA_API_KEY", "key")])).unwrap_err();
        let msg = err.to_string();

        assert!(matches!(err, Error::Config(_)));
        assert!(msg.contains("PINATA_SECRET_KEY"));
        assert!(msg.contains("PINATA_JWT"));
        assert!(!msg.contains("PINATA_API_KEY,"));
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let mut pairs = CREDS.to_vec();
        pairs[2] = ("PINATA_JWT", "   ");
        assert!(Config::from_lookup(vars(&pairs)).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("SHADE_API_URL", "http://127.0.0.1:3001"));
        pairs.push(("PORT", "9090"));
        let config = Config::from_lookup(vars(&pairs)).unwrap();

        assert_eq!(config.broker.base_url, "http://127.0.0.1:3001");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut pairs = CREDS.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(matches!(
            Config::from_lookup(vars(&pairs)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(vars(&CREDS)).unwrap();
        let rendered = format!("{:?}", config);

        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("\"secret\""));
    }

    #[test]
    fn test_substitute_env_vars() {
        let content = r#"{"storage": {"jwt": "${MY_JWT}", "api_key": "${UNSET_VAR}"}}"#;
        let out = substitute_env_vars(content, vars(&[("MY_JWT", "abc")])).unwrap();

        assert!(out.contains(r#""jwt": "abc""#));
        assert!(out.contains("${UNSET_VAR}"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "broker": {"base_url": "http://broker.internal:3001"},
                "storage": {"api_key": "k", "secret_key": "s", "jwt": "j"},
                "server": {"port": 8123}
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.broker.timeout(), Duration::from_secs(BROKER_TIMEOUT_SECS));
    }

    #[test]
    fn test_load_rejects_invalid_port_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "storage": {"api_key": "k", "secret_key": "s", "jwt": "j"},
                "server": {"port": 8123}
            }"#,
        )
        .unwrap();

        let err = Config::load_with(&path, vars(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("eighty"));

        let config = Config::load_with(&path, vars(&[("PORT", "9191")])).unwrap();
        assert_eq!(config.server.port, 9191);
    }

    #[test]
    fn test_timeouts_ignore_config_file() {
        let config: Config = serde_json::from_str(
            r#"{"broker": {"timeout_secs": 1}, "storage": {"timeout_secs": 1}}"#,
        )
        .unwrap();

        assert_eq!(config.broker.timeout(), Duration::from_secs(15));
        assert_eq!(config.storage.timeout(), Duration::from_secs(30));
    }
}
