//! JSON configuration for the `radius-engine` binary.

use crate::queue::{DEFAULT_MAX_CLIENTS, DEFAULT_SESSION_TIMEOUT};
use crate::secrets::ClientSecrets;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read or write configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid(message.into())
    }
}

/// Account served by the in-memory authentication module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    /// Sent back as Framed-IP-Address when the user is accepted
    #[serde(default)]
    pub framed_ip_address: Option<Ipv4Addr>,
}

/// NAS, or network of NASes, sharing one secret with the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// `10.0.0.0/8` style network or a bare address
    pub address: String,
    pub secret: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Client {
    /// A bare address is read as a host network (/32 or /128).
    pub fn network(&self) -> Result<IpNetwork, ConfigError> {
        let address = self.address.trim();
        match address.parse::<IpAddr>() {
            Ok(host) => Ok(IpNetwork::from(host)),
            Err(_) => address.parse::<IpNetwork>().map_err(|e| {
                ConfigError::invalid(format!("client address '{}': {e}", self.address))
            }),
        }
    }

    pub fn secret_bytes(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// One server channel socket per entry
    #[serde(default = "standard_ports")]
    pub listen_addresses: Vec<String>,

    #[serde(default)]
    pub clients: Vec<Client>,

    #[serde(default)]
    pub users: Vec<User>,

    /// Idle time after which a client's tracking session is dropped
    #[serde(default = "session_timeout_default")]
    pub session_timeout_secs: u64,

    /// Tracking sessions kept at once
    #[serde(default = "max_clients_default")]
    pub max_clients: usize,

    /// Acct-Interim-Interval granted with every Access-Accept
    #[serde(default)]
    pub accounting_interval_secs: Option<u32>,

    /// Tracing filter directive, `RUST_LOG` takes precedence
    #[serde(default)]
    pub log_level: Option<String>,
}

fn standard_ports() -> Vec<String> {
    vec!["0.0.0.0:1812".into(), "0.0.0.0:1813".into()]
}

fn session_timeout_default() -> u64 {
    DEFAULT_SESSION_TIMEOUT.as_secs()
}

fn max_clients_default() -> usize {
    DEFAULT_MAX_CLIENTS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addresses: standard_ports(),
            clients: Vec::new(),
            users: Vec::new(),
            session_timeout_secs: session_timeout_default(),
            max_clients: max_clients_default(),
            accounting_interval_secs: None,
            log_level: None,
        }
    }
}

impl Config {
    /// Read and validate `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn socket_addrs(&self) -> Result<Vec<SocketAddr>, ConfigError> {
        self.listen_addresses
            .iter()
            .map(|text| {
                text.parse::<SocketAddr>()
                    .map_err(|e| ConfigError::invalid(format!("listen address '{text}': {e}")))
            })
            .collect()
    }

    pub fn client_secrets(&self) -> Result<ClientSecrets, ConfigError> {
        ClientSecrets::from_clients(&self.clients)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_listeners()?;
        self.validate_tracking()?;
        self.clients.iter().try_for_each(validate_client)?;
        self.validate_users()
    }

    fn validate_listeners(&self) -> Result<(), ConfigError> {
        let addrs = self.socket_addrs()?;
        if addrs.is_empty() {
            return Err(ConfigError::invalid("at least one listen address is required"));
        }
        match addrs.iter().find(|addr| addr.port() == 0) {
            Some(addr) => Err(ConfigError::invalid(format!("listen address {addr} has no port"))),
            None => Ok(()),
        }
    }

    fn validate_tracking(&self) -> Result<(), ConfigError> {
        if self.max_clients == 0 {
            return Err(ConfigError::invalid("max_clients must be positive"));
        }
        if self.session_timeout_secs == 0 {
            return Err(ConfigError::invalid("session_timeout_secs must be positive"));
        }
        Ok(())
    }

    fn validate_users(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for user in &self.users {
            if user.username.is_empty() {
                return Err(ConfigError::invalid("user without a username"));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(ConfigError::invalid(format!("user '{}' is listed twice", user.username)));
            }
        }
        Ok(())
    }

    /// Configuration written on first start
    pub fn example() -> Self {
        Config {
            clients: vec![
                Client {
                    address: "127.0.0.1".into(),
                    secret: "testing123".into(),
                    name: Some("local NAS".into()),
                    enabled: true,
                },
                Client {
                    address: "10.20.0.0/16".into(),
                    secret: "change-me".into(),
                    name: Some("access switches".into()),
                    enabled: false,
                },
            ],
            users: vec![
                User {
                    username: "alice".into(),
                    password: "wonderland".into(),
                    framed_ip_address: Some(Ipv4Addr::new(10, 8, 0, 2)),
                },
                User {
                    username: "bob".into(),
                    password: "builder".into(),
                    framed_ip_address: None,
                },
            ],
            accounting_interval_secs: Some(600),
            log_level: Some("info".into()),
            ..Config::default()
        }
    }
}

fn validate_client(client: &Client) -> Result<(), ConfigError> {
    if client.secret.is_empty() {
        return Err(ConfigError::invalid(format!("client {} has no secret", client.label())));
    }
    client.network().map(|_| ())
}
