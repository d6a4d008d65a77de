//! Shared secret table consulted by the server channel for every datagram.

use crate::config::{Client, ConfigError};
use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone)]
struct SecretEntry {
    network: IpNetwork,
    secret: Arc<[u8]>,
    enabled: bool,
}

/// Client network to shared secret mapping.
///
/// Lookups take a read lock for the duration of the scan only; the table
/// can be changed while the channel is running. The first enabled entry
/// whose network contains the source address wins.
#[derive(Debug, Default)]
pub struct ClientSecrets {
    entries: RwLock<Vec<SecretEntry>>,
}

impl ClientSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from configured clients, in order.
    pub fn from_clients(clients: &[Client]) -> Result<Self, ConfigError> {
        let secrets = ClientSecrets::new();
        for client in clients {
            let network = client.network()?;
            let mut entries = secrets.write();
            entries.push(SecretEntry {
                network,
                secret: Arc::from(client.secret_bytes()),
                enabled: client.enabled,
            });
        }
        Ok(secrets)
    }

    /// Add or replace the secret for `network`.
    pub fn insert(&self, network: IpNetwork, secret: impl AsRef<[u8]>) {
        let mut entries = self.write();
        let secret: Arc<[u8]> = Arc::from(secret.as_ref());
        match entries.iter_mut().find(|e| e.network == network) {
            Some(entry) => {
                entry.secret = secret;
                entry.enabled = true;
            }
            None => entries.push(SecretEntry {
                network,
                secret,
                enabled: true,
            }),
        }
    }

    /// Remove the entry for `network`, returning whether one existed.
    pub fn remove(&self, network: IpNetwork) -> bool {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|e| e.network != network);
        entries.len() != before
    }

    pub fn set_enabled(&self, network: IpNetwork, enabled: bool) -> bool {
        let mut entries = self.write();
        match entries.iter_mut().find(|e| e.network == network) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Secret for a source address
    pub fn secret_for(&self, source_ip: IpAddr) -> Option<Arc<[u8]>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .find(|e| e.enabled && e.network.contains(source_ip))
            .map(|e| Arc::clone(&e.secret))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<SecretEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(address: &str, secret: &str, enabled: bool) -> Client {
        Client {
            address: address.to_string(),
            secret: secret.to_string(),
            name: None,
            enabled,
        }
    }

    #[test]
    fn test_first_enabled_match_wins() {
        let secrets = ClientSecrets::from_clients(&[
            client("192.168.1.10", "disabled", false),
            client("192.168.1.0/24", "subnet", true),
            client("192.168.1.10", "host", true),
        ])
        .unwrap();

        assert_eq!(secrets.len(), 3);
        let secret = secrets.secret_for("192.168.1.10".parse().unwrap()).unwrap();
        assert_eq!(&*secret, b"subnet");
        assert!(secrets.secret_for("10.0.0.1".parse().unwrap()).is_none());
    }

    #[test]
    fn test_modify_while_shared() {
        let secrets = Arc::new(ClientSecrets::new());
        let network: IpNetwork = "127.0.0.1/32".parse().unwrap();
        assert!(secrets.is_empty());

        secrets.insert(network, "first");
        let reader = Arc::clone(&secrets);
        assert_eq!(&*reader.secret_for("127.0.0.1".parse().unwrap()).unwrap(), b"first");

        secrets.insert(network, "second");
        assert_eq!(secrets.len(), 1);
        assert_eq!(&*reader.secret_for("127.0.0.1".parse().unwrap()).unwrap(), b"second");

        assert!(secrets.set_enabled(network, false));
        assert!(reader.secret_for("127.0.0.1".parse().unwrap()).is_none());

        assert!(secrets.remove(network));
        assert!(!secrets.remove(network));
    }

    #[test]
    fn test_invalid_client_address() {
        let result = ClientSecrets::from_clients(&[client("not-an-ip", "secret", true)]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
