//! Client side UDP channel with retransmission.

use crate::error::ChannelError;
use radius_proto::packet::PACKET_MAX_LENGTH;
use radius_proto::{Codec, IdSequence, Packet};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Where and how a [`ClientChannel`] sends its requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// RADIUS server address
    pub server: SocketAddr,
    /// Shared secret with the server
    pub secret: String,
    /// Send attempts per request
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// Time to wait for a reply to each attempt, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_retry_count() -> u32 {
    3
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl ClientConfig {
    pub fn new(server: SocketAddr, secret: impl Into<String>) -> Self {
        ClientConfig {
            server,
            secret: secret.into(),
            retry_count: default_retry_count(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Sends requests to one server and waits for the verified reply.
///
/// Concurrent [`ClientChannel::query`] calls are serialized so that one
/// request is in flight at a time.
#[derive(Debug)]
pub struct ClientChannel {
    config: ClientConfig,
    codec: Codec,
    ids: Arc<IdSequence>,
    in_flight: Mutex<()>,
}

impl ClientChannel {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_sequence(config, Arc::new(IdSequence::new()))
    }

    /// Share a request id sequence with other channels
    pub fn with_sequence(config: ClientConfig, ids: Arc<IdSequence>) -> Self {
        ClientChannel {
            config,
            codec: Codec::new(),
            ids,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Send `request` and return the server's verified response.
    ///
    /// The request gets the next identifier from the sequence. Each attempt
    /// waits up to the request timeout; a reply that fails to decode or
    /// verify counts as a failed attempt. After the last attempt the call
    /// fails with [`ChannelError::RequestTimeout`].
    pub async fn query(&self, mut request: Packet) -> Result<Packet, ChannelError> {
        let _guard = self.in_flight.lock().await;
        let server = self.config.server;
        let secret = self.config.secret.as_bytes();
        let attempts = self.config.retry_count.max(1);
        let timeout = self.config.request_timeout();

        request.identifier = self.ids.next();
        let data = self.codec.encode_request(&request, secret)?;

        // Not connected: replies may come from another local address of the server
        let local: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        let mut buf = vec![0u8; PACKET_MAX_LENGTH];

        for attempt in 1..=attempts {
            debug!(
                server = %server,
                request_id = request.identifier,
                code = %request.code,
                attempt,
                "Sending request"
            );
            socket.send_to(&data, server).await?;

            let (len, from) = match tokio::time::timeout(timeout, socket.recv_from(&mut buf)).await {
                Ok(Ok(received)) => received,
                Ok(Err(e)) => {
                    warn!(server = %server, attempt, error = %e, "Error receiving response");
                    continue;
                }
                Err(_) => {
                    warn!(
                        server = %server,
                        request_id = request.identifier,
                        attempt,
                        timeout_ms = self.config.request_timeout_ms,
                        "Request timed out"
                    );
                    continue;
                }
            };

            match self.codec.decode_response(&buf[..len], &request, secret) {
                Ok(response) => {
                    debug!(server = %from, request_id = response.identifier, code = %response.code, "Received response");
                    return Ok(response);
                }
                Err(e) => {
                    warn!(server = %from, attempt, error = %e, "Invalid response");
                }
            }
        }

        Err(ChannelError::RequestTimeout { attempts })
    }
}
