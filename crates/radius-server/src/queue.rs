//! Per-client request tracking.
//!
//! The queue keeps at most one unprocessed request per client address. A
//! client that retransmits or sends faster than the handler drains has its
//! pending request replaced by the newest one.

use crate::channel::{ClientRequest, ServerChannelListener};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{error, trace, warn};

pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_CLIENTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Sessions whose last request is older than this are evicted
    pub session_timeout: Duration,
    /// Maximum number of tracked client addresses
    pub max_clients: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TrackingConfig {
            session_timeout: DEFAULT_SESSION_TIMEOUT,
            max_clients: DEFAULT_MAX_CLIENTS,
        }
    }
}

#[derive(Debug)]
struct Session {
    request: ClientRequest,
    last_id: u8,
    pending: bool,
}

impl Session {
    fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.request.received_at()) > timeout
    }
}

/// Why [`TrackingQueue::put_request`] discarded a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// Identifier older than the last accepted one
    Stale { last_id: u8 },
    /// Too many client addresses tracked
    Overflow,
}

#[derive(Debug, Default)]
pub struct TrackingQueue {
    config: TrackingConfig,
    sessions: Mutex<HashMap<SocketAddr, Session>>,
    notify: Notify,
}

impl TrackingQueue {
    pub fn new(config: TrackingConfig) -> Self {
        TrackingQueue {
            config,
            sessions: Mutex::new(HashMap::new()),
            notify: Notify::new(),
        }
    }

    pub fn config(&self) -> TrackingConfig {
        self.config
    }

    /// Track a request, replacing whatever the same client left pending.
    pub fn put_request(&self, request: ClientRequest) -> Result<(), Rejected> {
        let addr = request.addr();
        let id = request.packet().identifier;
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions, Instant::now());

        match sessions.get_mut(&addr) {
            None => {
                if sessions.len() >= self.config.max_clients {
                    error!(
                        client_addr = %addr,
                        max_clients = self.config.max_clients,
                        "Requests overflow, too many active clients"
                    );
                    return Err(Rejected::Overflow);
                }
                sessions.insert(
                    addr,
                    Session {
                        request,
                        last_id: id,
                        pending: true,
                    },
                );
            }
            Some(session) => {
                let last_id = session.last_id;
                // Heuristic: ids 0 and 1 and a last id of 255 are taken as wraparound
                if id < last_id && id > 1 && last_id < 255 {
                    warn!(client_addr = %addr, request_id = id, last_id, "Ignoring old request");
                    return Err(Rejected::Stale { last_id });
                }
                if id == last_id {
                    warn!(client_addr = %addr, request_id = id, "Client repeated last request");
                } else if session.pending {
                    warn!(
                        client_addr = %addr,
                        request_id = id,
                        replaced_id = last_id,
                        "Request overflow from client, pending request replaced"
                    );
                }
                session.request = request;
                session.last_id = id;
                session.pending = true;
            }
        }
        drop(sessions);

        trace!(client_addr = %addr, request_id = id, "Request queued");
        self.notify.notify_one();
        Ok(())
    }

    /// Wait for a pending request. The oldest one is returned first and its
    /// session stops being pending.
    pub async fn take_request(&self) -> ClientRequest {
        loop {
            if let Some(request) = self.try_take_request() {
                return request;
            }
            self.notify.notified().await;
        }
    }

    pub fn try_take_request(&self) -> Option<ClientRequest> {
        let mut sessions = self.lock();
        self.evict_expired(&mut sessions, Instant::now());

        let session = sessions
            .values_mut()
            .filter(|s| s.pending)
            .min_by_key(|s| s.request.received_at())?;
        session.pending = false;
        Some(session.request.clone())
    }

    /// Number of tracked client addresses
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().values().filter(|s| s.pending).count()
    }

    /// Last accepted identifier from `addr`
    pub fn last_id(&self, addr: SocketAddr) -> Option<u8> {
        self.lock().get(&addr).map(|s| s.last_id)
    }

    fn evict_expired(&self, sessions: &mut HashMap<SocketAddr, Session>, now: Instant) {
        let timeout = self.config.session_timeout;
        sessions.retain(|addr, session| {
            let expired = session.is_expired(now, timeout);
            if expired {
                trace!(client_addr = %addr, "Tracking session expired");
            }
            !expired
        });
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SocketAddr, Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ServerChannelListener for TrackingQueue {
    fn on_request(&self, request: ClientRequest) {
        // Rejections are logged by put_request
        let _ = self.put_request(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radius_proto::{Code, Codec, Packet};
    use std::sync::Arc;
    use tokio::net::UdpSocket;

    async fn socket() -> Arc<UdpSocket> {
        Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap())
    }

    fn request(socket: &Arc<UdpSocket>, port: u16, id: u8) -> ClientRequest {
        let mut packet = Packet::request(Code::AccessRequest);
        packet.identifier = id;
        ClientRequest::new(
            SocketAddr::from(([127, 0, 0, 1], port)),
            Instant::now(),
            Arc::from(&b"secret"[..]),
            packet,
            Arc::clone(socket),
            Codec::new(),
        )
    }

    #[tokio::test]
    async fn test_later_request_supersedes_pending() {
        let socket = socket().await;
        let queue = TrackingQueue::default();

        queue.put_request(request(&socket, 5000, 1)).unwrap();
        queue.put_request(request(&socket, 5000, 2)).unwrap();
        assert_eq!(queue.session_count(), 1);
        assert_eq!(queue.pending_count(), 1);

        let taken = queue.take_request().await;
        assert_eq!(taken.packet().identifier, 2);
        assert_eq!(queue.pending_count(), 0);
        assert!(queue.try_take_request().is_none());
    }

    #[tokio::test]
    async fn test_stale_request_leaves_session_unchanged() {
        let socket = socket().await;
        let queue = TrackingQueue::default();
        let addr = SocketAddr::from(([127, 0, 0, 1], 5000));

        queue.put_request(request(&socket, 5000, 5)).unwrap();
        assert_eq!(queue.take_request().await.packet().identifier, 5);

        let result = queue.put_request(request(&socket, 5000, 3));
        assert_eq!(result, Err(Rejected::Stale { last_id: 5 }));
        assert_eq!(queue.last_id(addr), Some(5));
        assert_eq!(queue.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_wraparound_ids_accepted() {
        let socket = socket().await;
        let queue = TrackingQueue::default();
        let addr = SocketAddr::from(([127, 0, 0, 1], 5000));

        queue.put_request(request(&socket, 5000, 200)).unwrap();
        // 0 and 1 count as a restarted sequence
        queue.put_request(request(&socket, 5000, 1)).unwrap();
        assert_eq!(queue.last_id(addr), Some(1));

        queue.put_request(request(&socket, 5000, 255)).unwrap();
        // Anything after 255 is a wrap
        queue.put_request(request(&socket, 5000, 7)).unwrap();
        assert_eq!(queue.last_id(addr), Some(7));

        // A repeat is accepted again
        queue.take_request().await;
        queue.put_request(request(&socket, 5000, 7)).unwrap();
        assert_eq!(queue.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_capacity_overflow() {
        let socket = socket().await;
        let queue = TrackingQueue::new(TrackingConfig {
            max_clients: 2,
            ..TrackingConfig::default()
        });

        queue.put_request(request(&socket, 5000, 1)).unwrap();
        queue.put_request(request(&socket, 5001, 1)).unwrap();
        assert_eq!(queue.put_request(request(&socket, 5002, 1)), Err(Rejected::Overflow));
        // Known clients are still served
        queue.put_request(request(&socket, 5001, 2)).unwrap();
        assert_eq!(queue.session_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_expire() {
        let socket = socket().await;
        let queue = TrackingQueue::new(TrackingConfig {
            session_timeout: Duration::from_secs(30),
            max_clients: 1,
        });

        queue.put_request(request(&socket, 5000, 9)).unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        // The expired session no longer counts towards capacity
        queue.put_request(request(&socket, 5001, 1)).unwrap();
        assert_eq!(queue.session_count(), 1);
        assert_eq!(queue.take_request().await.addr().port(), 5001);

        // Expired and never taken
        queue.put_request(request(&socket, 5000, 3)).unwrap_err();
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(queue.try_take_request().is_none());
        assert_eq!(queue.session_count(), 0);
    }

    #[tokio::test]
    async fn test_take_waits_for_put() {
        let socket = socket().await;
        let queue = Arc::new(TrackingQueue::default());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.take_request().await })
        };
        tokio::task::yield_now().await;
        assert!(!consumer.is_finished());

        queue.on_request(request(&socket, 5000, 42));
        let taken = tokio::time::timeout(Duration::from_secs(2), consumer)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(taken.packet().identifier, 42);
    }

    #[tokio::test]
    async fn test_oldest_pending_first() {
        let socket = socket().await;
        let queue = TrackingQueue::default();

        queue.put_request(request(&socket, 5000, 1)).unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        queue.put_request(request(&socket, 5001, 1)).unwrap();

        assert_eq!(queue.take_request().await.addr().port(), 5000);
        assert_eq!(queue.take_request().await.addr().port(), 5001);
    }
}
