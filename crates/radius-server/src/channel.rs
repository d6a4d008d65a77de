//! Server side UDP channel.
//!
//! One receive task multiplexes every bound listen socket. Each valid
//! datagram is decoded with the sender's shared secret and handed to the
//! registered listeners as a [`ClientRequest`].

use crate::error::ChannelError;
use crate::secrets::ClientSecrets;
use radius_proto::packet::{PACKET_HEADER_LENGTH, PACKET_MAX_LENGTH};
use radius_proto::{Codec, Packet};
use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use std::task::Poll;
use tokio::io::ReadBuf;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// A decoded request together with everything needed to answer it.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    addr: SocketAddr,
    received_at: Instant,
    secret: Arc<[u8]>,
    packet: Packet,
    socket: Arc<UdpSocket>,
    codec: Codec,
}

impl ClientRequest {
    pub fn new(
        addr: SocketAddr,
        received_at: Instant,
        secret: Arc<[u8]>,
        packet: Packet,
        socket: Arc<UdpSocket>,
        codec: Codec,
    ) -> Self {
        ClientRequest {
            addr,
            received_at,
            secret,
            packet,
            socket,
            codec,
        }
    }

    /// Source address of the datagram
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    /// Local address of the socket the request arrived on
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Encode `response` against this request and send it back to the
    /// originating address over the socket the request arrived on.
    pub async fn send_response(&self, response: &Packet) -> Result<(), ChannelError> {
        if response.identifier != self.packet.identifier {
            return Err(ChannelError::IdentifierMismatch {
                request: self.packet.identifier,
                response: response.identifier,
            });
        }

        let data = self.codec.encode_response(response, &self.packet, &self.secret)?;
        let sent = self.socket.send_to(&data, self.addr).await?;
        if sent != data.len() {
            return Err(ChannelError::Io(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} bytes", data.len()),
            )));
        }

        debug!(
            client_addr = %self.addr,
            request_id = response.identifier,
            code = %response.code,
            "Sent response"
        );
        Ok(())
    }
}

/// Receives every request decoded by a [`ServerChannel`].
///
/// Called inline on the receive task, so implementations must return
/// quickly and deal with their own failures.
pub trait ServerChannelListener: Send + Sync {
    fn on_request(&self, request: ClientRequest);
}

struct Shared {
    sockets: Vec<Arc<UdpSocket>>,
    secrets: Arc<ClientSecrets>,
    codec: Codec,
    listeners: RwLock<Vec<Arc<dyn ServerChannelListener>>>,
}

/// Set of bound listen sockets served by a single receive task
pub struct ServerChannel {
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl ServerChannel {
    /// Bind one UDP socket per address. Nothing is received until
    /// [`ServerChannel::start`] is called.
    pub async fn bind(
        addrs: &[SocketAddr],
        secrets: Arc<ClientSecrets>,
        codec: Codec,
    ) -> Result<Self, ChannelError> {
        let mut sockets = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let socket = UdpSocket::bind(addr).await?;
            info!(addr = %socket.local_addr()?, "Listening for RADIUS requests");
            sockets.push(Arc::new(socket));
        }

        Ok(ServerChannel {
            shared: Arc::new(Shared {
                sockets,
                secrets,
                codec,
                listeners: RwLock::new(Vec::new()),
            }),
            task: None,
        })
    }

    /// Bound addresses, in configuration order
    pub fn local_addrs(&self) -> Result<Vec<SocketAddr>, ChannelError> {
        let mut addrs = Vec::with_capacity(self.shared.sockets.len());
        for socket in &self.shared.sockets {
            addrs.push(socket.local_addr()?);
        }
        Ok(addrs)
    }

    pub fn secrets(&self) -> &Arc<ClientSecrets> {
        &self.shared.secrets
    }

    pub fn add_listener(&self, listener: Arc<dyn ServerChannelListener>) {
        self.shared
            .listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    /// Spawn the receive task. Does nothing when already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        self.task = Some(tokio::spawn(async move { shared.receive_loop().await }));
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Abort the receive task. A datagram being received is lost.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Server channel stopped");
        }
    }
}

impl Drop for ServerChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    async fn receive_loop(&self) {
        let mut buf = vec![0u8; PACKET_MAX_LENGTH];
        let mut next = 0usize;
        loop {
            match recv_any(&self.sockets, &mut buf, &mut next).await {
                Ok((index, len, addr)) => self.dispatch(index, &buf[..len], addr, Instant::now()),
                Err(e) => warn!(error = %e, "Error receiving datagram"),
            }
        }
    }

    fn dispatch(&self, index: usize, data: &[u8], addr: SocketAddr, received_at: Instant) {
        if data.len() < PACKET_HEADER_LENGTH {
            warn!(client_addr = %addr, len = data.len(), "Datagram too short, dropped");
            return;
        }

        let Some(secret) = self.secrets.secret_for(addr.ip()) else {
            warn!(client_addr = %addr, "No shared secret for address, dropped");
            return;
        };

        let packet = match self.codec.decode_request(data, &secret) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(client_addr = %addr, error = %e, "Error decoding request, dropped");
                return;
            }
        };

        trace!(
            client_addr = %addr,
            request_id = packet.identifier,
            code = %packet.code,
            "Received request"
        );

        let request = ClientRequest::new(
            addr,
            received_at,
            secret,
            packet,
            Arc::clone(&self.sockets[index]),
            self.codec.clone(),
        );

        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if listeners.is_empty() {
            error!(client_addr = %addr, "No listeners registered, request dropped");
        }
        for listener in listeners {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| listener.on_request(request.clone())));
            if delivered.is_err() {
                error!(
                    client_addr = %addr,
                    request_id = request.packet().identifier,
                    "Listener panicked, request dropped for this listener"
                );
            }
        }
    }
}

/// Wait for a datagram on any socket. Polling starts after the socket that
/// delivered last so a busy socket cannot starve the others.
async fn recv_any(
    sockets: &[Arc<UdpSocket>],
    buf: &mut [u8],
    next: &mut usize,
) -> io::Result<(usize, usize, SocketAddr)> {
    if sockets.is_empty() {
        return std::future::pending().await;
    }
    poll_fn(|cx| {
        for offset in 0..sockets.len() {
            let index = (*next + offset) % sockets.len();
            let mut read_buf = ReadBuf::new(&mut buf[..]);
            match sockets[index].poll_recv_from(cx, &mut read_buf) {
                Poll::Ready(Ok(addr)) => {
                    *next = index + 1;
                    return Poll::Ready(Ok((index, read_buf.filled().len(), addr)));
                }
                Poll::Ready(Err(e)) => {
                    *next = index + 1;
                    return Poll::Ready(Err(e));
                }
                Poll::Pending => {}
            }
        }
        Poll::Pending
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use radius_proto::{Code, RadiusAttribute};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct ForwardListener(mpsc::UnboundedSender<ClientRequest>);

    impl ServerChannelListener for ForwardListener {
        fn on_request(&self, request: ClientRequest) {
            let _ = self.0.send(request);
        }
    }

    struct CountingListener(Mutex<usize>);

    impl ServerChannelListener for CountingListener {
        fn on_request(&self, _request: ClientRequest) {
            *self.0.lock().unwrap() += 1;
        }
    }

    struct PanicOnce(Mutex<bool>);

    impl ServerChannelListener for PanicOnce {
        fn on_request(&self, _request: ClientRequest) {
            let mut panicked = self.0.lock().unwrap();
            if !*panicked {
                *panicked = true;
                drop(panicked);
                panic!("listener failure");
            }
        }
    }

    fn local_secrets(secret: &str) -> Arc<ClientSecrets> {
        let secrets = ClientSecrets::new();
        secrets.insert("127.0.0.1/32".parse().unwrap(), secret);
        Arc::new(secrets)
    }

    async fn started_channel(
        secrets: Arc<ClientSecrets>,
    ) -> (ServerChannel, Vec<SocketAddr>, mpsc::UnboundedReceiver<ClientRequest>) {
        let addrs: Vec<SocketAddr> = vec!["127.0.0.1:0".parse().unwrap(), "127.0.0.1:0".parse().unwrap()];
        let mut channel = ServerChannel::bind(&addrs, secrets, Codec::new()).await.unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        channel.add_listener(Arc::new(ForwardListener(tx)));
        channel.start();
        let bound = channel.local_addrs().unwrap();
        (channel, bound, rx)
    }

    fn encoded_request(id: u8, secret: &[u8]) -> (Packet, Vec<u8>) {
        let mut request = Packet::request(Code::AccessRequest)
            .with_attribute(RadiusAttribute::user_name("alice"))
            .with_attribute(RadiusAttribute::user_password("secret-pw"));
        request.identifier = id;
        let data = Codec::new().encode_request(&request, secret).unwrap();
        (request, data)
    }

    #[tokio::test]
    async fn test_receive_on_every_socket_and_respond() {
        let (mut channel, bound, mut rx) = started_channel(local_secrets("testing123")).await;
        assert!(channel.is_running());
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        for (id, addr) in bound.iter().enumerate() {
            let (request, data) = encoded_request(id as u8, b"testing123");
            client.send_to(&data, addr).await.unwrap();

            let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(received.addr(), client.local_addr().unwrap());
            assert_eq!(received.local_addr().unwrap(), *addr);
            assert_eq!(received.secret(), b"testing123");
            assert_eq!(received.packet().user_name(), Some("alice"));

            let accept = Packet::response(Code::AccessAccept, received.packet());
            received.send_response(&accept).await.unwrap();

            let mut buf = [0u8; 4096];
            let (len, from) = client.recv_from(&mut buf).await.unwrap();
            assert_eq!(from, *addr);
            let response = Codec::new()
                .decode_response(&buf[..len], &request, b"testing123")
                .unwrap();
            assert_eq!(response.code, Code::AccessAccept);
        }

        channel.stop();
        assert!(!channel.is_running());
    }

    #[tokio::test]
    async fn test_drop_unknown_short_and_undecodable() {
        let secrets = local_secrets("testing123");
        let addrs: Vec<SocketAddr> = vec!["127.0.0.1:0".parse().unwrap()];
        let mut channel = ServerChannel::bind(&addrs, Arc::clone(&secrets), Codec::new())
            .await
            .unwrap();
        let counter = Arc::new(CountingListener(Mutex::new(0)));
        channel.add_listener(counter.clone());
        channel.start();
        let server = channel.local_addrs().unwrap()[0];
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        // Too short
        client.send_to(&[1, 2, 3], server).await.unwrap();
        // Response code is not a request
        let mut data = encoded_request(1, b"testing123").1;
        data[0] = Code::AccessAccept.as_u8();
        client.send_to(&data, server).await.unwrap();
        // Length field disagrees with the datagram
        let mut data = encoded_request(2, b"testing123").1;
        data.push(0);
        client.send_to(&data, server).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*counter.0.lock().unwrap(), 0);

        // Secret removed while running
        secrets.remove("127.0.0.1/32".parse().unwrap());
        client.send_to(&encoded_request(3, b"testing123").1, server).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*counter.0.lock().unwrap(), 0);

        secrets.insert("127.0.0.0/8".parse().unwrap(), "testing123");
        client.send_to(&encoded_request(4, b"testing123").1, server).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*counter.0.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_send_response_identifier_mismatch() {
        let (_channel, bound, mut rx) = started_channel(local_secrets("testing123")).await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(&encoded_request(9, b"testing123").1, bound[0]).await.unwrap();

        let received = rx.recv().await.unwrap();
        let mut accept = Packet::response(Code::AccessAccept, received.packet());
        accept.identifier = 10;
        let result = received.send_response(&accept).await;
        assert!(matches!(
            result,
            Err(ChannelError::IdentifierMismatch { request: 9, response: 10 })
        ));
    }

    #[tokio::test]
    async fn test_panicking_listener_does_not_stop_receive_loop() {
        let addrs: Vec<SocketAddr> = vec!["127.0.0.1:0".parse().unwrap()];
        let mut channel = ServerChannel::bind(&addrs, local_secrets("testing123"), Codec::new())
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        channel.add_listener(Arc::new(PanicOnce(Mutex::new(false))));
        channel.add_listener(Arc::new(ForwardListener(tx)));
        channel.start();
        let server = channel.local_addrs().unwrap()[0];
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let mut delivered = Vec::new();
        for id in [1u8, 2] {
            let (_, data) = encoded_request(id, b"testing123");
            client.send_to(&data, server).await.unwrap();
            let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("datagram dispatched")
                .unwrap();
            delivered.push(received.packet().identifier);
        }

        assert_eq!(delivered, vec![1, 2]);
        assert!(channel.is_running());
    }
}
