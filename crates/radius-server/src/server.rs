use crate::accounting::SimpleAccountingModule;
use crate::channel::ServerChannel;
use crate::config::{Config, ConfigError};
use crate::error::{ChannelError, HandlerError};
use crate::handler::{RequestHandler, StandardRequestHandler};
use crate::queue::{TrackingConfig, TrackingQueue};
use crate::secrets::ClientSecrets;
use crate::users::SimpleAuthModule;
use radius_proto::Codec;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Everything a [`RadiusServer`] needs besides its handler
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addrs: Vec<SocketAddr>,
    pub secrets: Arc<ClientSecrets>,
    pub tracking: TrackingConfig,
    pub codec: Codec,
}

impl ServerConfig {
    pub fn new(listen_addrs: Vec<SocketAddr>, secrets: Arc<ClientSecrets>) -> Self {
        ServerConfig {
            listen_addrs,
            secrets,
            tracking: TrackingConfig::default(),
            codec: Codec::new(),
        }
    }

    pub fn with_tracking(mut self, tracking: TrackingConfig) -> Self {
        self.tracking = tracking;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(ServerConfig {
            listen_addrs: config.socket_addrs()?,
            secrets: Arc::new(config.client_secrets()?),
            tracking: TrackingConfig {
                session_timeout: config.session_timeout(),
                max_clients: config.max_clients,
            },
            codec: Codec::new(),
        })
    }
}

/// Server runtime: the channel feeds a tracking queue, and one handler
/// task takes requests from it and sends the responses.
pub struct RadiusServer {
    channel: ServerChannel,
    queue: Arc<TrackingQueue>,
    handler: Arc<dyn RequestHandler>,
    handler_task: Option<JoinHandle<()>>,
}

impl RadiusServer {
    /// Bind the listen sockets. Requests are processed after
    /// [`RadiusServer::start`].
    pub async fn new(config: ServerConfig, handler: Arc<dyn RequestHandler>) -> Result<Self, ServerError> {
        let channel = ServerChannel::bind(&config.listen_addrs, config.secrets, config.codec).await?;
        let queue = Arc::new(TrackingQueue::new(config.tracking));
        channel.add_listener(queue.clone());

        Ok(RadiusServer {
            channel,
            queue,
            handler,
            handler_task: None,
        })
    }

    /// Server with the in-memory user and accounting modules built from
    /// `config`.
    pub async fn from_config(config: &Config) -> Result<Self, ServerError> {
        let users = Arc::new(SimpleAuthModule::from_users(&config.users));
        let handler = StandardRequestHandler::new()
            .with_pap_module(users.clone())
            .with_chap_module(users.clone())
            .with_ms_chap_module(users.clone())
            .with_ms_chap2_module(users)
            .with_accounting_module(Arc::new(SimpleAccountingModule::new()))
            .with_accounting_interval(config.accounting_interval_secs);

        Self::new(ServerConfig::from_config(config)?, Arc::new(handler)).await
    }

    pub fn local_addrs(&self) -> Result<Vec<SocketAddr>, ServerError> {
        Ok(self.channel.local_addrs()?)
    }

    /// Shared secret table, modifiable while running
    pub fn secrets(&self) -> &Arc<ClientSecrets> {
        self.channel.secrets()
    }

    pub fn queue(&self) -> &Arc<TrackingQueue> {
        &self.queue
    }

    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.channel.start();
        let queue = Arc::clone(&self.queue);
        let handler = Arc::clone(&self.handler);
        self.handler_task = Some(tokio::spawn(handle_requests(queue, handler)));
        info!("RADIUS server started");
    }

    pub fn is_running(&self) -> bool {
        self.channel.is_running()
            && self.handler_task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn stop(&mut self) {
        self.channel.stop();
        if let Some(task) = self.handler_task.take() {
            task.abort();
            info!("RADIUS server stopped");
        }
    }

    /// Start and serve until Ctrl+C.
    pub async fn run(mut self) -> Result<(), ServerError> {
        self.start();
        tokio::signal::ctrl_c().await?;
        info!("Shutdown requested");
        self.stop();
        Ok(())
    }
}

impl Drop for RadiusServer {
    fn drop(&mut self) {
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

async fn handle_requests(queue: Arc<TrackingQueue>, handler: Arc<dyn RequestHandler>) {
    loop {
        let request = queue.take_request().await;
        let packet = request.packet();
        match handler.handle_request(packet).await {
            Ok(Some(response)) => {
                if let Err(e) = request.send_response(&response).await {
                    error!(
                        client_addr = %request.addr(),
                        request_id = packet.identifier,
                        error = %e,
                        "Error sending response"
                    );
                }
            }
            Ok(None) => {
                warn!(
                    client_addr = %request.addr(),
                    request_id = packet.identifier,
                    code = %packet.code,
                    "No handler response"
                );
            }
            Err(HandlerError::IncorrectRequest(reason)) => {
                debug!(
                    client_addr = %request.addr(),
                    request_id = packet.identifier,
                    reason = %reason,
                    "Incorrect request"
                );
            }
            Err(e) => {
                error!(
                    client_addr = %request.addr(),
                    request_id = packet.identifier,
                    error = %e,
                    "Request handler error"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Client, User};

    #[test]
    fn test_server_config_from_config() {
        let mut config = Config::default();
        config.listen_addresses = vec!["127.0.0.1:18120".to_string()];
        config.max_clients = 5;
        config.clients.push(Client {
            address: "127.0.0.1".to_string(),
            secret: "s".to_string(),
            name: None,
            enabled: true,
        });

        let server_config = ServerConfig::from_config(&config).unwrap();
        assert_eq!(server_config.listen_addrs, vec!["127.0.0.1:18120".parse().unwrap()]);
        assert_eq!(server_config.tracking.max_clients, 5);
        assert_eq!(server_config.secrets.len(), 1);
    }

    #[tokio::test]
    async fn test_start_stop() {
        let mut config = Config::default();
        config.listen_addresses = vec!["127.0.0.1:0".to_string()];
        config.users.push(User {
            username: "alice".to_string(),
            password: "pw".to_string(),
            framed_ip_address: None,
        });

        let mut server = RadiusServer::from_config(&config).await.unwrap();
        assert!(!server.is_running());
        assert_eq!(server.local_addrs().unwrap().len(), 1);

        server.start();
        assert!(server.is_running());
        server.stop();
        assert!(!server.is_running());
    }
}
