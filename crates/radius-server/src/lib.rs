//! RADIUS client and server runtime
//!
//! This crate puts the `radius-proto` codec on the network.
//!
//! # Features
//!
//! - Client channel with retransmission and a client-side authenticator for
//!   PAP, CHAP, MS-CHAP and MS-CHAPv2
//! - Server channel multiplexing any number of listen sockets
//! - Tracking queue keeping the latest pending request per client
//! - Pluggable authentication and accounting modules
//! - JSON configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use radius_server::{
//!     ClientSecrets, RadiusServer, ServerConfig, SimpleAuthModule, StandardRequestHandler,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut users = SimpleAuthModule::new();
//!     users.add_user("alice", "password");
//!     let handler = StandardRequestHandler::new().with_pap_module(Arc::new(users));
//!
//!     let secrets = ClientSecrets::new();
//!     secrets.insert("127.0.0.1/32".parse()?, "testing123");
//!
//!     let config = ServerConfig::new(vec!["0.0.0.0:1812".parse()?], Arc::new(secrets));
//!     let server = RadiusServer::new(config, Arc::new(handler)).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod accounting;
pub mod authenticator;
pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod queue;
pub mod secrets;
pub mod server;
pub mod users;

pub use accounting::{AccountingModule, Session, SimpleAccountingModule};
pub use authenticator::{AuthScheme, RadiusAuthenticator};
pub use channel::{ClientRequest, ServerChannel, ServerChannelListener};
pub use client::{ClientChannel, ClientConfig};
pub use config::{Client, Config, ConfigError, User};
pub use error::{AccountingError, AuthenticationError, AuthenticatorError, ChannelError, HandlerError};
pub use handler::{
    ChapAuthModule, MsChap2AuthModule, MsChapAuthModule, PapAuthModule, RequestHandler,
    StandardRequestHandler,
};
pub use queue::{TrackingConfig, TrackingQueue};
pub use secrets::ClientSecrets;
pub use server::{RadiusServer, ServerConfig, ServerError};
pub use users::SimpleAuthModule;
