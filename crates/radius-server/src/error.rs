use radius_proto::{CodecError, InvalidValue};
use thiserror::Error;

/// Transport level failure of a client or server channel.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("No valid response after {attempts} attempts")]
    RequestTimeout { attempts: u32 },
    #[error("Identifier mismatch: request {request}, response {response}")]
    IdentifierMismatch { request: u8, response: u8 },
}

impl ChannelError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ChannelError::RequestTimeout { .. })
    }
}

/// Credentials rejected, or a scheme the back end cannot check.
///
/// The message becomes the Reply-Message of the Access-Reject.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct AuthenticationError(pub String);

impl AuthenticationError {
    pub fn new(reason: impl Into<String>) -> Self {
        AuthenticationError(reason.into())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// Accounting back end failure. The request is dropped and the NAS retransmits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountingError {
    #[error("Duplicate session: {0}")]
    DuplicateSession(String),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("{0}")]
    Failed(String),
}

/// Raised by a request handler; never reaches the network peer.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The request lacks something the handler needs. Logged at debug.
    #[error("Incorrect request: {0}")]
    IncorrectRequest(String),
    #[error("Request handling failed: {0}")]
    Failed(String),
}

/// Failure of the client-side authenticator.
#[derive(Error, Debug)]
pub enum AuthenticatorError {
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthenticationError),
    #[error("Invalid value: {0}")]
    InvalidValue(#[from] InvalidValue),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChannelError::RequestTimeout { attempts: 3 };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "No valid response after 3 attempts");

        let err = AuthenticatorError::from(AuthenticationError::new("bad password"));
        assert_eq!(err.to_string(), "Authentication failed: bad password");

        let err = ChannelError::from(CodecError::ResponseAuthenticator);
        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "Codec error: Incorrect response authenticator");
    }

    #[test]
    fn test_channel_error_variants() {
        let describe = |err: &ChannelError| match err {
            ChannelError::Io(_) => "io",
            ChannelError::Codec(_) => "codec",
            ChannelError::RequestTimeout { .. } => "timeout",
            ChannelError::IdentifierMismatch { .. } => "mismatch",
        };
        let err = ChannelError::IdentifierMismatch { request: 4, response: 5 };
        assert_eq!(describe(&err), "mismatch");
        assert_eq!(err.to_string(), "Identifier mismatch: request 4, response 5");
    }
}
