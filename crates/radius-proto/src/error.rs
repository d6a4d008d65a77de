use crate::attributes::AttributeType;
use crate::packet::Code;
use thiserror::Error;

/// Malformed wire data or a packet that fails verification.
///
/// Always local to one packet: a channel drops (server) or retries (client)
/// on this error and keeps running.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid packet length: {0}")]
    InvalidLength(usize),
    #[error("Invalid packet code: {0}")]
    InvalidCode(u8),
    #[error("Unexpected packet role: {code} is not a {expected}")]
    UnexpectedRole { code: Code, expected: &'static str },
    #[error("Identifier mismatch: request {request}, response {response}")]
    IdentifierMismatch { request: u8, response: u8 },
    #[error("Incorrect response authenticator")]
    ResponseAuthenticator,
    #[error("Incorrect Message-Authenticator")]
    MessageAuthenticator,
    #[error("Attribute {attr_type}: {reason}")]
    Attribute {
        attr_type: AttributeType,
        reason: String,
    },
    #[error("Attribute value too long: {0} bytes")]
    AttributeTooLong(usize),
    #[error("Packet too large: {0} bytes")]
    PacketTooLarge(usize),
}

impl CodecError {
    pub(crate) fn attribute(attr_type: AttributeType, reason: impl Into<String>) -> Self {
        CodecError::Attribute {
            attr_type,
            reason: reason.into(),
        }
    }
}

/// A value that cannot be assigned to an attribute, or an out-of-range
/// argument to a constructor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value: {0}")]
pub struct InvalidValue(pub String);

impl InvalidValue {
    pub fn new(reason: impl Into<String>) -> Self {
        InvalidValue(reason.into())
    }
}
