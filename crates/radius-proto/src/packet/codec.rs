use super::{AUTHENTICATOR_RANGE, Code, PACKET_HEADER_LENGTH, PACKET_MAX_LENGTH, Packet};
use crate::attributes::{AttributeFactory, AttributeType, AttributesList, DecodeContext};
use crate::auth::{response_authenticator, verify_response_authenticator};
use crate::error::CodecError;
use crate::message_auth::{find_message_authenticator, sign_message_authenticator, verify_message_authenticator};
use std::sync::Arc;
use tracing::trace;

/// Encodes and decodes packets, computing and checking the derived fields.
///
/// Requests and responses have separate entry points because a response
/// can only be produced or checked against the request it answers. Cloning
/// shares the attribute factory.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    factory: Arc<AttributeFactory>,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory(factory: Arc<AttributeFactory>) -> Self {
        Codec { factory }
    }

    pub fn factory(&self) -> &AttributeFactory {
        &self.factory
    }

    /// Encode a request as-is. Its authenticator is sent unchanged.
    pub fn encode_request(&self, request: &Packet, secret: &[u8]) -> Result<Vec<u8>, CodecError> {
        if !request.is_request() {
            return Err(CodecError::UnexpectedRole {
                code: request.code,
                expected: "request",
            });
        }
        let mut buffer = encode_packet(request, &request.authenticator, secret)?;
        if request.attributes.contains(AttributeType::MESSAGE_AUTHENTICATOR) {
            let offset = find_message_authenticator(&buffer).ok_or(CodecError::MessageAuthenticator)?;
            sign_message_authenticator(&mut buffer, offset, None, secret)?;
        }
        Ok(buffer)
    }

    /// Encode a response to `request`, patching in the Response Authenticator.
    pub fn encode_response(&self, response: &Packet, request: &Packet, secret: &[u8]) -> Result<Vec<u8>, CodecError> {
        if !response.code.answers(request.code) {
            return Err(CodecError::UnexpectedRole {
                code: response.code,
                expected: "response to the request",
            });
        }
        if response.identifier != request.identifier {
            return Err(CodecError::IdentifierMismatch {
                request: request.identifier,
                response: response.identifier,
            });
        }

        let mut buffer = encode_packet(response, &request.authenticator, secret)?;
        if response.attributes.contains(AttributeType::MESSAGE_AUTHENTICATOR) {
            let offset = find_message_authenticator(&buffer).ok_or(CodecError::MessageAuthenticator)?;
            sign_message_authenticator(&mut buffer, offset, Some(&request.authenticator), secret)?;
        }
        let authenticator = response_authenticator(&buffer, &request.authenticator, secret);
        buffer[AUTHENTICATOR_RANGE].copy_from_slice(&authenticator);
        Ok(buffer)
    }

    pub fn decode_request(&self, data: &[u8], secret: &[u8]) -> Result<Packet, CodecError> {
        let (code, identifier, authenticator) = read_header(data)?;
        if !code.is_request() {
            return Err(CodecError::UnexpectedRole {
                code,
                expected: "request",
            });
        }
        if let Some(offset) = find_message_authenticator(data) {
            if !verify_message_authenticator(data, offset, None, secret) {
                return Err(CodecError::MessageAuthenticator);
            }
        }

        let attributes = self.decode_attributes(data, secret, &authenticator)?;
        trace!(code = %code, identifier, attributes = attributes.len(), "decoded request");
        Ok(Packet {
            code,
            identifier,
            authenticator,
            attributes,
        })
    }

    /// Decode and verify a response to `request`.
    pub fn decode_response(&self, data: &[u8], request: &Packet, secret: &[u8]) -> Result<Packet, CodecError> {
        let (code, identifier, authenticator) = read_header(data)?;
        if !code.answers(request.code) {
            return Err(CodecError::UnexpectedRole {
                code,
                expected: "response to the request",
            });
        }
        if identifier != request.identifier {
            return Err(CodecError::IdentifierMismatch {
                request: request.identifier,
                response: identifier,
            });
        }
        if !verify_response_authenticator(data, &request.authenticator, secret) {
            return Err(CodecError::ResponseAuthenticator);
        }
        if let Some(offset) = find_message_authenticator(data) {
            if !verify_message_authenticator(data, offset, Some(&request.authenticator), secret) {
                return Err(CodecError::MessageAuthenticator);
            }
        }

        let attributes = self.decode_attributes(data, secret, &request.authenticator)?;
        trace!(code = %code, identifier, attributes = attributes.len(), "decoded response");
        Ok(Packet {
            code,
            identifier,
            authenticator,
            attributes,
        })
    }

    fn decode_attributes(
        &self,
        data: &[u8],
        secret: &[u8],
        authenticator: &[u8; 16],
    ) -> Result<AttributesList, CodecError> {
        let ctx = DecodeContext {
            secret,
            authenticator,
            factory: &self.factory,
        };
        let mut attributes = AttributesList::new();
        attributes.decode_from(&data[PACKET_HEADER_LENGTH..], &ctx)?;
        Ok(attributes)
    }
}

/// Serialize header and attributes; `authenticator` goes into the header
/// and keys the secret-dependent attribute values.
fn encode_packet(packet: &Packet, authenticator: &[u8; 16], secret: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut buffer = Vec::with_capacity(PACKET_MAX_LENGTH);
    buffer.push(packet.code.as_u8());
    buffer.push(packet.identifier);
    buffer.extend_from_slice(&[0, 0]);
    buffer.extend_from_slice(authenticator);
    packet.attributes.encode_into(secret, authenticator, &mut buffer)?;

    let length = buffer.len();
    if length > PACKET_MAX_LENGTH {
        return Err(CodecError::PacketTooLarge(length));
    }
    buffer[2..4].copy_from_slice(&(length as u16).to_be_bytes());
    Ok(buffer)
}

fn read_header(data: &[u8]) -> Result<(Code, u8, [u8; 16]), CodecError> {
    if data.len() < PACKET_HEADER_LENGTH || data.len() > PACKET_MAX_LENGTH {
        return Err(CodecError::InvalidLength(data.len()));
    }
    let length = usize::from(u16::from_be_bytes([data[2], data[3]]));
    if length != data.len() {
        return Err(CodecError::InvalidLength(length));
    }
    let code = Code::from_u8(data[0]).ok_or(CodecError::InvalidCode(data[0]))?;
    let mut authenticator = [0u8; 16];
    authenticator.copy_from_slice(&data[AUTHENTICATOR_RANGE]);
    Ok((code, data[1], authenticator))
}
