//! Message-Authenticator Support (RFC 2869 Section 5.14)
//!
//! HMAC-MD5 keyed with the shared secret, computed over the whole packet
//! with the Message-Authenticator value zeroed. Responses are signed with
//! the Request Authenticator in the authenticator field.

use crate::error::CodecError;
use crate::packet::{ATTRIBUTE_HEADER_LENGTH, AUTHENTICATOR_RANGE, PACKET_HEADER_LENGTH};
use hmac::{Hmac, Mac};
use md5_digest::Md5;

type HmacMd5 = Hmac<Md5>;

const MESSAGE_AUTHENTICATOR_TYPE: u8 = 80;
const MESSAGE_AUTHENTICATOR_LENGTH: usize = 16;

/// HMAC-MD5 of `packet_bytes` keyed with `secret`
pub fn calculate_message_authenticator(packet_bytes: &[u8], secret: &[u8]) -> Result<[u8; 16], CodecError> {
    let mut mac = HmacMd5::new_from_slice(secret).map_err(|_| CodecError::MessageAuthenticator)?;
    mac.update(packet_bytes);
    Ok(mac.finalize().into_bytes().into())
}

/// Offset of the first top-level Message-Authenticator value in an encoded
/// packet.
pub fn find_message_authenticator(packet_bytes: &[u8]) -> Option<usize> {
    let mut offset = PACKET_HEADER_LENGTH;
    while offset + ATTRIBUTE_HEADER_LENGTH <= packet_bytes.len() {
        let attr_type = packet_bytes[offset];
        let length = usize::from(packet_bytes[offset + 1]);
        if length < ATTRIBUTE_HEADER_LENGTH || offset + length > packet_bytes.len() {
            return None;
        }
        if attr_type == MESSAGE_AUTHENTICATOR_TYPE
            && length == ATTRIBUTE_HEADER_LENGTH + MESSAGE_AUTHENTICATOR_LENGTH
        {
            return Some(offset + ATTRIBUTE_HEADER_LENGTH);
        }
        offset += length;
    }
    None
}

fn signing_copy(packet_bytes: &[u8], offset: usize, request_authenticator: Option<&[u8; 16]>) -> Vec<u8> {
    let mut copy = packet_bytes.to_vec();
    copy[offset..offset + MESSAGE_AUTHENTICATOR_LENGTH].fill(0);
    if let Some(authenticator) = request_authenticator {
        copy[AUTHENTICATOR_RANGE].copy_from_slice(authenticator);
    }
    copy
}

/// Fill the Message-Authenticator value at `offset`.
///
/// Pass the Request Authenticator when signing a response.
pub fn sign_message_authenticator(
    packet_bytes: &mut [u8],
    offset: usize,
    request_authenticator: Option<&[u8; 16]>,
    secret: &[u8],
) -> Result<(), CodecError> {
    if offset + MESSAGE_AUTHENTICATOR_LENGTH > packet_bytes.len() {
        return Err(CodecError::MessageAuthenticator);
    }
    let copy = signing_copy(packet_bytes, offset, request_authenticator);
    let mac = calculate_message_authenticator(&copy, secret)?;
    packet_bytes[offset..offset + MESSAGE_AUTHENTICATOR_LENGTH].copy_from_slice(&mac);
    Ok(())
}

/// Check the Message-Authenticator value at `offset`.
pub fn verify_message_authenticator(
    packet_bytes: &[u8],
    offset: usize,
    request_authenticator: Option<&[u8; 16]>,
    secret: &[u8],
) -> bool {
    if offset + MESSAGE_AUTHENTICATOR_LENGTH > packet_bytes.len() {
        return false;
    }
    let received = &packet_bytes[offset..offset + MESSAGE_AUTHENTICATOR_LENGTH];
    let copy = signing_copy(packet_bytes, offset, request_authenticator);
    match calculate_message_authenticator(&copy, secret) {
        Ok(expected) => crate::mschap::constant_time_eq(received, &expected),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet_with_message_authenticator() -> Vec<u8> {
        let mut packet = vec![1u8, 7, 0, 40];
        packet.extend_from_slice(&[9u8; 16]);
        packet.extend_from_slice(&[80, 18]);
        packet.extend_from_slice(&[0u8; 16]);
        packet.extend_from_slice(&[1, 2, b'x', 0]);
        packet.truncate(40);
        packet
    }

    #[test]
    fn test_calculate_message_authenticator() {
        let packet = vec![0u8; 20];
        let auth = calculate_message_authenticator(&packet, b"testing123").unwrap();
        assert_eq!(auth, calculate_message_authenticator(&packet, b"testing123").unwrap());
        assert_ne!(auth, calculate_message_authenticator(&packet, b"other").unwrap());
    }

    #[test]
    fn test_find_message_authenticator() {
        let packet = packet_with_message_authenticator();
        assert_eq!(find_message_authenticator(&packet), Some(22));
        assert_eq!(find_message_authenticator(&packet[..20]), None);
    }

    #[test]
    fn test_sign_and_verify() {
        let mut packet = packet_with_message_authenticator();
        sign_message_authenticator(&mut packet, 22, None, b"testing123").unwrap();
        assert_ne!(&packet[22..38], &[0u8; 16]);
        assert!(verify_message_authenticator(&packet, 22, None, b"testing123"));
        assert!(!verify_message_authenticator(&packet, 22, None, b"wrong"));

        packet[39] ^= 0xFF;
        assert!(!verify_message_authenticator(&packet, 22, None, b"testing123"));
    }

    #[test]
    fn test_response_signed_with_request_authenticator() {
        let request_auth = [9u8; 16];
        let mut packet = packet_with_message_authenticator();
        sign_message_authenticator(&mut packet, 22, Some(&request_auth), b"s").unwrap();
        // Overwriting the authenticator field must not break verification.
        packet[4..20].copy_from_slice(&[0xEE; 16]);
        assert!(verify_message_authenticator(&packet, 22, Some(&request_auth), b"s"));
        assert!(!verify_message_authenticator(&packet, 22, None, b"s"));
    }
}
