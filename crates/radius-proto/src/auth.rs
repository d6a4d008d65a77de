//! Authenticator and User-Password hiding (RFC 2865 Section 3 and 5.2).

use crate::error::CodecError;
use crate::packet::AUTHENTICATOR_RANGE;
use rand::Rng;

/// Generate a random Request Authenticator (16 bytes) per RFC 2865 Section 3
pub fn generate_request_authenticator() -> [u8; 16] {
    let mut rng = rand::rng();
    let mut authenticator = [0u8; 16];
    rng.fill(&mut authenticator);
    authenticator
}

/// Response Authenticator over an encoded response.
///
/// Response Authenticator = MD5(Code + ID + Length + Request Authenticator + Attributes + Secret)
///
/// `packet` is the full encoded response; its own authenticator field is
/// ignored and the request authenticator is used in its place.
pub fn response_authenticator(packet: &[u8], request_authenticator: &[u8; 16], secret: &[u8]) -> [u8; 16] {
    let mut context = md5::Context::new();
    context.consume(&packet[..AUTHENTICATOR_RANGE.start]);
    context.consume(request_authenticator);
    context.consume(&packet[AUTHENTICATOR_RANGE.end..]);
    context.consume(secret);
    context.compute().0
}

/// Check the authenticator of an encoded response against the request.
pub fn verify_response_authenticator(packet: &[u8], request_authenticator: &[u8; 16], secret: &[u8]) -> bool {
    packet.len() >= AUTHENTICATOR_RANGE.end
        && response_authenticator(packet, request_authenticator, secret)[..]
            == packet[AUTHENTICATOR_RANGE]
}

fn password_pad(secret: &[u8], previous: &[u8]) -> [u8; 16] {
    let mut context = md5::Context::new();
    context.consume(secret);
    context.consume(previous);
    context.compute().0
}

/// Hide a User-Password per RFC 2865 Section 5.2
///
/// The password is zero-padded to a multiple of 16 bytes, then XORed with
/// MD5(secret + request_authenticator) for the first block and
/// MD5(secret + previous ciphertext block) for subsequent blocks. An empty
/// password encodes to zero bytes.
pub fn encrypt_user_password(password: &[u8], secret: &[u8], authenticator: &[u8; 16]) -> Vec<u8> {
    let mut padded = password.to_vec();
    padded.resize(password.len().div_ceil(16) * 16, 0);

    let mut result = Vec::with_capacity(padded.len());
    let mut previous = authenticator.to_vec();
    for chunk in padded.chunks(16) {
        let pad = password_pad(secret, &previous);
        let block: Vec<u8> = chunk.iter().zip(pad).map(|(c, p)| c ^ p).collect();
        result.extend_from_slice(&block);
        previous = block;
    }
    result
}

/// Reverse [`encrypt_user_password`], trimming at the first zero byte.
pub fn decrypt_user_password(
    encrypted: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Vec<u8>, CodecError> {
    if encrypted.is_empty() {
        return Ok(Vec::new());
    }
    if encrypted.len() % 16 != 0 {
        return Err(CodecError::attribute(
            crate::attributes::AttributeType::USER_PASSWORD,
            format!("length {} is not a multiple of 16", encrypted.len()),
        ));
    }

    let mut result = Vec::with_capacity(encrypted.len());
    let mut previous: &[u8] = authenticator;
    for chunk in encrypted.chunks(16) {
        let pad = password_pad(secret, previous);
        result.extend(chunk.iter().zip(pad).map(|(c, p)| c ^ p));
        previous = chunk;
    }

    if let Some(end) = result.iter().position(|&b| b == 0) {
        result.truncate(end);
    }
    Ok(result)
}
