//! CHAP (Challenge-Handshake Authentication Protocol) Support
//!
//! This module implements CHAP authentication for RADIUS as defined in RFC 2865 Section 5.3.
//!
//! The client sends a CHAP-Challenge and a CHAP-Password holding
//! MD5(ident + password + challenge), so the password never crosses the wire.

use crate::attributes::{AttributeType, RadiusAttribute};
use crate::error::InvalidValue;
use crate::mschap::constant_time_eq;
use crate::sequence::IdSequence;
use rand::Rng;

/// CHAP-Password attribute value
///
/// A CHAP response consists of:
/// - CHAP Identifier (1 byte)
/// - CHAP Response (16 bytes MD5 hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapPassword {
    /// CHAP identifier
    pub ident: u8,
    /// MD5 hash of (ident + password + challenge)
    pub response: [u8; 16],
}

impl ChapPassword {
    pub const LENGTH: usize = 17;

    /// Compute the response for `password` against `challenge`.
    pub fn new(ident: u8, password: &str, challenge: &ChapChallenge) -> Self {
        ChapPassword {
            ident,
            response: compute_chap_response(ident, password, challenge.as_bytes()),
        }
    }

    /// Same as [`ChapPassword::new`] with the ident drawn from `idents`
    pub fn with_sequence(idents: &IdSequence, password: &str, challenge: &ChapChallenge) -> Self {
        Self::new(idents.next(), password, challenge)
    }

    pub fn verify(&self, password: &str, challenge: &ChapChallenge) -> bool {
        let expected = compute_chap_response(self.ident, password, challenge.as_bytes());
        constant_time_eq(&expected, &self.response)
    }

    /// The CHAP-Password attribute value must be exactly 17 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidValue> {
        if bytes.len() != Self::LENGTH {
            return Err(InvalidValue::new(format!(
                "CHAP-Password requires {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            )));
        }
        let mut response = [0u8; 16];
        response.copy_from_slice(&bytes[1..]);
        Ok(ChapPassword {
            ident: bytes[0],
            response,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::LENGTH);
        bytes.push(self.ident);
        bytes.extend_from_slice(&self.response);
        bytes
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        match (attribute.attr_type(), attribute.as_octets()) {
            (AttributeType::CHAP_PASSWORD, Some(raw)) => Self::from_bytes(raw),
            _ => Err(InvalidValue::new("not a CHAP-Password attribute")),
        }
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::octets(AttributeType::CHAP_PASSWORD, self.to_bytes())
    }
}

/// CHAP-Challenge attribute value, at least 5 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapChallenge(Vec<u8>);

impl ChapChallenge {
    pub const MIN_LENGTH: usize = 5;
    pub const DEFAULT_LENGTH: usize = 16;

    pub fn new(challenge: Vec<u8>) -> Result<Self, InvalidValue> {
        if challenge.len() < Self::MIN_LENGTH {
            return Err(InvalidValue::new(format!(
                "CHAP-Challenge requires at least {} bytes, got {}",
                Self::MIN_LENGTH,
                challenge.len()
            )));
        }
        Ok(ChapChallenge(challenge))
    }

    /// 16 random bytes
    pub fn random() -> Self {
        let mut challenge = vec![0u8; Self::DEFAULT_LENGTH];
        rand::rng().fill(&mut challenge[..]);
        ChapChallenge(challenge)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        match (attribute.attr_type(), attribute.as_octets()) {
            (AttributeType::CHAP_CHALLENGE, Some(raw)) => Self::new(raw.to_vec()),
            _ => Err(InvalidValue::new("not a CHAP-Challenge attribute")),
        }
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::octets(AttributeType::CHAP_CHALLENGE, self.0.clone())
    }
}

/// MD5(CHAP identifier + password + challenge)
pub fn compute_chap_response(ident: u8, password: &str, challenge: &[u8]) -> [u8; 16] {
    let mut context = md5::Context::new();
    context.consume([ident]);
    context.consume(password.as_bytes());
    context.consume(challenge);
    context.compute().0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chap_password_from_bytes() {
        let bytes = vec![0x01; 17];
        let response = ChapPassword::from_bytes(&bytes).unwrap();
        assert_eq!(response.ident, 0x01);
        assert_eq!(response.response, [0x01; 16]);

        assert!(ChapPassword::from_bytes(&[0x01; 16]).is_err());
        assert!(ChapPassword::from_bytes(&[0x01; 18]).is_err());
    }

    #[test]
    fn test_compute_chap_response() {
        let ident = 0x01;
        let password = "password";
        let challenge = b"0123456789abcdef";

        let response = compute_chap_response(ident, password, challenge);
        assert_eq!(response, compute_chap_response(ident, password, challenge));
        assert_ne!(response, compute_chap_response(ident, "different", challenge));
        assert_ne!(response, compute_chap_response(0x02, password, challenge));
        assert_ne!(response, compute_chap_response(ident, password, b"fedcba9876543210"));
    }

    #[test]
    fn test_verify_chap_password() {
        let challenge = ChapChallenge::random();
        let idents = IdSequence::starting_at(0x10);
        let chap = ChapPassword::with_sequence(&idents, "secret123", &challenge);
        assert_eq!(chap.ident, 0x10);

        assert!(chap.verify("secret123", &challenge));
        assert!(!chap.verify("wrongpassword", &challenge));

        let wrong_ident = ChapPassword {
            ident: 0x20,
            ..chap.clone()
        };
        assert!(!wrong_ident.verify("secret123", &challenge));
    }

    #[test]
    fn test_attribute_conversion() {
        let challenge = ChapChallenge::new(b"0123456789ABCDEF".to_vec()).unwrap();
        let chap = ChapPassword::new(1, "MyPassword", &challenge);

        let attr = chap.to_attribute();
        assert_eq!(attr.attr_type(), AttributeType::CHAP_PASSWORD);
        assert_eq!(ChapPassword::from_attribute(&attr).unwrap(), chap);
        assert_eq!(ChapChallenge::from_attribute(&challenge.to_attribute()).unwrap(), challenge);
        assert!(ChapChallenge::from_attribute(&attr).is_err());
    }

    #[test]
    fn test_challenge_minimum_length() {
        assert!(ChapChallenge::new(vec![0u8; 4]).is_err());
        assert!(ChapChallenge::new(vec![0u8; 5]).is_ok());
    }
}
