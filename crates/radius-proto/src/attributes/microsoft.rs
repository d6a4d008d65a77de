//! Microsoft vendor-specific attributes (RFC 2548), vendor code 311.
//!
//! Each structured MS-CHAP field has a typed view that converts to and from
//! the [`RadiusAttribute`] carrying it. Decoding length rules are registered
//! in the default [`AttributeFactory`].

use super::attribute::RadiusAttribute;
use super::factory::{AttributeFactory, fixed_octets, ident_string, min_octets};
use super::types::AttributeType;
use crate::error::InvalidValue;
use crate::mschap;
use crate::sequence::IdSequence;
use rand::Rng;

pub const VENDOR_MICROSOFT: u32 = 311;

pub const MS_CHAP_RESPONSE: AttributeType = AttributeType::new(VENDOR_MICROSOFT, 1);
pub const MS_CHAP_ERROR: AttributeType = AttributeType::new(VENDOR_MICROSOFT, 2);
pub const MS_CHAP_CPW_1: AttributeType = AttributeType::new(VENDOR_MICROSOFT, 3);
pub const MS_CHAP_CPW_2: AttributeType = AttributeType::new(VENDOR_MICROSOFT, 4);
pub const MS_CHAP_NT_ENC_PW: AttributeType = AttributeType::new(VENDOR_MICROSOFT, 6);
pub const MS_CHAP_DOMAIN: AttributeType = AttributeType::new(VENDOR_MICROSOFT, 10);
pub const MS_CHAP_CHALLENGE: AttributeType = AttributeType::new(VENDOR_MICROSOFT, 11);
pub const MS_CHAP2_RESPONSE: AttributeType = AttributeType::new(VENDOR_MICROSOFT, 25);
pub const MS_CHAP2_SUCCESS: AttributeType = AttributeType::new(VENDOR_MICROSOFT, 26);
pub const MS_CHAP2_CPW: AttributeType = AttributeType::new(VENDOR_MICROSOFT, 27);

pub(crate) fn register(factory: &mut AttributeFactory) {
    factory.register(MS_CHAP_RESPONSE, fixed_octets::<{ MsChapResponse::LENGTH }>);
    factory.register(MS_CHAP_ERROR, ident_string);
    factory.register(MS_CHAP_CPW_1, fixed_octets::<{ MsChapCpw1::LENGTH }>);
    factory.register(MS_CHAP_CPW_2, fixed_octets::<{ MsChapCpw2::LENGTH }>);
    factory.register(MS_CHAP_NT_ENC_PW, min_octets::<{ MsChapNtEncPw::MIN_LENGTH }>);
    factory.register(MS_CHAP_DOMAIN, ident_string);
    factory.register(MS_CHAP_CHALLENGE, min_octets::<{ MsChapChallenge::MIN_LENGTH }>);
    factory.register(MS_CHAP2_RESPONSE, fixed_octets::<{ MsChap2Response::LENGTH }>);
    factory.register(MS_CHAP2_SUCCESS, ident_string);
    factory.register(MS_CHAP2_CPW, fixed_octets::<{ MsChap2Cpw::LENGTH }>);
}

fn octets_of(attribute: &RadiusAttribute, expected: AttributeType) -> Result<&[u8], InvalidValue> {
    if attribute.attr_type() != expected {
        return Err(InvalidValue::new(format!(
            "expected attribute {expected}, got {}",
            attribute.attr_type()
        )));
    }
    attribute
        .as_octets()
        .ok_or_else(|| InvalidValue::new(format!("attribute {expected} is not an octets value")))
}

fn exact<const N: usize>(raw: &[u8], what: &str) -> Result<[u8; N], InvalidValue> {
    raw.try_into()
        .map_err(|_| InvalidValue::new(format!("{what} requires {N} bytes, got {}", raw.len())))
}

/// MS-CHAP-Challenge: authenticator challenge, 8 bytes for MS-CHAPv1 and
/// 16 bytes for MS-CHAPv2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsChapChallenge(Vec<u8>);

impl MsChapChallenge {
    pub const MIN_LENGTH: usize = 8;
    pub const DEFAULT_LENGTH: usize = 16;

    /// 16 random bytes
    pub fn random() -> Self {
        let mut value = vec![0u8; Self::DEFAULT_LENGTH];
        rand::rng().fill(&mut value[..]);
        MsChapChallenge(value)
    }

    /// 8 random bytes, the MS-CHAPv1 challenge size
    pub fn random_v1() -> Self {
        let mut value = vec![0u8; Self::MIN_LENGTH];
        rand::rng().fill(&mut value[..]);
        MsChapChallenge(value)
    }

    pub fn new(value: Vec<u8>) -> Result<Self, InvalidValue> {
        if value.len() < Self::MIN_LENGTH {
            return Err(InvalidValue::new(format!(
                "MS-CHAP-Challenge requires at least {} bytes",
                Self::MIN_LENGTH
            )));
        }
        Ok(MsChapChallenge(value))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The first 8 bytes, used by MS-CHAPv1
    pub fn v1_challenge(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out.copy_from_slice(&self.0[..8]);
        out
    }

    /// The 16-byte MS-CHAPv2 challenge
    pub fn v2_challenge(&self) -> Result<[u8; 16], InvalidValue> {
        let raw = self.0.get(..16).ok_or_else(|| {
            InvalidValue::new("MS-CHAPv2 requires a 16-byte MS-CHAP-Challenge")
        })?;
        exact::<16>(raw, "MS-CHAPv2 challenge")
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        Self::new(octets_of(attribute, MS_CHAP_CHALLENGE)?.to_vec())
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::octets(MS_CHAP_CHALLENGE, self.0.clone())
    }
}

/// MS-CHAP-Response (RFC 2548 Section 2.1.3)
///
/// ```text
/// | Ident | Flags | LM-Response (24) | NT-Response (24) |
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsChapResponse {
    pub ident: u8,
    /// 1 when the NT-Response field is in use
    pub flags: u8,
    pub lm_response: [u8; 24],
    pub nt_response: [u8; 24],
}

impl MsChapResponse {
    pub const LENGTH: usize = 50;

    /// Compute the NT-Response for `password` against `challenge`.
    pub fn new(ident: u8, challenge: &MsChapChallenge, password: &str) -> Self {
        MsChapResponse {
            ident,
            flags: 1,
            lm_response: [0u8; 24],
            nt_response: mschap::nt_response_v1(&challenge.v1_challenge(), password),
        }
    }

    /// Same as [`MsChapResponse::new`] with the ident drawn from `idents`
    pub fn with_sequence(idents: &IdSequence, challenge: &MsChapChallenge, password: &str) -> Self {
        Self::new(idents.next(), challenge, password)
    }

    pub fn verify(&self, challenge: &MsChapChallenge, password: &str) -> bool {
        let expected = mschap::nt_response_v1(&challenge.v1_challenge(), password);
        mschap::constant_time_eq(&expected, &self.nt_response)
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, InvalidValue> {
        let raw = exact::<{ MsChapResponse::LENGTH }>(raw, "MS-CHAP-Response")?;
        Ok(MsChapResponse {
            ident: raw[0],
            flags: raw[1],
            lm_response: exact::<24>(&raw[2..26], "LM-Response")?,
            nt_response: exact::<24>(&raw[26..50], "NT-Response")?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LENGTH);
        out.push(self.ident);
        out.push(self.flags);
        out.extend_from_slice(&self.lm_response);
        out.extend_from_slice(&self.nt_response);
        out
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        Self::from_bytes(octets_of(attribute, MS_CHAP_RESPONSE)?)
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::octets(MS_CHAP_RESPONSE, self.to_bytes())
    }
}

/// MS-CHAP2-Response (RFC 2548 Section 2.3.2)
///
/// ```text
/// | Ident | Flags | Peer-Challenge (16) | Reserved (8) | NT-Response (24) |
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsChap2Response {
    pub ident: u8,
    pub flags: u8,
    pub peer_challenge: [u8; 16],
    pub nt_response: [u8; 24],
}

impl MsChap2Response {
    pub const LENGTH: usize = 50;

    /// Build a response with a fresh random peer challenge.
    pub fn new(
        ident: u8,
        user_name: &str,
        password: &str,
        challenge: &MsChapChallenge,
    ) -> Result<Self, InvalidValue> {
        let mut peer_challenge = [0u8; 16];
        rand::rng().fill(&mut peer_challenge);
        Self::with_peer_challenge(ident, peer_challenge, user_name, password, challenge)
    }

    pub fn with_peer_challenge(
        ident: u8,
        peer_challenge: [u8; 16],
        user_name: &str,
        password: &str,
        challenge: &MsChapChallenge,
    ) -> Result<Self, InvalidValue> {
        let auth_challenge = challenge.v2_challenge()?;
        Ok(MsChap2Response {
            ident,
            flags: 0,
            peer_challenge,
            nt_response: mschap::nt_response_v2(&auth_challenge, &peer_challenge, user_name, password),
        })
    }

    pub fn verify(&self, user_name: &str, password: &str, challenge: &MsChapChallenge) -> bool {
        let Ok(auth_challenge) = challenge.v2_challenge() else {
            return false;
        };
        let expected = mschap::nt_response_v2(&auth_challenge, &self.peer_challenge, user_name, password);
        mschap::constant_time_eq(&expected, &self.nt_response)
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, InvalidValue> {
        let raw = exact::<{ MsChap2Response::LENGTH }>(raw, "MS-CHAP2-Response")?;
        Ok(MsChap2Response {
            ident: raw[0],
            flags: raw[1],
            peer_challenge: exact::<16>(&raw[2..18], "Peer-Challenge")?,
            nt_response: exact::<24>(&raw[26..50], "NT-Response")?,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LENGTH);
        out.push(self.ident);
        out.push(self.flags);
        out.extend_from_slice(&self.peer_challenge);
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&self.nt_response);
        out
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        Self::from_bytes(octets_of(attribute, MS_CHAP2_RESPONSE)?)
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::octets(MS_CHAP2_RESPONSE, self.to_bytes())
    }
}

/// MS-CHAP2-Success: the response ident and `S=<authenticator response>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsChap2Success {
    pub ident: u8,
    pub authenticator_response: String,
}

impl MsChap2Success {
    /// Compute the authenticator response the peer expects for `response`.
    pub fn new(
        user_name: &str,
        password: &str,
        challenge: &MsChapChallenge,
        response: &MsChap2Response,
    ) -> Result<Self, InvalidValue> {
        let auth_challenge = challenge.v2_challenge()?;
        Ok(MsChap2Success {
            ident: response.ident,
            authenticator_response: mschap::authenticator_response(
                password,
                &response.nt_response,
                &response.peer_challenge,
                &auth_challenge,
                user_name,
            ),
        })
    }

    pub fn verify(
        &self,
        user_name: &str,
        password: &str,
        challenge: &MsChapChallenge,
        response: &MsChap2Response,
    ) -> bool {
        match Self::new(user_name, password, challenge, response) {
            Ok(expected) => {
                expected.ident == self.ident
                    && mschap::constant_time_eq(
                        expected.authenticator_response.as_bytes(),
                        self.authenticator_response.as_bytes(),
                    )
            }
            Err(_) => false,
        }
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        match (attribute.attr_type(), attribute.ident(), attribute.as_str()) {
            (MS_CHAP2_SUCCESS, Some(ident), Some(text)) => Ok(MsChap2Success {
                ident,
                authenticator_response: text.to_string(),
            }),
            _ => Err(InvalidValue::new("not an MS-CHAP2-Success ident string")),
        }
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::ident_string(MS_CHAP2_SUCCESS, self.ident, self.authenticator_response.clone())
    }
}

/// MS-CHAP-Error: ident and an `E=... R=... V=...` message
pub fn ms_chap_error(ident: u8, message: impl Into<String>) -> RadiusAttribute {
    RadiusAttribute::ident_string(MS_CHAP_ERROR, ident, message)
}

/// MS-CHAP-Domain: ident and the Windows NT domain name
pub fn ms_chap_domain(ident: u8, domain: impl Into<String>) -> RadiusAttribute {
    RadiusAttribute::ident_string(MS_CHAP_DOMAIN, ident, domain)
}

/// MS-CHAP-CPW-1 (RFC 2548 Section 2.1.1), code 5
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsChapCpw1 {
    pub ident: u8,
    pub lm_old_password: [u8; 16],
    pub lm_new_password: [u8; 16],
    pub nt_old_password: [u8; 16],
    pub nt_new_password: [u8; 16],
    pub new_lm_password_length: u16,
    pub flags: u16,
}

impl MsChapCpw1 {
    pub const LENGTH: usize = 70;
    pub const CODE: u8 = 5;

    pub fn from_bytes(raw: &[u8]) -> Result<Self, InvalidValue> {
        let raw = exact::<{ MsChapCpw1::LENGTH }>(raw, "MS-CHAP-CPW-1")?;
        Ok(MsChapCpw1 {
            ident: raw[1],
            lm_old_password: exact::<16>(&raw[2..18], "LM-Old-Password")?,
            lm_new_password: exact::<16>(&raw[18..34], "LM-New-Password")?,
            nt_old_password: exact::<16>(&raw[34..50], "NT-Old-Password")?,
            nt_new_password: exact::<16>(&raw[50..66], "NT-New-Password")?,
            new_lm_password_length: u16::from_be_bytes([raw[66], raw[67]]),
            flags: u16::from_be_bytes([raw[68], raw[69]]),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LENGTH);
        out.push(Self::CODE);
        out.push(self.ident);
        out.extend_from_slice(&self.lm_old_password);
        out.extend_from_slice(&self.lm_new_password);
        out.extend_from_slice(&self.nt_old_password);
        out.extend_from_slice(&self.nt_new_password);
        out.extend_from_slice(&self.new_lm_password_length.to_be_bytes());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        Self::from_bytes(octets_of(attribute, MS_CHAP_CPW_1)?)
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::octets(MS_CHAP_CPW_1, self.to_bytes())
    }
}

/// MS-CHAP-CPW-2 (RFC 2548 Section 2.1.2), code 6
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsChapCpw2 {
    pub ident: u8,
    pub old_nt_hash: [u8; 16],
    pub old_lm_hash: [u8; 16],
    pub lm_response: [u8; 24],
    pub nt_response: [u8; 24],
    pub flags: u16,
}

impl MsChapCpw2 {
    pub const LENGTH: usize = 84;
    pub const CODE: u8 = 6;

    pub fn from_bytes(raw: &[u8]) -> Result<Self, InvalidValue> {
        let raw = exact::<{ MsChapCpw2::LENGTH }>(raw, "MS-CHAP-CPW-2")?;
        Ok(MsChapCpw2 {
            ident: raw[1],
            old_nt_hash: exact::<16>(&raw[2..18], "Old-NT-Hash")?,
            old_lm_hash: exact::<16>(&raw[18..34], "Old-LM-Hash")?,
            lm_response: exact::<24>(&raw[34..58], "LM-Response")?,
            nt_response: exact::<24>(&raw[58..82], "NT-Response")?,
            flags: u16::from_be_bytes([raw[82], raw[83]]),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LENGTH);
        out.push(Self::CODE);
        out.push(self.ident);
        out.extend_from_slice(&self.old_nt_hash);
        out.extend_from_slice(&self.old_lm_hash);
        out.extend_from_slice(&self.lm_response);
        out.extend_from_slice(&self.nt_response);
        out.extend_from_slice(&self.flags.to_be_bytes());
        out
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        Self::from_bytes(octets_of(attribute, MS_CHAP_CPW_2)?)
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::octets(MS_CHAP_CPW_2, self.to_bytes())
    }
}

/// MS-CHAP2-CPW (RFC 2548 Section 2.3.3), code 7
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsChap2Cpw {
    pub ident: u8,
    pub encrypted_hash: [u8; 16],
    pub peer_challenge: [u8; 24],
    pub nt_response: [u8; 24],
    pub flags: u16,
}

impl MsChap2Cpw {
    pub const LENGTH: usize = 68;
    pub const CODE: u8 = 7;

    pub fn from_bytes(raw: &[u8]) -> Result<Self, InvalidValue> {
        let raw = exact::<{ MsChap2Cpw::LENGTH }>(raw, "MS-CHAP2-CPW")?;
        Ok(MsChap2Cpw {
            ident: raw[1],
            encrypted_hash: exact::<16>(&raw[2..18], "Encrypted-Hash")?,
            peer_challenge: exact::<24>(&raw[18..42], "Peer-Challenge")?,
            nt_response: exact::<24>(&raw[42..66], "NT-Response")?,
            flags: u16::from_be_bytes([raw[66], raw[67]]),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LENGTH);
        out.push(Self::CODE);
        out.push(self.ident);
        out.extend_from_slice(&self.encrypted_hash);
        out.extend_from_slice(&self.peer_challenge);
        out.extend_from_slice(&self.nt_response);
        out.extend_from_slice(&self.flags.to_be_bytes());
        out
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        Self::from_bytes(octets_of(attribute, MS_CHAP2_CPW)?)
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::octets(MS_CHAP2_CPW, self.to_bytes())
    }
}

/// MS-CHAP-NT-Enc-PW (RFC 2548 Section 2.1.4): one chunk of the encrypted
/// new password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsChapNtEncPw {
    pub code: u8,
    pub ident: u8,
    pub sequence_number: u16,
    pub encrypted_password: Vec<u8>,
}

impl MsChapNtEncPw {
    pub const MIN_LENGTH: usize = 4;

    pub fn from_bytes(raw: &[u8]) -> Result<Self, InvalidValue> {
        if raw.len() < Self::MIN_LENGTH {
            return Err(InvalidValue::new(format!(
                "MS-CHAP-NT-Enc-PW requires at least {} bytes",
                Self::MIN_LENGTH
            )));
        }
        Ok(MsChapNtEncPw {
            code: raw[0],
            ident: raw[1],
            sequence_number: u16::from_be_bytes([raw[2], raw[3]]),
            encrypted_password: raw[4..].to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::MIN_LENGTH + self.encrypted_password.len());
        out.push(self.code);
        out.push(self.ident);
        out.extend_from_slice(&self.sequence_number.to_be_bytes());
        out.extend_from_slice(&self.encrypted_password);
        out
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        Self::from_bytes(octets_of(attribute, MS_CHAP_NT_ENC_PW)?)
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::octets(MS_CHAP_NT_ENC_PW, self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector_challenge() -> MsChapChallenge {
        MsChapChallenge::new(hex::decode("29893076e65ecfe9040afab6f9624186").unwrap()).unwrap()
    }

    fn vector_peer() -> [u8; 16] {
        hex::decode("d5d10c301207d25acc109cac9dc0ae0a")
            .unwrap()
            .try_into()
            .unwrap()
    }

    #[test]
    fn test_mschap2_response_layout() {
        let response =
            MsChap2Response::with_peer_challenge(7, vector_peer(), "user", "accept", &vector_challenge()).unwrap();
        let bytes = response.to_bytes();
        assert_eq!(bytes.len(), MsChap2Response::LENGTH);
        assert_eq!(bytes[0], 7);
        assert_eq!(&bytes[2..18], &vector_peer());
        assert_eq!(&bytes[18..26], &[0u8; 8]);
        assert_eq!(
            hex::encode(&bytes[26..50]),
            "b14870297bc636fa3425f61a2686a5cffc9ccc285e5d913f"
        );
        assert_eq!(MsChap2Response::from_bytes(&bytes).unwrap(), response);
    }

    #[test]
    fn test_mschap2_verify_and_success() {
        let challenge = vector_challenge();
        let response =
            MsChap2Response::with_peer_challenge(1, vector_peer(), "user", "accept", &challenge).unwrap();
        assert!(response.verify("user", "accept", &challenge));
        assert!(!response.verify("user", "reject", &challenge));

        let success = MsChap2Success::new("user", "accept", &challenge, &response).unwrap();
        assert_eq!(success.authenticator_response, "S=17C3369176DCF23D6862E00600578AE2923354DF");
        assert!(success.verify("user", "accept", &challenge, &response));
        assert!(!success.verify("user", "other", &challenge, &response));

        let attr = success.to_attribute();
        assert_eq!(MsChap2Success::from_attribute(&attr).unwrap(), success);
    }

    #[test]
    fn test_mschap_v1_response() {
        let challenge = MsChapChallenge::new(vec![0x10, 0x2d, 0xb5, 0xdf, 0x08, 0x5d, 0x30, 0x41]).unwrap();
        let idents = IdSequence::starting_at(200);
        let response = MsChapResponse::with_sequence(&idents, &challenge, "MyPw");
        assert_eq!(response.ident, 200);
        assert_eq!(response.flags, 1);
        assert!(response.verify(&challenge, "MyPw"));
        assert!(!response.verify(&challenge, "NotMyPw"));

        let attr = response.to_attribute();
        assert_eq!(MsChapResponse::from_attribute(&attr).unwrap(), response);
        assert_eq!(idents.next(), 201);
    }

    #[test]
    fn test_challenge_lengths() {
        assert!(MsChapChallenge::new(vec![0u8; 7]).is_err());
        let short = MsChapChallenge::new(vec![0u8; 8]).unwrap();
        assert!(short.v2_challenge().is_err());
        assert_eq!(MsChapChallenge::random().as_bytes().len(), 16);
    }

    #[test]
    fn test_change_password_codes() {
        let cpw1 = MsChapCpw1 {
            ident: 9,
            lm_old_password: [1; 16],
            lm_new_password: [2; 16],
            nt_old_password: [3; 16],
            nt_new_password: [4; 16],
            new_lm_password_length: 8,
            flags: 1,
        };
        let bytes = cpw1.to_bytes();
        assert_eq!((bytes.len(), bytes[0]), (70, 5));
        assert_eq!(MsChapCpw1::from_bytes(&bytes).unwrap(), cpw1);

        let cpw2 = MsChapCpw2 {
            ident: 9,
            old_nt_hash: [1; 16],
            old_lm_hash: [2; 16],
            lm_response: [3; 24],
            nt_response: [4; 24],
            flags: 2,
        };
        let bytes = cpw2.to_bytes();
        assert_eq!((bytes.len(), bytes[0]), (84, 6));
        assert_eq!(MsChapCpw2::from_bytes(&bytes).unwrap(), cpw2);

        let cpw = MsChap2Cpw {
            ident: 9,
            encrypted_hash: [1; 16],
            peer_challenge: [2; 24],
            nt_response: [3; 24],
            flags: 0,
        };
        let bytes = cpw.to_bytes();
        assert_eq!((bytes.len(), bytes[0]), (68, 7));
        assert_eq!(MsChap2Cpw::from_bytes(&bytes).unwrap(), cpw);

        assert!(MsChapNtEncPw::from_bytes(&[6, 1, 0]).is_err());
        let enc = MsChapNtEncPw::from_bytes(&[6, 1, 0, 2, 0xAA]).unwrap();
        assert_eq!(enc.sequence_number, 2);
        assert_eq!(enc.encrypted_password, vec![0xAA]);
    }
}
