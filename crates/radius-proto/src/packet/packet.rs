use super::Code;
use crate::attributes::{AttributeType, AttributesList, RadiusAttribute};
use crate::auth::generate_request_authenticator;

/// RADIUS Packet structure as defined in RFC 2865 Section 3
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Code      |  Identifier   |            Length             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// |                         Authenticator                         |
/// |                                                               |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Attributes ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-
/// ```
///
/// The length field is not stored; the [`Codec`](super::Codec) derives it.
/// For a response the authenticator field is filled in by the codec on
/// encode and holds the received value after decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet type (1 byte)
    pub code: Code,
    /// Packet identifier for matching requests/responses (1 byte)
    pub identifier: u8,
    /// Request Authenticator, or the Response Authenticator of a decoded response
    pub authenticator: [u8; 16],
    /// Top-level attributes (no vendor tag)
    pub attributes: AttributesList,
}

impl Packet {
    pub fn new(code: Code, identifier: u8, authenticator: [u8; 16]) -> Self {
        Packet {
            code,
            identifier,
            authenticator,
            attributes: AttributesList::new(),
        }
    }

    /// New request with a fresh random authenticator.
    ///
    /// The identifier is assigned by the client channel when the request is
    /// sent.
    pub fn request(code: Code) -> Self {
        debug_assert!(code.is_request(), "{code} is not a request code");
        Self::new(code, 0, generate_request_authenticator())
    }

    /// Empty response to `request`, carrying its identifier.
    pub fn response(code: Code, request: &Packet) -> Self {
        debug_assert!(code.answers(request.code), "{code} does not answer {}", request.code);
        Self::new(code, request.identifier, [0u8; 16])
    }

    pub fn is_request(&self) -> bool {
        self.code.is_request()
    }

    pub fn add_attribute(&mut self, attribute: RadiusAttribute) {
        self.attributes.add(attribute);
    }

    /// Builder form of [`Packet::add_attribute`]
    pub fn with_attribute(mut self, attribute: RadiusAttribute) -> Self {
        self.attributes.add(attribute);
        self
    }

    /// Find first attribute by type, looking inside vendor containers
    pub fn find_attribute(&self, attr_type: AttributeType) -> Option<&RadiusAttribute> {
        self.attributes.get_first(attr_type)
    }

    /// Find all attributes by type
    pub fn find_all_attributes(&self, attr_type: AttributeType) -> Vec<&RadiusAttribute> {
        self.attributes.find_all(attr_type)
    }

    /// Text of the first User-Name attribute
    pub fn user_name(&self) -> Option<&str> {
        self.find_attribute(AttributeType::USER_NAME)
            .and_then(RadiusAttribute::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::microsoft::{MS_CHAP_CHALLENGE, VENDOR_MICROSOFT};

    #[test]
    fn test_request_and_response_construction() {
        let mut request = Packet::request(Code::AccessRequest);
        request.identifier = 42;
        let other = Packet::request(Code::AccessRequest);
        assert_ne!(request.authenticator, other.authenticator);

        let response = Packet::response(Code::AccessAccept, &request);
        assert_eq!(response.identifier, 42);
        assert!(!response.is_request());
        assert!(response.attributes.is_empty());
    }

    #[test]
    fn test_vendor_attribute_found_through_packet() {
        let packet = Packet::request(Code::AccessRequest)
            .with_attribute(RadiusAttribute::user_name("alice"))
            .with_attribute(RadiusAttribute::octets(MS_CHAP_CHALLENGE, vec![1u8; 16]));

        assert_eq!(packet.user_name(), Some("alice"));
        assert_eq!(packet.attributes.len(), 2);
        let challenge = packet.find_attribute(MS_CHAP_CHALLENGE).unwrap();
        assert_eq!(challenge.vendor_code(), VENDOR_MICROSOFT);
        assert_eq!(packet.find_all_attributes(MS_CHAP_CHALLENGE).len(), 1);
    }
}
