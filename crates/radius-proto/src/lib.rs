//! RADIUS Protocol Implementation
//!
//! This crate provides the protocol half of a RADIUS engine as defined in
//! RFC 2865 and RFC 2866, with the Microsoft vendor attributes of RFC 2548.
//!
//! # Features
//!
//! - Typed attribute model with transparent Vendor-Specific nesting
//! - Packet encoding and decoding with Response Authenticator and
//!   Message-Authenticator computation and verification
//! - MD5-based User-Password hiding and CHAP responses
//! - MS-CHAP v1/v2 challenge-response cryptography
//! - Built-in dictionary for symbolic rendering and enum validation
//!
//! # Example
//!
//! ```rust
//! use radius_proto::{Code, Codec, Packet, RadiusAttribute};
//!
//! let codec = Codec::new();
//!
//! // Create an Access-Request packet
//! let mut request = Packet::request(Code::AccessRequest)
//!     .with_attribute(RadiusAttribute::user_name("alice"))
//!     .with_attribute(RadiusAttribute::user_password("password"));
//! request.identifier = 1;
//!
//! // Encode to bytes; User-Password is hidden with the shared secret
//! let bytes = codec.encode_request(&request, b"secret").unwrap();
//!
//! // The server answers and the client checks the Response Authenticator
//! let decoded = codec.decode_request(&bytes, b"secret").unwrap();
//! let accept = Packet::response(Code::AccessAccept, &decoded);
//! let reply = codec.encode_response(&accept, &decoded, b"secret").unwrap();
//! assert!(codec.decode_response(&reply, &request, b"secret").is_ok());
//! ```

pub mod attributes;
pub mod auth;
pub mod chap;
pub mod dictionary;
pub mod error;
pub mod message_auth;
pub mod mschap;
pub mod packet;
pub mod sequence;

pub use attributes::{
    AcctStatusType, AttributeFactory, AttributeType, AttributeValue, AttributesList, Enumerated,
    OctetsDirection, RadiusAttribute, ServiceType, ValueKind,
};
pub use chap::{ChapChallenge, ChapPassword};
pub use dictionary::{AttributeDescriptor, Dictionary, StandardDictionary};
pub use error::{CodecError, InvalidValue};
pub use packet::{Code, Codec, Packet};
pub use sequence::IdSequence;
