//! Packet model and wire codec.

mod code;
mod codec;
#[allow(clippy::module_inception)]
mod packet;

pub use code::Code;
pub use codec::Codec;
pub use packet::Packet;

use std::ops::Range;

/// Code, identifier, length and authenticator
pub const PACKET_HEADER_LENGTH: usize = 20;
/// Maximum RADIUS packet size (4096 bytes as per RFC 2865)
pub const PACKET_MAX_LENGTH: usize = 4096;
/// Type and length bytes of an attribute
pub const ATTRIBUTE_HEADER_LENGTH: usize = 2;
/// Largest value that fits one attribute into a maximum-size packet
pub const ATTRIBUTE_VALUE_MAX_LENGTH: usize = PACKET_MAX_LENGTH - PACKET_HEADER_LENGTH - ATTRIBUTE_HEADER_LENGTH;
/// Position of the authenticator inside the header
pub const AUTHENTICATOR_RANGE: Range<usize> = 4..20;
