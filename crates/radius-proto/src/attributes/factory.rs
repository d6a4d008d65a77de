use super::attribute::{AttributeValue, RadiusAttribute, ValueKind};
use super::types::AttributeType;
use super::microsoft;
use crate::dictionary::{self, Dictionary};
use crate::error::CodecError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Material available while decoding attribute values.
pub struct DecodeContext<'a> {
    pub secret: &'a [u8],
    /// Request authenticator of the packet (or of the original request when
    /// decoding a response)
    pub authenticator: &'a [u8; 16],
    pub factory: &'a AttributeFactory,
}

/// Builds a value from raw attribute bytes.
pub type AttributeDecoder =
    fn(AttributeType, &[u8], &DecodeContext<'_>) -> Result<AttributeValue, CodecError>;

/// Registry mapping attribute types to value decoders.
///
/// Unregistered types fall back to Vendor-Specific decoding for type 26, then
/// to the value kind the dictionary declares, then to raw octets.
#[derive(Clone)]
pub struct AttributeFactory {
    decoders: HashMap<AttributeType, AttributeDecoder>,
    dictionary: Arc<dyn Dictionary>,
}

impl AttributeFactory {
    /// Factory with the standard and Microsoft decoders registered
    pub fn new() -> Self {
        let mut factory = Self::empty(Arc::new(dictionary::StandardDictionary::new()));
        factory.register(AttributeType::USER_PASSWORD, user_password);
        factory.register(AttributeType::CHAP_PASSWORD, fixed_octets::<17>);
        factory.register(AttributeType::CHAP_CHALLENGE, min_octets::<5>);
        factory.register(AttributeType::MESSAGE_AUTHENTICATOR, fixed_octets::<16>);
        microsoft::register(&mut factory);
        factory
    }

    /// Factory without registrations, resolving kinds through `dictionary`
    pub fn empty(dictionary: Arc<dyn Dictionary>) -> Self {
        AttributeFactory {
            decoders: HashMap::new(),
            dictionary,
        }
    }

    pub fn with_dictionary(mut self, dictionary: Arc<dyn Dictionary>) -> Self {
        self.dictionary = dictionary;
        self
    }

    pub fn dictionary(&self) -> &dyn Dictionary {
        self.dictionary.as_ref()
    }

    /// Register a decoder, returning the one it replaces.
    pub fn register(&mut self, attr_type: AttributeType, decoder: AttributeDecoder) -> Option<AttributeDecoder> {
        self.decoders.insert(attr_type, decoder)
    }

    pub fn is_registered(&self, attr_type: AttributeType) -> bool {
        self.decoders.contains_key(&attr_type)
    }

    pub fn decode(
        &self,
        attr_type: AttributeType,
        raw: &[u8],
        ctx: &DecodeContext<'_>,
    ) -> Result<RadiusAttribute, CodecError> {
        let value = match self.decoders.get(&attr_type) {
            Some(decoder) => decoder(attr_type, raw, ctx)?,
            None => AttributeValue::decode(self.kind_of(attr_type), attr_type, raw, ctx)?,
        };
        Ok(RadiusAttribute::new(attr_type, value))
    }

    fn kind_of(&self, attr_type: AttributeType) -> ValueKind {
        if attr_type == AttributeType::VENDOR_SPECIFIC {
            return ValueKind::Vendor;
        }
        self.dictionary
            .attribute_descriptor(attr_type)
            .map(|d| d.kind)
            .unwrap_or(ValueKind::Octets)
    }
}

impl Default for AttributeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AttributeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeFactory")
            .field("registered", &self.decoders.len())
            .finish()
    }
}

fn user_password(
    attr_type: AttributeType,
    raw: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<AttributeValue, CodecError> {
    AttributeValue::decode(ValueKind::UserPassword, attr_type, raw, ctx)
}

/// Octets of exactly `N` bytes
pub fn fixed_octets<const N: usize>(
    attr_type: AttributeType,
    raw: &[u8],
    _ctx: &DecodeContext<'_>,
) -> Result<AttributeValue, CodecError> {
    if raw.len() != N {
        return Err(CodecError::attribute(
            attr_type,
            format!("value requires {N} bytes, got {}", raw.len()),
        ));
    }
    Ok(AttributeValue::Octets(raw.to_vec()))
}

/// Octets of at least `N` bytes
pub fn min_octets<const N: usize>(
    attr_type: AttributeType,
    raw: &[u8],
    _ctx: &DecodeContext<'_>,
) -> Result<AttributeValue, CodecError> {
    if raw.len() < N {
        return Err(CodecError::attribute(
            attr_type,
            format!("value requires at least {N} bytes, got {}", raw.len()),
        ));
    }
    Ok(AttributeValue::Octets(raw.to_vec()))
}

pub fn ident_string(
    attr_type: AttributeType,
    raw: &[u8],
    ctx: &DecodeContext<'_>,
) -> Result<AttributeValue, CodecError> {
    AttributeValue::decode(ValueKind::IdentString, attr_type, raw, ctx)
}
