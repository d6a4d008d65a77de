use super::enumerated::Enumerated;
use super::factory::DecodeContext;
use super::list::AttributesList;
use super::types::AttributeType;
use crate::auth::{decrypt_user_password, encrypt_user_password};
use crate::dictionary::Dictionary;
use crate::error::{CodecError, InvalidValue};
use chrono::{DateTime, Utc};
use std::fmt;
use std::net::Ipv4Addr;

/// The built-in value kinds an attribute can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Unsigned 32-bit integer, optionally enum-named through the dictionary
    Integer,
    /// UTF-8 text
    String,
    /// Raw bytes
    Octets,
    /// IPv4 address
    Address,
    /// Seconds since the Unix epoch
    Date,
    /// One ident byte followed by text
    IdentString,
    /// Vendor-Specific container
    Vendor,
    /// RFC 2865 obfuscated User-Password
    UserPassword,
}

/// Value of a [`RadiusAttribute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Integer(u32),
    String(String),
    Octets(Vec<u8>),
    Address(Ipv4Addr),
    Date(u32),
    IdentString { ident: u8, text: String },
    Vendor(AttributesList),
    UserPassword(String),
}

impl AttributeValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            AttributeValue::Integer(_) => ValueKind::Integer,
            AttributeValue::String(_) => ValueKind::String,
            AttributeValue::Octets(_) => ValueKind::Octets,
            AttributeValue::Address(_) => ValueKind::Address,
            AttributeValue::Date(_) => ValueKind::Date,
            AttributeValue::IdentString { .. } => ValueKind::IdentString,
            AttributeValue::Vendor(_) => ValueKind::Vendor,
            AttributeValue::UserPassword(_) => ValueKind::UserPassword,
        }
    }

    /// Encode the value part of an attribute.
    ///
    /// `secret` and `authenticator` are only used by secret-dependent kinds.
    pub fn encode(&self, secret: &[u8], authenticator: &[u8; 16]) -> Result<Vec<u8>, CodecError> {
        let bytes = match self {
            AttributeValue::Integer(v) | AttributeValue::Date(v) => v.to_be_bytes().to_vec(),
            AttributeValue::String(s) => s.as_bytes().to_vec(),
            AttributeValue::Octets(b) => b.clone(),
            AttributeValue::Address(ip) => ip.octets().to_vec(),
            AttributeValue::IdentString { ident, text } => {
                let mut out = Vec::with_capacity(1 + text.len());
                out.push(*ident);
                out.extend_from_slice(text.as_bytes());
                out
            }
            AttributeValue::Vendor(list) => {
                let mut out = list.vendor().to_be_bytes().to_vec();
                list.encode_into(secret, authenticator, &mut out)?;
                out
            }
            AttributeValue::UserPassword(password) => {
                encrypt_user_password(password.as_bytes(), secret, authenticator)
            }
        };
        Ok(bytes)
    }

    /// Decode raw value bytes as the given kind.
    pub fn decode(
        kind: ValueKind,
        attr_type: AttributeType,
        raw: &[u8],
        ctx: &DecodeContext<'_>,
    ) -> Result<Self, CodecError> {
        let value = match kind {
            ValueKind::Integer => AttributeValue::Integer(read_u32(attr_type, raw)?),
            ValueKind::Date => AttributeValue::Date(read_u32(attr_type, raw)?),
            ValueKind::Address => {
                let octets: [u8; 4] = raw.try_into().map_err(|_| {
                    CodecError::attribute(attr_type, format!("address requires 4 bytes, got {}", raw.len()))
                })?;
                AttributeValue::Address(Ipv4Addr::from(octets))
            }
            ValueKind::String => AttributeValue::String(read_utf8(attr_type, raw)?),
            ValueKind::Octets => AttributeValue::Octets(raw.to_vec()),
            ValueKind::IdentString => {
                let (ident, text) = raw.split_first().ok_or_else(|| {
                    CodecError::attribute(attr_type, "ident string requires at least 1 byte")
                })?;
                AttributeValue::IdentString {
                    ident: *ident,
                    text: read_utf8(attr_type, text)?,
                }
            }
            ValueKind::Vendor => AttributeValue::Vendor(AttributesList::decode_vendor(raw, ctx)?),
            ValueKind::UserPassword => {
                let plain = decrypt_user_password(raw, ctx.secret, ctx.authenticator)?;
                AttributeValue::UserPassword(read_utf8(attr_type, &plain)?)
            }
        };
        Ok(value)
    }
}

fn read_u32(attr_type: AttributeType, raw: &[u8]) -> Result<u32, CodecError> {
    let bytes: [u8; 4] = raw.try_into().map_err(|_| {
        CodecError::attribute(attr_type, format!("integer requires 4 bytes, got {}", raw.len()))
    })?;
    Ok(u32::from_be_bytes(bytes))
}

fn read_utf8(attr_type: AttributeType, raw: &[u8]) -> Result<String, CodecError> {
    String::from_utf8(raw.to_vec())
        .map_err(|e| CodecError::attribute(attr_type, format!("invalid UTF-8: {e}")))
}

/// RADIUS attribute as defined in RFC 2865 Section 5
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Type      |    Length     |  Value ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// A Vendor-Specific attribute carries its nested attributes in an
/// [`AttributesList`] tagged with the vendor code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadiusAttribute {
    attr_type: AttributeType,
    value: AttributeValue,
}

impl RadiusAttribute {
    pub fn new(attr_type: AttributeType, value: AttributeValue) -> Self {
        RadiusAttribute { attr_type, value }
    }

    pub fn integer(attr_type: AttributeType, value: u32) -> Self {
        Self::new(attr_type, AttributeValue::Integer(value))
    }

    pub fn string(attr_type: AttributeType, value: impl Into<String>) -> Self {
        Self::new(attr_type, AttributeValue::String(value.into()))
    }

    pub fn octets(attr_type: AttributeType, value: impl Into<Vec<u8>>) -> Self {
        Self::new(attr_type, AttributeValue::Octets(value.into()))
    }

    pub fn address(attr_type: AttributeType, value: Ipv4Addr) -> Self {
        Self::new(attr_type, AttributeValue::Address(value))
    }

    /// Date attribute; the wire format holds whole seconds in 32 bits, so the
    /// value saturates outside 1970..2106.
    pub fn date(attr_type: AttributeType, value: DateTime<Utc>) -> Self {
        let secs = value.timestamp().clamp(0, u32::MAX as i64) as u32;
        Self::new(attr_type, AttributeValue::Date(secs))
    }

    pub fn ident_string(attr_type: AttributeType, ident: u8, text: impl Into<String>) -> Self {
        Self::new(
            attr_type,
            AttributeValue::IdentString {
                ident,
                text: text.into(),
            },
        )
    }

    /// Integer attribute holding an enumerated value
    pub fn enumerated<E: Enumerated>(value: E) -> Self {
        Self::integer(E::ATTRIBUTE, value.code())
    }

    /// Vendor-Specific container wrapping `list`
    pub fn vendor(list: AttributesList) -> Self {
        Self::new(AttributeType::VENDOR_SPECIFIC, AttributeValue::Vendor(list))
    }

    pub fn user_name(name: impl Into<String>) -> Self {
        Self::string(AttributeType::USER_NAME, name)
    }

    pub fn user_password(password: impl Into<String>) -> Self {
        Self::new(
            AttributeType::USER_PASSWORD,
            AttributeValue::UserPassword(password.into()),
        )
    }

    pub fn reply_message(message: impl Into<String>) -> Self {
        Self::string(AttributeType::REPLY_MESSAGE, message)
    }

    pub fn attr_type(&self) -> AttributeType {
        self.attr_type
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut AttributeValue {
        &mut self.value
    }

    pub fn into_value(self) -> AttributeValue {
        self.value
    }

    /// Vendor code this attribute belongs to, looking through containers
    pub fn vendor_code(&self) -> u32 {
        match &self.value {
            AttributeValue::Vendor(list) => list.vendor(),
            _ => self.attr_type.vendor(),
        }
    }

    pub fn as_integer(&self) -> Option<u32> {
        match self.value {
            AttributeValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_enum<E: Enumerated>(&self) -> Option<E> {
        self.as_integer().and_then(E::from_code)
    }

    /// Text of String, IdentString and User-Password values
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            AttributeValue::String(s) | AttributeValue::UserPassword(s) => Some(s),
            AttributeValue::IdentString { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_octets(&self) -> Option<&[u8]> {
        match &self.value {
            AttributeValue::Octets(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Ipv4Addr> {
        match self.value {
            AttributeValue::Address(ip) => Some(ip),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self.value {
            AttributeValue::Date(secs) => DateTime::from_timestamp(i64::from(secs), 0),
            _ => None,
        }
    }

    pub fn ident(&self) -> Option<u8> {
        match self.value {
            AttributeValue::IdentString { ident, .. } => Some(ident),
            _ => None,
        }
    }

    pub fn as_vendor(&self) -> Option<&AttributesList> {
        match &self.value {
            AttributeValue::Vendor(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_vendor_mut(&mut self) -> Option<&mut AttributesList> {
        match &mut self.value {
            AttributeValue::Vendor(list) => Some(list),
            _ => None,
        }
    }

    /// Encode the value bytes (without the type/length header).
    pub fn encode_value(&self, secret: &[u8], authenticator: &[u8; 16]) -> Result<Vec<u8>, CodecError> {
        self.value.encode(secret, authenticator)
    }

    /// Replace the value by parsing `text` according to the current kind.
    ///
    /// Enumerated integers accept a symbolic name or a numeric code, but only
    /// values the dictionary knows about.
    pub fn set_from_str(&mut self, text: &str, dictionary: &dyn Dictionary) -> Result<(), InvalidValue> {
        let text = text.trim();
        let attr_type = self.attr_type;
        let value = match &self.value {
            AttributeValue::Integer(_) => {
                let descriptor = dictionary
                    .attribute_descriptor(attr_type)
                    .filter(|d| d.is_enumerated());
                match descriptor {
                    Some(descriptor) => AttributeValue::Integer(descriptor.resolve_value(text)?),
                    None => AttributeValue::Integer(text.parse().map_err(|_| {
                        InvalidValue::new(format!("'{text}' is not an unsigned 32-bit integer"))
                    })?),
                }
            }
            AttributeValue::String(_) => AttributeValue::String(text.to_string()),
            AttributeValue::UserPassword(_) => AttributeValue::UserPassword(text.to_string()),
            AttributeValue::Octets(_) => {
                let digits = text.strip_prefix("0x").unwrap_or(text);
                AttributeValue::Octets(
                    hex::decode(digits).map_err(|e| InvalidValue::new(format!("'{text}': {e}")))?,
                )
            }
            AttributeValue::Address(_) => AttributeValue::Address(
                text.parse()
                    .map_err(|_| InvalidValue::new(format!("'{text}' is not an IPv4 address")))?,
            ),
            AttributeValue::Date(_) => AttributeValue::Date(parse_date(text)?),
            AttributeValue::IdentString { ident, .. } => AttributeValue::IdentString {
                ident: *ident,
                text: text.to_string(),
            },
            AttributeValue::Vendor(_) => {
                return Err(InvalidValue::new("vendor container has no string form"));
            }
        };
        self.value = value;
        Ok(())
    }

    /// Render as `Name = value` using dictionary names where known.
    pub fn to_string_with(&self, dictionary: &dyn Dictionary) -> String {
        let descriptor = dictionary.attribute_descriptor(self.attr_type);
        let name = descriptor
            .map(|d| d.name.clone())
            .unwrap_or_else(|| format!("Attr-{}", self.attr_type));
        let value = match &self.value {
            AttributeValue::Integer(v) => descriptor
                .and_then(|d| d.value_name(*v))
                .map(str::to_string)
                .unwrap_or_else(|| v.to_string()),
            AttributeValue::Vendor(list) => {
                let vendor = dictionary
                    .vendor_name(list.vendor())
                    .map(str::to_string)
                    .unwrap_or_else(|| list.vendor().to_string());
                let nested: Vec<String> = list.iter().map(|a| a.to_string_with(dictionary)).collect();
                format!("{vendor} {{ {} }}", nested.join(", "))
            }
            other => other.to_string(),
        };
        format!("{name} = {value}")
    }
}

fn parse_date(text: &str) -> Result<u32, InvalidValue> {
    if let Ok(secs) = text.parse::<u32>() {
        return Ok(secs);
    }
    let parsed = DateTime::parse_from_rfc3339(text)
        .map_err(|e| InvalidValue::new(format!("'{text}' is not a date: {e}")))?;
    u32::try_from(parsed.timestamp())
        .map_err(|_| InvalidValue::new(format!("'{text}' is outside the 32-bit time range")))
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Integer(v) => write!(f, "{v}"),
            AttributeValue::String(s) => write!(f, "\"{s}\""),
            AttributeValue::Octets(b) => write!(f, "0x{}", hex::encode(b)),
            AttributeValue::Address(ip) => write!(f, "{ip}"),
            AttributeValue::Date(secs) => match DateTime::from_timestamp(i64::from(*secs), 0) {
                Some(date) => write!(f, "{}", date.to_rfc3339()),
                None => write!(f, "{secs}"),
            },
            AttributeValue::IdentString { ident, text } => write!(f, "[{ident}] \"{text}\""),
            AttributeValue::Vendor(list) => write!(f, "vendor {} ({} attributes)", list.vendor(), list.len()),
            AttributeValue::UserPassword(_) => write!(f, "********"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AcctStatusType, AttributeFactory, ServiceType};
    use crate::dictionary::StandardDictionary;

    fn roundtrip(attr: &RadiusAttribute, kind: ValueKind) -> AttributeValue {
        let factory = AttributeFactory::new();
        let auth = [7u8; 16];
        let ctx = DecodeContext {
            secret: b"secret",
            authenticator: &auth,
            factory: &factory,
        };
        let raw = attr.encode_value(b"secret", &auth).unwrap();
        AttributeValue::decode(kind, attr.attr_type(), &raw, &ctx).unwrap()
    }

    #[test]
    fn test_integer_bounds_roundtrip() {
        for v in [0u32, 1, 0xFFFF_FFFF] {
            let attr = RadiusAttribute::integer(AttributeType::SESSION_TIMEOUT, v);
            assert_eq!(roundtrip(&attr, ValueKind::Integer), AttributeValue::Integer(v));
        }
    }

    #[test]
    fn test_multibyte_string_roundtrip() {
        let attr = RadiusAttribute::string(AttributeType::REPLY_MESSAGE, "Привет, 世界");
        assert_eq!(roundtrip(&attr, ValueKind::String), *attr.value());
    }

    #[test]
    fn test_octets_lengths_roundtrip() {
        for len in [0usize, 253] {
            let attr = RadiusAttribute::octets(AttributeType::CLASS, vec![0xAB; len]);
            assert_eq!(roundtrip(&attr, ValueKind::Octets), *attr.value());
        }
    }

    #[test]
    fn test_date_and_address_roundtrip() {
        let date = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let attr = RadiusAttribute::date(AttributeType::EVENT_TIMESTAMP, date);
        assert_eq!(roundtrip(&attr, ValueKind::Date), AttributeValue::Date(1_700_000_000));
        assert_eq!(attr.as_date(), Some(date));

        let attr = RadiusAttribute::address(AttributeType::NAS_IP_ADDRESS, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(roundtrip(&attr, ValueKind::Address), *attr.value());
    }

    #[test]
    fn test_integer_wrong_length_rejected() {
        let factory = AttributeFactory::new();
        let ctx = DecodeContext {
            secret: b"s",
            authenticator: &[0u8; 16],
            factory: &factory,
        };
        let err = AttributeValue::decode(ValueKind::Integer, AttributeType::NAS_PORT, &[0, 1, 2], &ctx);
        assert!(matches!(err, Err(CodecError::Attribute { .. })));
    }

    #[test]
    fn test_ident_string_requires_ident() {
        let factory = AttributeFactory::new();
        let ctx = DecodeContext {
            secret: b"s",
            authenticator: &[0u8; 16],
            factory: &factory,
        };
        assert!(AttributeValue::decode(ValueKind::IdentString, AttributeType::standard(240), &[], &ctx).is_err());
        let value = AttributeValue::decode(ValueKind::IdentString, AttributeType::standard(240), b"\x05ok", &ctx).unwrap();
        assert_eq!(
            value,
            AttributeValue::IdentString {
                ident: 5,
                text: "ok".to_string()
            }
        );
    }

    #[test]
    fn test_set_enumerated_from_str() {
        let dict = StandardDictionary::new();
        let mut attr = RadiusAttribute::enumerated(ServiceType::Login);

        attr.set_from_str("Framed", &dict).unwrap();
        assert_eq!(attr.as_enum::<ServiceType>(), Some(ServiceType::Framed));

        attr.set_from_str("8", &dict).unwrap();
        assert_eq!(attr.as_enum::<ServiceType>(), Some(ServiceType::AuthenticateOnly));

        assert!(attr.set_from_str("42", &dict).is_err());
        assert!(attr.set_from_str("Bogus", &dict).is_err());
        assert_eq!(attr.as_enum::<ServiceType>(), Some(ServiceType::AuthenticateOnly));
    }

    #[test]
    fn test_set_plain_values_from_str() {
        let dict = StandardDictionary::new();

        let mut port = RadiusAttribute::integer(AttributeType::NAS_PORT, 0);
        port.set_from_str("1234", &dict).unwrap();
        assert_eq!(port.as_integer(), Some(1234));
        assert!(port.set_from_str("-1", &dict).is_err());

        let mut addr = RadiusAttribute::address(AttributeType::FRAMED_IP_ADDRESS, Ipv4Addr::UNSPECIFIED);
        addr.set_from_str("192.168.0.7", &dict).unwrap();
        assert_eq!(addr.as_address(), Some(Ipv4Addr::new(192, 168, 0, 7)));
        assert!(addr.set_from_str("not-an-ip", &dict).is_err());

        let mut class = RadiusAttribute::octets(AttributeType::CLASS, Vec::new());
        class.set_from_str("0xdeadbeef", &dict).unwrap();
        assert_eq!(class.as_octets(), Some(&[0xde, 0xad, 0xbe, 0xef][..]));

        let mut date = RadiusAttribute::new(AttributeType::EVENT_TIMESTAMP, AttributeValue::Date(0));
        date.set_from_str("1970-01-01T00:01:00Z", &dict).unwrap();
        assert_eq!(date.value(), &AttributeValue::Date(60));
    }

    #[test]
    fn test_to_string_with_dictionary() {
        let dict = StandardDictionary::new();
        let attr = RadiusAttribute::enumerated(AcctStatusType::Start);
        assert_eq!(attr.to_string_with(&dict), "Acct-Status-Type = Start");

        let attr = RadiusAttribute::user_password("secret");
        assert_eq!(attr.to_string_with(&dict), "User-Password = ********");
    }
}
