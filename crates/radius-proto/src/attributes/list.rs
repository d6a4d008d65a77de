use super::attribute::{AttributeValue, RadiusAttribute};
use super::factory::DecodeContext;
use super::types::AttributeType;
use crate::error::{CodecError, InvalidValue};
use crate::packet::{ATTRIBUTE_HEADER_LENGTH, ATTRIBUTE_VALUE_MAX_LENGTH};

/// Largest value that fits behind a one-byte attribute length field
const WIRE_VALUE_MAX_LENGTH: usize = u8::MAX as usize - ATTRIBUTE_HEADER_LENGTH;

/// Ordered, vendor-homogeneous sequence of attributes.
///
/// A list tagged [`AttributeType::VENDOR_NONE`] holds standard attributes and
/// wraps any vendor attribute added to it in its own Vendor-Specific
/// container. A list tagged with a vendor code only accepts that vendor's
/// attributes. Lookups and removals look through Vendor-Specific containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributesList {
    vendor: u32,
    attributes: Vec<RadiusAttribute>,
}

impl AttributesList {
    /// Top-level list of standard attributes
    pub fn new() -> Self {
        Self::default()
    }

    /// Nested list holding the attributes of `vendor`.
    ///
    /// # Panics
    ///
    /// Panics if `vendor` exceeds [`AttributeType::VENDOR_MAX`].
    pub fn for_vendor(vendor: u32) -> Self {
        assert!(vendor <= AttributeType::VENDOR_MAX, "vendor code out of range");
        AttributesList {
            vendor,
            attributes: Vec::new(),
        }
    }

    pub fn vendor(&self) -> u32 {
        self.vendor
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RadiusAttribute> {
        self.attributes.iter()
    }

    pub fn clear(&mut self) {
        self.attributes.clear();
    }

    /// Append an attribute.
    ///
    /// # Panics
    ///
    /// Panics if the attribute belongs to a different vendor than a
    /// vendor-tagged list. See [`AttributesList::try_add`].
    pub fn add(&mut self, attribute: RadiusAttribute) {
        if let Err(e) = self.try_add(attribute) {
            panic!("{e}");
        }
    }

    /// Append an attribute, wrapping vendor attributes when this list is
    /// untagged.
    pub fn try_add(&mut self, attribute: RadiusAttribute) -> Result<(), InvalidValue> {
        let vendor = attribute.vendor_code();
        let is_container = matches!(attribute.value(), AttributeValue::Vendor(_));

        if self.vendor == AttributeType::VENDOR_NONE {
            if vendor != AttributeType::VENDOR_NONE && !is_container {
                let mut nested = AttributesList::for_vendor(vendor);
                nested.attributes.push(attribute);
                self.attributes.push(RadiusAttribute::vendor(nested));
            } else {
                self.attributes.push(attribute);
            }
            return Ok(());
        }

        if is_container || vendor != self.vendor {
            return Err(InvalidValue::new(format!(
                "attribute {} does not belong to vendor {}",
                attribute.attr_type(),
                self.vendor
            )));
        }
        self.attributes.push(attribute);
        Ok(())
    }

    pub fn add_all(&mut self, attributes: impl IntoIterator<Item = RadiusAttribute>) {
        for attribute in attributes {
            self.add(attribute);
        }
    }

    /// Replace every attribute of the same type with `attribute`.
    pub fn set(&mut self, attribute: RadiusAttribute) {
        let attr_type = match attribute.value() {
            AttributeValue::Vendor(_) => None,
            _ => Some(attribute.attr_type()),
        };
        if let Some(attr_type) = attr_type {
            self.remove_all(attr_type);
        }
        self.add(attribute);
    }

    /// Remove every attribute of `attr_type`, including ones nested in
    /// Vendor-Specific containers. Containers emptied by the removal are
    /// dropped. Returns the number of attributes removed.
    pub fn remove_all(&mut self, attr_type: AttributeType) -> usize {
        let mut removed = 0;
        self.attributes.retain_mut(|attribute| {
            if attribute.attr_type() == attr_type {
                removed += 1;
                return false;
            }
            if let Some(nested) = attribute.as_vendor_mut() {
                if nested.vendor() == attr_type.vendor() {
                    let count = nested.remove_all(attr_type);
                    removed += count;
                    return count == 0 || !nested.is_empty();
                }
            }
            true
        });
        removed
    }

    pub fn get_first(&self, attr_type: AttributeType) -> Option<&RadiusAttribute> {
        self.attributes.iter().find_map(|attribute| {
            if attribute.attr_type() == attr_type {
                return Some(attribute);
            }
            attribute
                .as_vendor()
                .filter(|nested| nested.vendor() == attr_type.vendor())
                .and_then(|nested| nested.get_first(attr_type))
        })
    }

    pub fn contains(&self, attr_type: AttributeType) -> bool {
        self.get_first(attr_type).is_some()
    }

    pub fn find_all(&self, attr_type: AttributeType) -> Vec<&RadiusAttribute> {
        let mut found = Vec::new();
        self.collect_into(attr_type, &mut found);
        found
    }

    fn collect_into<'a>(&'a self, attr_type: AttributeType, found: &mut Vec<&'a RadiusAttribute>) {
        for attribute in &self.attributes {
            if attribute.attr_type() == attr_type {
                found.push(attribute);
            } else if let Some(nested) = attribute.as_vendor() {
                if nested.vendor() == attr_type.vendor() {
                    nested.collect_into(attr_type, found);
                }
            }
        }
    }

    /// Encode all attributes as `type | length | value` triples.
    pub fn encode_into(
        &self,
        secret: &[u8],
        authenticator: &[u8; 16],
        out: &mut Vec<u8>,
    ) -> Result<(), CodecError> {
        for attribute in &self.attributes {
            let value = attribute.encode_value(secret, authenticator)?;
            if value.len() > WIRE_VALUE_MAX_LENGTH || value.len() > ATTRIBUTE_VALUE_MAX_LENGTH {
                return Err(CodecError::AttributeTooLong(value.len()));
            }
            out.push(attribute.attr_type().code());
            out.push((value.len() + ATTRIBUTE_HEADER_LENGTH) as u8);
            out.extend_from_slice(&value);
        }
        Ok(())
    }

    /// Decode a sequence of `type | length | value` triples belonging to
    /// this list's vendor.
    pub fn decode_from(&mut self, mut data: &[u8], ctx: &DecodeContext<'_>) -> Result<(), CodecError> {
        while !data.is_empty() {
            if data.len() < ATTRIBUTE_HEADER_LENGTH {
                return Err(CodecError::attribute(
                    AttributeType::new(self.vendor, data[0]),
                    "truncated attribute header",
                ));
            }
            let attr_type = AttributeType::new(self.vendor, data[0]);
            let length = data[1] as usize;
            if length < ATTRIBUTE_HEADER_LENGTH || length > data.len() {
                return Err(CodecError::attribute(
                    attr_type,
                    format!("incorrect attribute length: {length}"),
                ));
            }
            let attribute = ctx.factory.decode(attr_type, &data[ATTRIBUTE_HEADER_LENGTH..length], ctx)?;
            self.try_add(attribute)
                .map_err(|e| CodecError::attribute(attr_type, e.to_string()))?;
            data = &data[length..];
        }
        Ok(())
    }

    /// Decode a Vendor-Specific payload: a 4-byte vendor code followed by the
    /// vendor's attributes.
    pub(crate) fn decode_vendor(raw: &[u8], ctx: &DecodeContext<'_>) -> Result<Self, CodecError> {
        let attr_type = AttributeType::VENDOR_SPECIFIC;
        let (vendor, payload) = raw
            .split_first_chunk::<4>()
            .ok_or_else(|| CodecError::attribute(attr_type, "vendor payload shorter than 4 bytes"))?;
        let vendor = u32::from_be_bytes(*vendor);
        if vendor == AttributeType::VENDOR_NONE || vendor > AttributeType::VENDOR_MAX {
            return Err(CodecError::attribute(attr_type, format!("invalid vendor code: {vendor}")));
        }
        let mut list = AttributesList::for_vendor(vendor);
        list.decode_from(payload, ctx)?;
        Ok(list)
    }
}

impl<'a> IntoIterator for &'a AttributesList {
    type Item = &'a RadiusAttribute;
    type IntoIter = std::slice::Iter<'a, RadiusAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

impl IntoIterator for AttributesList {
    type Item = RadiusAttribute;
    type IntoIter = std::vec::IntoIter<RadiusAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeFactory;
    use crate::attributes::microsoft::{MS_CHAP_CHALLENGE, MS_CHAP_DOMAIN, VENDOR_MICROSOFT};

    fn ms_challenge() -> RadiusAttribute {
        RadiusAttribute::octets(MS_CHAP_CHALLENGE, vec![1u8; 16])
    }

    #[test]
    fn test_vendor_attribute_is_wrapped() {
        let mut list = AttributesList::new();
        list.add(ms_challenge());

        assert_eq!(list.len(), 1);
        let container = list.iter().next().unwrap();
        assert_eq!(container.attr_type(), AttributeType::VENDOR_SPECIFIC);
        let nested = container.as_vendor().unwrap();
        assert_eq!(nested.vendor(), VENDOR_MICROSOFT);
        assert_eq!(nested.len(), 1);

        assert_eq!(list.get_first(MS_CHAP_CHALLENGE), Some(&ms_challenge()));
        assert_eq!(list.find_all(MS_CHAP_CHALLENGE).len(), 1);
        assert_eq!(list.find_all(AttributeType::VENDOR_SPECIFIC).len(), 1);
        assert!(list.contains(MS_CHAP_CHALLENGE));
    }

    #[test]
    fn test_vendor_list_rejects_foreign_attributes() {
        let mut list = AttributesList::for_vendor(VENDOR_MICROSOFT);
        assert!(list.try_add(ms_challenge()).is_ok());
        assert!(list.try_add(RadiusAttribute::user_name("bob")).is_err());
        assert!(list.try_add(RadiusAttribute::string(AttributeType::new(9, 1), "x")).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_set_replaces_all() {
        let mut list = AttributesList::new();
        list.add(RadiusAttribute::reply_message("one"));
        list.add(RadiusAttribute::reply_message("two"));
        list.add(RadiusAttribute::user_name("bob"));

        list.set(RadiusAttribute::reply_message("three"));
        let messages: Vec<_> = list
            .find_all(AttributeType::REPLY_MESSAGE)
            .iter()
            .map(|a| a.as_str().unwrap())
            .collect();
        assert_eq!(messages, vec!["three"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_remove_all_recurses_into_vendor() {
        let mut list = AttributesList::new();
        list.add(ms_challenge());
        list.add(RadiusAttribute::ident_string(MS_CHAP_DOMAIN, 1, "CORP"));
        list.add(RadiusAttribute::user_name("bob"));

        assert_eq!(list.remove_all(MS_CHAP_CHALLENGE), 1);
        assert!(!list.contains(MS_CHAP_CHALLENGE));
        assert!(list.contains(MS_CHAP_DOMAIN));
        // the emptied container is gone, the other one stays
        assert_eq!(list.len(), 2);
        assert_eq!(list.remove_all(AttributeType::USER_NAME), 1);
        assert_eq!(list.remove_all(AttributeType::USER_NAME), 0);
    }

    #[test]
    fn test_vendor_encode_decode() {
        let mut list = AttributesList::new();
        list.add(ms_challenge());
        list.add(RadiusAttribute::ident_string(MS_CHAP_DOMAIN, 3, "CORP"));
        list.add(RadiusAttribute::user_name("bob"));

        let auth = [0u8; 16];
        let mut raw = Vec::new();
        list.encode_into(b"s", &auth, &mut raw).unwrap();
        // 26, len, 0,0,1,55, 11, 18, <16 bytes>
        assert_eq!(&raw[..8], &[26, 24, 0, 0, 1, 55, 11, 18]);

        let factory = AttributeFactory::new();
        let ctx = DecodeContext {
            secret: b"s",
            authenticator: &auth,
            factory: &factory,
        };
        let mut decoded = AttributesList::new();
        decoded.decode_from(&raw, &ctx).unwrap();
        assert_eq!(decoded, list);
    }

    #[test]
    fn test_value_too_long_rejected() {
        let mut list = AttributesList::new();
        list.add(RadiusAttribute::octets(AttributeType::CLASS, vec![0u8; 254]));
        let mut raw = Vec::new();
        assert!(matches!(
            list.encode_into(b"s", &[0u8; 16], &mut raw),
            Err(CodecError::AttributeTooLong(254))
        ));
    }

    #[test]
    fn test_truncated_vendor_payload_rejected() {
        let factory = AttributeFactory::new();
        let ctx = DecodeContext {
            secret: b"s",
            authenticator: &[0u8; 16],
            factory: &factory,
        };
        assert!(AttributesList::decode_vendor(&[0, 0, 1], &ctx).is_err());
        assert!(AttributesList::decode_vendor(&[0, 0, 0, 0], &ctx).is_err());
        // nested length runs past the payload
        assert!(AttributesList::decode_vendor(&[0, 0, 1, 55, 11, 40, 1, 2], &ctx).is_err());
    }
}
