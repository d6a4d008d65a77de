//! Cisco vendor-specific attributes, vendor code 9.

use super::attribute::RadiusAttribute;
use super::types::AttributeType;
use crate::error::InvalidValue;

pub const VENDOR_CISCO: u32 = 9;

pub const CISCO_AVPAIR: AttributeType = AttributeType::new(VENDOR_CISCO, 1);

/// Cisco-AVPair value of the form `protocol:attribute=value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiscoAvPair {
    pub protocol: String,
    pub pair: String,
}

impl CiscoAvPair {
    pub fn new(protocol: impl Into<String>, pair: impl Into<String>) -> Self {
        CiscoAvPair {
            protocol: protocol.into(),
            pair: pair.into(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, InvalidValue> {
        let (protocol, pair) = text
            .split_once(':')
            .ok_or_else(|| InvalidValue::new(format!("'{text}' is not protocol:attribute=value")))?;
        Ok(Self::new(protocol, pair))
    }

    /// Split the pair into attribute name and value
    pub fn attribute_value(&self) -> Option<(&str, &str)> {
        self.pair.split_once('=')
    }

    pub fn from_attribute(attribute: &RadiusAttribute) -> Result<Self, InvalidValue> {
        if attribute.attr_type() != CISCO_AVPAIR {
            return Err(InvalidValue::new("not a Cisco-AVPair attribute"));
        }
        let text = attribute
            .as_str()
            .ok_or_else(|| InvalidValue::new("Cisco-AVPair is not a string value"))?;
        Self::parse(text)
    }

    pub fn to_attribute(&self) -> RadiusAttribute {
        RadiusAttribute::string(CISCO_AVPAIR, format!("{}:{}", self.protocol, self.pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avpair_parse() {
        let pair = CiscoAvPair::parse("shell:priv-lvl=15").unwrap();
        assert_eq!(pair.protocol, "shell");
        assert_eq!(pair.attribute_value(), Some(("priv-lvl", "15")));
        assert!(CiscoAvPair::parse("no-separator").is_err());

        let attr = pair.to_attribute();
        assert_eq!(attr.as_str(), Some("shell:priv-lvl=15"));
        assert_eq!(CiscoAvPair::from_attribute(&attr).unwrap(), pair);
    }
}
