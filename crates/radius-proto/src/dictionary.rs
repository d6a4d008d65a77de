//! Attribute names, value kinds and enum maps.
//!
//! The codec only consults a dictionary to pick a value kind for types that
//! have no registered decoder, and to render or parse attributes as text.

use crate::attributes::cisco::{CISCO_AVPAIR, VENDOR_CISCO};
use crate::attributes::microsoft::*;
use crate::attributes::{AcctStatusType, AttributeType, Enumerated, OctetsDirection, ServiceType, ValueKind};
use crate::error::InvalidValue;
use std::collections::{BTreeMap, HashMap};

/// Name and value rules for one attribute type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: ValueKind,
    /// Symbolic names for integer codes; empty unless enumerated
    pub values: BTreeMap<u32, String>,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        AttributeDescriptor {
            name: name.into(),
            kind,
            values: BTreeMap::new(),
        }
    }

    /// Descriptor whose values come from an [`Enumerated`] table
    pub fn enumerated<E: Enumerated>(name: impl Into<String>) -> Self {
        let mut descriptor = Self::new(name, ValueKind::Integer);
        descriptor.values = E::VALUES
            .iter()
            .map(|(code, name)| (*code, (*name).to_string()))
            .collect();
        descriptor
    }

    pub fn is_enumerated(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn value_name(&self, code: u32) -> Option<&str> {
        self.values.get(&code).map(String::as_str)
    }

    /// Resolve a symbolic name or a known numeric code.
    pub fn resolve_value(&self, text: &str) -> Result<u32, InvalidValue> {
        if let Some((code, _)) = self.values.iter().find(|(_, name)| name.as_str() == text) {
            return Ok(*code);
        }
        match text.parse::<u32>() {
            Ok(code) if self.values.contains_key(&code) => Ok(code),
            _ => Err(InvalidValue::new(format!(
                "'{text}' is not a known value of {}",
                self.name
            ))),
        }
    }
}

/// Lookup of attribute and vendor metadata.
pub trait Dictionary: Send + Sync {
    fn attribute_descriptor(&self, attr_type: AttributeType) -> Option<&AttributeDescriptor>;

    fn vendor_name(&self, vendor: u32) -> Option<&str>;
}

/// Map a dictionary kind name (`string`, `integer`, `ipaddr`, ...) to a
/// [`ValueKind`]. Unknown names map to octets.
pub fn kind_from_name(name: &str) -> ValueKind {
    match name.to_ascii_lowercase().as_str() {
        "string" | "text" => ValueKind::String,
        "integer" => ValueKind::Integer,
        "ipaddr" | "address" => ValueKind::Address,
        "time" | "date" => ValueKind::Date,
        _ => ValueKind::Octets,
    }
}

/// In-memory dictionary preloaded with RFC 2865/2866, Microsoft and Cisco
/// attributes.
#[derive(Debug, Clone, Default)]
pub struct StandardDictionary {
    attributes: HashMap<AttributeType, AttributeDescriptor>,
    vendors: HashMap<u32, String>,
}

impl StandardDictionary {
    pub fn new() -> Self {
        use ValueKind::*;

        let mut dict = StandardDictionary::default();
        let standard = [
            (AttributeType::USER_NAME, "User-Name", String),
            (AttributeType::USER_PASSWORD, "User-Password", UserPassword),
            (AttributeType::CHAP_PASSWORD, "CHAP-Password", Octets),
            (AttributeType::NAS_IP_ADDRESS, "NAS-IP-Address", Address),
            (AttributeType::NAS_PORT, "NAS-Port", Integer),
            (AttributeType::FRAMED_PROTOCOL, "Framed-Protocol", Integer),
            (AttributeType::FRAMED_IP_ADDRESS, "Framed-IP-Address", Address),
            (AttributeType::FRAMED_IP_NETMASK, "Framed-IP-Netmask", Address),
            (AttributeType::FILTER_ID, "Filter-Id", String),
            (AttributeType::FRAMED_MTU, "Framed-MTU", Integer),
            (AttributeType::REPLY_MESSAGE, "Reply-Message", String),
            (AttributeType::STATE, "State", Octets),
            (AttributeType::CLASS, "Class", Octets),
            (AttributeType::VENDOR_SPECIFIC, "Vendor-Specific", Vendor),
            (AttributeType::SESSION_TIMEOUT, "Session-Timeout", Integer),
            (AttributeType::IDLE_TIMEOUT, "Idle-Timeout", Integer),
            (AttributeType::CALLED_STATION_ID, "Called-Station-Id", String),
            (AttributeType::CALLING_STATION_ID, "Calling-Station-Id", String),
            (AttributeType::NAS_IDENTIFIER, "NAS-Identifier", String),
            (AttributeType::PROXY_STATE, "Proxy-State", Octets),
            (AttributeType::ACCT_DELAY_TIME, "Acct-Delay-Time", Integer),
            (AttributeType::ACCT_INPUT_OCTETS, "Acct-Input-Octets", Integer),
            (AttributeType::ACCT_OUTPUT_OCTETS, "Acct-Output-Octets", Integer),
            (AttributeType::ACCT_SESSION_ID, "Acct-Session-Id", String),
            (AttributeType::ACCT_SESSION_TIME, "Acct-Session-Time", Integer),
            (AttributeType::ACCT_INPUT_PACKETS, "Acct-Input-Packets", Integer),
            (AttributeType::ACCT_OUTPUT_PACKETS, "Acct-Output-Packets", Integer),
            (AttributeType::ACCT_TERMINATE_CAUSE, "Acct-Terminate-Cause", Integer),
            (AttributeType::EVENT_TIMESTAMP, "Event-Timestamp", Date),
            (AttributeType::CHAP_CHALLENGE, "CHAP-Challenge", Octets),
            (AttributeType::NAS_PORT_TYPE, "NAS-Port-Type", Integer),
            (AttributeType::MESSAGE_AUTHENTICATOR, "Message-Authenticator", Octets),
            (AttributeType::ACCT_INTERIM_INTERVAL, "Acct-Interim-Interval", Integer),
            (AttributeType::SESSION_OCTETS_LIMIT, "Session-Octets-Limit", Integer),
        ];
        for (attr_type, name, kind) in standard {
            dict.insert(attr_type, AttributeDescriptor::new(name, kind));
        }
        dict.insert(
            AttributeType::SERVICE_TYPE,
            AttributeDescriptor::enumerated::<ServiceType>("Service-Type"),
        );
        dict.insert(
            AttributeType::ACCT_STATUS_TYPE,
            AttributeDescriptor::enumerated::<AcctStatusType>("Acct-Status-Type"),
        );
        dict.insert(
            AttributeType::OCTETS_DIRECTION,
            AttributeDescriptor::enumerated::<OctetsDirection>("Octets-Direction"),
        );

        dict.insert_vendor(VENDOR_MICROSOFT, "Microsoft");
        let microsoft = [
            (MS_CHAP_RESPONSE, "MS-CHAP-Response", Octets),
            (MS_CHAP_ERROR, "MS-CHAP-Error", IdentString),
            (MS_CHAP_CPW_1, "MS-CHAP-CPW-1", Octets),
            (MS_CHAP_CPW_2, "MS-CHAP-CPW-2", Octets),
            (MS_CHAP_NT_ENC_PW, "MS-CHAP-NT-Enc-PW", Octets),
            (MS_CHAP_DOMAIN, "MS-CHAP-Domain", IdentString),
            (MS_CHAP_CHALLENGE, "MS-CHAP-Challenge", Octets),
            (MS_CHAP2_RESPONSE, "MS-CHAP2-Response", Octets),
            (MS_CHAP2_SUCCESS, "MS-CHAP2-Success", IdentString),
            (MS_CHAP2_CPW, "MS-CHAP2-CPW", Octets),
        ];
        for (attr_type, name, kind) in microsoft {
            dict.insert(attr_type, AttributeDescriptor::new(name, kind));
        }

        dict.insert_vendor(VENDOR_CISCO, "Cisco");
        dict.insert(CISCO_AVPAIR, AttributeDescriptor::new("Cisco-AVPair", String));
        dict
    }

    /// Add or replace an attribute descriptor.
    pub fn insert(&mut self, attr_type: AttributeType, descriptor: AttributeDescriptor) -> &mut Self {
        self.attributes.insert(attr_type, descriptor);
        self
    }

    pub fn insert_vendor(&mut self, vendor: u32, name: impl Into<String>) -> &mut Self {
        self.vendors.insert(vendor, name.into());
        self
    }

    /// Find an attribute type by its dictionary name.
    pub fn find_by_name(&self, name: &str) -> Option<AttributeType> {
        self.attributes
            .iter()
            .find(|(_, d)| d.name.eq_ignore_ascii_case(name))
            .map(|(attr_type, _)| *attr_type)
    }
}

impl Dictionary for StandardDictionary {
    fn attribute_descriptor(&self, attr_type: AttributeType) -> Option<&AttributeDescriptor> {
        self.attributes.get(&attr_type)
    }

    fn vendor_name(&self, vendor: u32) -> Option<&str> {
        self.vendors.get(&vendor).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name() {
        assert_eq!(kind_from_name("string"), ValueKind::String);
        assert_eq!(kind_from_name("TEXT"), ValueKind::String);
        assert_eq!(kind_from_name("integer"), ValueKind::Integer);
        assert_eq!(kind_from_name("ipaddr"), ValueKind::Address);
        assert_eq!(kind_from_name("date"), ValueKind::Date);
        assert_eq!(kind_from_name("abinary"), ValueKind::Octets);
    }

    #[test]
    fn test_enum_resolution() {
        let dict = StandardDictionary::new();
        let descriptor = dict.attribute_descriptor(AttributeType::ACCT_STATUS_TYPE).unwrap();
        assert!(descriptor.is_enumerated());
        assert_eq!(descriptor.resolve_value("Stop").unwrap(), 2);
        assert_eq!(descriptor.resolve_value("3").unwrap(), 3);
        assert!(descriptor.resolve_value("4").is_err());
        assert_eq!(descriptor.value_name(7), Some("AccountingOn"));
    }

    #[test]
    fn test_vendor_entries() {
        let dict = StandardDictionary::new();
        assert_eq!(dict.vendor_name(311), Some("Microsoft"));
        assert_eq!(dict.vendor_name(9), Some("Cisco"));
        assert_eq!(dict.vendor_name(1), None);
        assert_eq!(dict.find_by_name("ms-chap2-success"), Some(MS_CHAP2_SUCCESS));
        assert_eq!(
            dict.attribute_descriptor(CISCO_AVPAIR).map(|d| d.kind),
            Some(ValueKind::String)
        );
    }

    #[test]
    fn test_insert_overrides() {
        let mut dict = StandardDictionary::new();
        dict.insert(AttributeType::CLASS, AttributeDescriptor::new("Class", kind_from_name("string")));
        assert_eq!(
            dict.attribute_descriptor(AttributeType::CLASS).unwrap().kind,
            ValueKind::String
        );
    }
}
