use crate::error::InvalidValue;
use std::fmt;

/// Identifies an attribute by vendor and type code.
///
/// Vendor code 0 means a standard (non vendor-specific) attribute. Ordering is
/// by vendor code first, then by type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeType {
    vendor: u32,
    code: u8,
}

impl AttributeType {
    /// Vendor code of standard attributes
    pub const VENDOR_NONE: u32 = 0;
    /// Largest vendor code (24 bits)
    pub const VENDOR_MAX: u32 = 0x00FF_FFFF;

    /// Create an attribute type.
    ///
    /// # Panics
    ///
    /// Panics if `vendor` exceeds [`AttributeType::VENDOR_MAX`]. Use
    /// [`AttributeType::try_new`] for untrusted input.
    pub const fn new(vendor: u32, code: u8) -> Self {
        assert!(vendor <= Self::VENDOR_MAX, "vendor code out of range");
        AttributeType { vendor, code }
    }

    pub fn try_new(vendor: u32, code: u8) -> Result<Self, InvalidValue> {
        if vendor > Self::VENDOR_MAX {
            return Err(InvalidValue::new(format!("vendor code {vendor} out of range")));
        }
        Ok(AttributeType { vendor, code })
    }

    /// Standard attribute with vendor code 0
    pub const fn standard(code: u8) -> Self {
        AttributeType {
            vendor: Self::VENDOR_NONE,
            code,
        }
    }

    pub const fn vendor(self) -> u32 {
        self.vendor
    }

    pub const fn code(self) -> u8 {
        self.code
    }

    pub const fn is_vendor_specific(self) -> bool {
        self.vendor != Self::VENDOR_NONE
    }

    /// User-Name (1) - RFC 2865
    pub const USER_NAME: AttributeType = AttributeType::standard(1);
    /// User-Password (2) - RFC 2865
    pub const USER_PASSWORD: AttributeType = AttributeType::standard(2);
    /// CHAP-Password (3) - RFC 2865
    pub const CHAP_PASSWORD: AttributeType = AttributeType::standard(3);
    /// NAS-IP-Address (4) - RFC 2865
    pub const NAS_IP_ADDRESS: AttributeType = AttributeType::standard(4);
    /// NAS-Port (5) - RFC 2865
    pub const NAS_PORT: AttributeType = AttributeType::standard(5);
    /// Service-Type (6) - RFC 2865
    pub const SERVICE_TYPE: AttributeType = AttributeType::standard(6);
    /// Framed-Protocol (7) - RFC 2865
    pub const FRAMED_PROTOCOL: AttributeType = AttributeType::standard(7);
    /// Framed-IP-Address (8) - RFC 2865
    pub const FRAMED_IP_ADDRESS: AttributeType = AttributeType::standard(8);
    /// Framed-IP-Netmask (9) - RFC 2865
    pub const FRAMED_IP_NETMASK: AttributeType = AttributeType::standard(9);
    /// Filter-Id (11) - RFC 2865
    pub const FILTER_ID: AttributeType = AttributeType::standard(11);
    /// Framed-MTU (12) - RFC 2865
    pub const FRAMED_MTU: AttributeType = AttributeType::standard(12);
    /// Reply-Message (18) - RFC 2865
    pub const REPLY_MESSAGE: AttributeType = AttributeType::standard(18);
    /// State (24) - RFC 2865
    pub const STATE: AttributeType = AttributeType::standard(24);
    /// Class (25) - RFC 2865
    pub const CLASS: AttributeType = AttributeType::standard(25);
    /// Vendor-Specific (26) - RFC 2865
    pub const VENDOR_SPECIFIC: AttributeType = AttributeType::standard(26);
    /// Session-Timeout (27) - RFC 2865
    pub const SESSION_TIMEOUT: AttributeType = AttributeType::standard(27);
    /// Idle-Timeout (28) - RFC 2865
    pub const IDLE_TIMEOUT: AttributeType = AttributeType::standard(28);
    /// Called-Station-Id (30) - RFC 2865
    pub const CALLED_STATION_ID: AttributeType = AttributeType::standard(30);
    /// Calling-Station-Id (31) - RFC 2865
    pub const CALLING_STATION_ID: AttributeType = AttributeType::standard(31);
    /// NAS-Identifier (32) - RFC 2865
    pub const NAS_IDENTIFIER: AttributeType = AttributeType::standard(32);
    /// Proxy-State (33) - RFC 2865
    pub const PROXY_STATE: AttributeType = AttributeType::standard(33);
    /// Acct-Status-Type (40) - RFC 2866
    pub const ACCT_STATUS_TYPE: AttributeType = AttributeType::standard(40);
    /// Acct-Delay-Time (41) - RFC 2866
    pub const ACCT_DELAY_TIME: AttributeType = AttributeType::standard(41);
    /// Acct-Input-Octets (42) - RFC 2866
    pub const ACCT_INPUT_OCTETS: AttributeType = AttributeType::standard(42);
    /// Acct-Output-Octets (43) - RFC 2866
    pub const ACCT_OUTPUT_OCTETS: AttributeType = AttributeType::standard(43);
    /// Acct-Session-Id (44) - RFC 2866
    pub const ACCT_SESSION_ID: AttributeType = AttributeType::standard(44);
    /// Acct-Session-Time (46) - RFC 2866
    pub const ACCT_SESSION_TIME: AttributeType = AttributeType::standard(46);
    /// Acct-Input-Packets (47) - RFC 2866
    pub const ACCT_INPUT_PACKETS: AttributeType = AttributeType::standard(47);
    /// Acct-Output-Packets (48) - RFC 2866
    pub const ACCT_OUTPUT_PACKETS: AttributeType = AttributeType::standard(48);
    /// Acct-Terminate-Cause (49) - RFC 2866
    pub const ACCT_TERMINATE_CAUSE: AttributeType = AttributeType::standard(49);
    /// Event-Timestamp (55) - RFC 2869
    pub const EVENT_TIMESTAMP: AttributeType = AttributeType::standard(55);
    /// CHAP-Challenge (60) - RFC 2865
    pub const CHAP_CHALLENGE: AttributeType = AttributeType::standard(60);
    /// NAS-Port-Type (61) - RFC 2865
    pub const NAS_PORT_TYPE: AttributeType = AttributeType::standard(61);
    /// Message-Authenticator (80) - RFC 3579
    pub const MESSAGE_AUTHENTICATOR: AttributeType = AttributeType::standard(80);
    /// Acct-Interim-Interval (85) - RFC 2869
    pub const ACCT_INTERIM_INTERVAL: AttributeType = AttributeType::standard(85);
    /// Session-Octets-Limit (227) - traffic quota for the session
    pub const SESSION_OCTETS_LIMIT: AttributeType = AttributeType::standard(227);
    /// Octets-Direction (228) - which counters the quota applies to
    pub const OCTETS_DIRECTION: AttributeType = AttributeType::standard(228);
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_vendor_specific() {
            write!(f, "{}:{}", self.vendor, self.code)
        } else {
            write!(f, "{}", self.code)
        }
    }
}
