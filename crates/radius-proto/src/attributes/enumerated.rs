//! Enumerated integer attributes.
//!
//! The wire value is a plain 32-bit integer; these types give it a name and
//! restrict it to the codes the protocol defines. Their tables also feed the
//! enum maps of the [`StandardDictionary`](crate::dictionary::StandardDictionary).
//!
//! # Example
//!
//! ```rust
//! use radius_proto::attributes::{AcctStatusType, Enumerated, RadiusAttribute};
//!
//! let attr = RadiusAttribute::enumerated(AcctStatusType::Start);
//! assert_eq!(attr.as_integer(), Some(1));
//! assert_eq!(AcctStatusType::from_name("Stop"), Some(AcctStatusType::Stop));
//! ```

use super::types::AttributeType;

/// Integer attribute value with a closed set of named codes.
pub trait Enumerated: Copy + Sized + 'static {
    /// Attribute carrying this value
    const ATTRIBUTE: AttributeType;
    /// Every `(code, name)` pair
    const VALUES: &'static [(u32, &'static str)];

    fn code(self) -> u32;

    fn from_code(code: u32) -> Option<Self>;

    fn name(self) -> &'static str {
        let code = self.code();
        Self::VALUES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::VALUES
            .iter()
            .find(|(_, n)| *n == name)
            .and_then(|(code, _)| Self::from_code(*code))
    }
}

/// Service-Type values (RFC 2865 Section 5.6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ServiceType {
    Login = 1,
    Framed = 2,
    CallbackLogin = 3,
    CallbackFramed = 4,
    Outbound = 5,
    Administrative = 6,
    NasPrompt = 7,
    AuthenticateOnly = 8,
    CallbackNasPrompt = 9,
    CallCheck = 10,
    CallbackAdministrative = 11,
}

impl Enumerated for ServiceType {
    const ATTRIBUTE: AttributeType = AttributeType::SERVICE_TYPE;
    const VALUES: &'static [(u32, &'static str)] = &[
        (1, "Login"),
        (2, "Framed"),
        (3, "CallbackLogin"),
        (4, "CallbackFramed"),
        (5, "Outbound"),
        (6, "Administrative"),
        (7, "NASPrompt"),
        (8, "AuthenticateOnly"),
        (9, "CallbackNASPrompt"),
        (10, "CallCheck"),
        (11, "CallbackAdministrative"),
    ];

    fn code(self) -> u32 {
        self as u32
    }

    fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(ServiceType::Login),
            2 => Some(ServiceType::Framed),
            3 => Some(ServiceType::CallbackLogin),
            4 => Some(ServiceType::CallbackFramed),
            5 => Some(ServiceType::Outbound),
            6 => Some(ServiceType::Administrative),
            7 => Some(ServiceType::NasPrompt),
            8 => Some(ServiceType::AuthenticateOnly),
            9 => Some(ServiceType::CallbackNasPrompt),
            10 => Some(ServiceType::CallCheck),
            11 => Some(ServiceType::CallbackAdministrative),
            _ => None,
        }
    }
}

/// Accounting Status-Type values (RFC 2866 Section 5.1)
///
/// Indicates the type of accounting packet being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AcctStatusType {
    /// Start (1) - Session has begun
    Start = 1,
    /// Stop (2) - Session has ended
    Stop = 2,
    /// Interim-Update (3) - Periodic update during session
    InterimUpdate = 3,
    /// Accounting-On (7) - NAS is ready
    AccountingOn = 7,
    /// Accounting-Off (8) - NAS is shutting down
    AccountingOff = 8,
}

impl AcctStatusType {
    /// Check if this is a session-related status (Start, Stop, Interim-Update)
    pub fn is_session_status(self) -> bool {
        matches!(
            self,
            AcctStatusType::Start | AcctStatusType::Stop | AcctStatusType::InterimUpdate
        )
    }
}

impl Enumerated for AcctStatusType {
    const ATTRIBUTE: AttributeType = AttributeType::ACCT_STATUS_TYPE;
    const VALUES: &'static [(u32, &'static str)] = &[
        (1, "Start"),
        (2, "Stop"),
        (3, "InterimUpdate"),
        (7, "AccountingOn"),
        (8, "AccountingOff"),
    ];

    fn code(self) -> u32 {
        self as u32
    }

    fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(AcctStatusType::Start),
            2 => Some(AcctStatusType::Stop),
            3 => Some(AcctStatusType::InterimUpdate),
            7 => Some(AcctStatusType::AccountingOn),
            8 => Some(AcctStatusType::AccountingOff),
            _ => None,
        }
    }
}

/// Octets-Direction values: which traffic counters Session-Octets-Limit
/// applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OctetsDirection {
    /// Input and output combined
    Sum = 0,
    In = 1,
    Out = 2,
    /// Whichever of input or output is larger
    MaxOveral = 3,
    /// Counted over the whole session
    MaxSession = 4,
}

impl Enumerated for OctetsDirection {
    const ATTRIBUTE: AttributeType = AttributeType::OCTETS_DIRECTION;
    const VALUES: &'static [(u32, &'static str)] = &[
        (0, "Sum"),
        (1, "In"),
        (2, "Out"),
        (3, "MaxOveral"),
        (4, "MaxSession"),
    ];

    fn code(self) -> u32 {
        self as u32
    }

    fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(OctetsDirection::Sum),
            1 => Some(OctetsDirection::In),
            2 => Some(OctetsDirection::Out),
            3 => Some(OctetsDirection::MaxOveral),
            4 => Some(OctetsDirection::MaxSession),
            _ => None,
        }
    }
}
