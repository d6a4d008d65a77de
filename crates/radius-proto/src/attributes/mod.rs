//! Attribute model: types, values, lists and the decoding registry.

pub mod attribute;
pub mod cisco;
pub mod enumerated;
pub mod factory;
pub mod list;
pub mod microsoft;
pub mod types;

pub use attribute::{AttributeValue, RadiusAttribute, ValueKind};
pub use enumerated::{AcctStatusType, Enumerated, OctetsDirection, ServiceType};
pub use factory::{AttributeDecoder, AttributeFactory, DecodeContext};
pub use list::AttributesList;
pub use types::AttributeType;
