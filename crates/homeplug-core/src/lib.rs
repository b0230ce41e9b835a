//! HomePlug Core - Message codecs and types for HomePlug AV discovery
//!
//! This crate provides the I/O-free building blocks:
//! - Hardware addresses with destination alias parsing
//! - The MME (Management Message Entry) envelope codec
//! - The vendor network info confirm payload codec and its records

pub mod address;
pub mod mme;
pub mod netinfo;

pub use address::{AddressError, MacAddress};
pub use mme::{
    Frame, MmeError, MmeType, HOMEPLUG_ETHERTYPE, HOMEPLUG_VENDOR, MME_HEADER_LEN, MME_VERSION,
};
pub use netinfo::{rate_code_to_bytes, DiscoveryResult, NetworkRecord, StationRecord};
