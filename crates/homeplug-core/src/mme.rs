//! HomePlug AV Management Message Entry (MME) envelope
//!
//! Every MME carried in an `0x88E1` Ethernet frame starts with a fixed
//! 6-byte header:
//!
//! ```text
//! 0        1        2        3        4        5        6 ...
//! +--------+--------+--------+--------+--------+--------+--------
//! | version| type lo| type hi|     vendor OUI (3)       | payload
//! +--------+--------+--------+--------+--------+--------+--------
//! ```
//!
//! The message type goes out low byte first. Devices expect exactly this
//! order, so [`Frame::encode`] and [`Frame::decode`] swap it relative to the
//! logical code.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// EtherType of HomePlug AV management traffic
pub const HOMEPLUG_ETHERTYPE: u16 = 0x88E1;

/// Vendor OUI used in vendor-specific MMEs
pub const HOMEPLUG_VENDOR: [u8; 3] = [0x00, 0xB0, 0x52];

/// MME protocol version byte
pub const MME_VERSION: u8 = 0x00;

/// Length of the MME header preceding the payload
pub const MME_HEADER_LEN: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MmeError {
    #[error("Truncated message: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("Too many {kind} records to encode: {count}")]
    TooManyRecords { kind: &'static str, count: usize },
}

/// Logical MME type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MmeType(pub u16);

impl MmeType {
    /// Vendor network info request
    pub const NETWORK_INFO_REQUEST: Self = Self(0xA038);
    /// Vendor network info confirm, answers [`Self::NETWORK_INFO_REQUEST`]
    pub const NETWORK_INFO_CONFIRM: Self = Self(0xA039);
}

impl fmt::Display for MmeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// One decoded MME
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub version: u8,
    pub mme_type: MmeType,
    pub vendor: [u8; 3],
    pub payload: Vec<u8>,
}

impl Frame {
    /// The discovery request sent once per collection cycle
    pub fn network_info_request() -> Self {
        Self {
            version: MME_VERSION,
            mme_type: MmeType::NETWORK_INFO_REQUEST,
            vendor: HOMEPLUG_VENDOR,
            payload: Vec::new(),
        }
    }

    /// Wire length of this frame
    pub fn encoded_len(&self) -> usize {
        MME_HEADER_LEN + self.payload.len()
    }

    /// Encode to wire format
    pub fn encode(&self) -> Vec<u8> {
        let [type_hi, type_lo] = self.mme_type.0.to_be_bytes();

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(self.version);
        buf.push(type_lo);
        buf.push(type_hi);
        buf.extend_from_slice(&self.vendor);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Decode from wire format
    ///
    /// Everything past the header is kept as payload, including any
    /// Ethernet padding.
    pub fn decode(data: &[u8]) -> Result<Self, MmeError> {
        if data.len() < MME_HEADER_LEN {
            return Err(MmeError::Truncated {
                needed: MME_HEADER_LEN,
                available: data.len(),
            });
        }

        Ok(Self {
            version: data[0],
            mme_type: MmeType(u16::from_be_bytes([data[2], data[1]])),
            vendor: [data[3], data[4], data[5]],
            payload: data[MME_HEADER_LEN..].to_vec(),
        })
    }
}
