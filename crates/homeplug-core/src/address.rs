//! Hardware (MAC) addresses as carried in Ethernet headers and MME payloads

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address length: {0}")]
    InvalidLength(String),
    #[error("Invalid address octet: {0}")]
    InvalidOctet(String),
}

/// A 6-byte hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// ff:ff:ff:ff:ff:ff
    pub const BROADCAST: Self = Self([0xff; 6]);

    /// Address every local HomePlug AV bridge answers to
    pub const HOMEPLUG_LOCAL: Self = Self([0x00, 0xb0, 0x52, 0x00, 0x00, 0x01]);

    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Parse a destination given on the command line or in config
    ///
    /// Accepts the aliases `broadcast`/`all` and `local` in addition to
    /// anything [`FromStr`] accepts.
    pub fn from_destination(text: &str) -> Result<Self, AddressError> {
        match text.trim().to_lowercase().as_str() {
            "broadcast" | "all" => Ok(Self::BROADCAST),
            "local" => Ok(Self::HOMEPLUG_LOCAL),
            other => other.parse(),
        }
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        // Separated forms: 00:b0:52:00:00:01 or 00-b0-52-00-00-01
        // Bare form: 00B052000001
        let parts: Vec<&str> = if s.contains(':') || s.contains('-') {
            s.split(|c| c == ':' || c == '-').collect()
        } else if s.len() == 12 && s.is_ascii() {
            (0..6).map(|i| &s[i * 2..i * 2 + 2]).collect()
        } else {
            return Err(AddressError::InvalidLength(s.to_string()));
        };

        if parts.len() != 6 {
            return Err(AddressError::InvalidLength(s.to_string()));
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(&parts) {
            if part.is_empty() || part.len() > 2 {
                return Err(AddressError::InvalidOctet(part.to_string()));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| AddressError::InvalidOctet(part.to_string()))?;
        }

        Ok(Self(octets))
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_destination(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lowercase_colons() {
        assert_eq!(MacAddress::HOMEPLUG_LOCAL.to_string(), "00:b0:52:00:00:01");
    }

    #[test]
    fn test_parse_forms() {
        let expected = MacAddress::new([0x00, 0xb0, 0x52, 0x00, 0x00, 0x01]);
        assert_eq!("00:B0:52:00:00:01".parse::<MacAddress>().unwrap(), expected);
        assert_eq!("00-b0-52-00-00-01".parse::<MacAddress>().unwrap(), expected);
        assert_eq!("00B052000001".parse::<MacAddress>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            "00:b0:52:00:00".parse::<MacAddress>(),
            Err(AddressError::InvalidLength(_))
        ));
        assert!(matches!(
            "00:b0:52:00:00:01:02:03".parse::<MacAddress>(),
            Err(AddressError::InvalidLength(_))
        ));
        assert!(matches!(
            "zz:b0:52:00:00:01".parse::<MacAddress>(),
            Err(AddressError::InvalidOctet(_))
        ));
        assert!("".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_destination_aliases() {
        assert_eq!(
            MacAddress::from_destination("broadcast").unwrap().to_string(),
            "ff:ff:ff:ff:ff:ff"
        );
        assert_eq!(
            MacAddress::from_destination("all").unwrap(),
            MacAddress::BROADCAST
        );
        assert_eq!(
            MacAddress::from_destination("local").unwrap(),
            MacAddress::HOMEPLUG_LOCAL
        );
        assert_eq!(
            MacAddress::from_destination("aa:bb:cc:dd:ee:ff").unwrap(),
            MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff])
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&MacAddress::BROADCAST).unwrap();
        assert_eq!(json, "\"ff:ff:ff:ff:ff:ff\"");
        let back: MacAddress = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(back, MacAddress::HOMEPLUG_LOCAL);
    }
}
