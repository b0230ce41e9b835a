//! Network info confirm payload: logical networks and their stations
//!
//! Layout (all counts are single bytes):
//!
//! ```text
//! num_networks | network[17] * num_networks | num_stations | station[15] * num_stations
//! ```

use serde::Serialize;

use crate::address::MacAddress;
use crate::mme::MmeError;

/// Wire size of one network record
pub const NETWORK_RECORD_LEN: usize = 17;

/// Wire size of one station record
pub const STATION_RECORD_LEN: usize = 15;

/// Convert a PHY rate code to bytes per second
///
/// Rate codes count Mbit/s in binary units.
pub fn rate_code_to_bytes(code: u8) -> u64 {
    u64::from(code) * 1024 * 1024 / 8
}

/// A logical AV network the queried device belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkRecord {
    /// Network identifier (NID)
    #[serde(serialize_with = "serialize_hex")]
    pub network_id: [u8; 7],
    /// Short network identifier (SNID)
    pub short_id: u8,
    /// TEI of the queried device in this network
    pub terminal_equipment_id: u8,
    /// Role of the queried device (station, proxy or central coordinator)
    pub role: u8,
    /// Hardware address of the central coordinator (CCo)
    pub coordinator_address: MacAddress,
    /// TEI of the central coordinator
    pub coordinator_terminal_equipment_id: u8,
}

impl NetworkRecord {
    /// Network identifier as lowercase hex
    pub fn network_id_hex(&self) -> String {
        hex::encode(self.network_id)
    }

    fn decode(b: &[u8]) -> Self {
        let mut network_id = [0u8; 7];
        network_id.copy_from_slice(&b[0..7]);
        Self {
            network_id,
            short_id: b[7],
            terminal_equipment_id: b[8],
            role: b[9],
            coordinator_address: read_address(&b[10..16]),
            coordinator_terminal_equipment_id: b[16],
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.network_id);
        buf.push(self.short_id);
        buf.push(self.terminal_equipment_id);
        buf.push(self.role);
        buf.extend_from_slice(&self.coordinator_address.octets());
        buf.push(self.coordinator_terminal_equipment_id);
    }
}

/// A remote station seen by the queried device, with its link rates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationRecord {
    pub address: MacAddress,
    pub terminal_equipment_id: u8,
    /// First bridged address behind the station
    pub bridged_address: MacAddress,
    /// Average PHY transmit rate code
    pub tx_rate_code: u8,
    /// Average PHY receive rate code
    pub rx_rate_code: u8,
}

impl StationRecord {
    /// Average PHY transmit rate in bytes per second
    pub fn tx_rate_bytes(&self) -> u64 {
        rate_code_to_bytes(self.tx_rate_code)
    }

    /// Average PHY receive rate in bytes per second
    pub fn rx_rate_bytes(&self) -> u64 {
        rate_code_to_bytes(self.rx_rate_code)
    }

    fn decode(b: &[u8]) -> Self {
        Self {
            address: read_address(&b[0..6]),
            terminal_equipment_id: b[6],
            bridged_address: read_address(&b[7..13]),
            tx_rate_code: b[13],
            rx_rate_code: b[14],
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.address.octets());
        buf.push(self.terminal_equipment_id);
        buf.extend_from_slice(&self.bridged_address.octets());
        buf.push(self.tx_rate_code);
        buf.push(self.rx_rate_code);
    }
}

/// Networks and stations reported during one discovery cycle, in the order
/// they were received
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryResult {
    pub networks: Vec<NetworkRecord>,
    pub stations: Vec<StationRecord>,
}

impl DiscoveryResult {
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty() && self.stations.is_empty()
    }

    /// Append records from another result, keeping their order
    pub fn merge(&mut self, other: DiscoveryResult) {
        self.networks.extend(other.networks);
        self.stations.extend(other.stations);
    }

    /// Decode a network info confirm payload
    ///
    /// Bytes following the last station record are ignored. A count that
    /// runs past the end of the buffer fails the whole payload.
    pub fn decode(data: &[u8]) -> Result<Self, MmeError> {
        let mut reader = Reader { data, offset: 0 };
        let mut result = Self::default();

        let num_networks = reader.count()?;
        result.networks.reserve(num_networks);
        for _ in 0..num_networks {
            result
                .networks
                .push(NetworkRecord::decode(reader.take(NETWORK_RECORD_LEN)?));
        }

        let num_stations = reader.count()?;
        result.stations.reserve(num_stations);
        for _ in 0..num_stations {
            result
                .stations
                .push(StationRecord::decode(reader.take(STATION_RECORD_LEN)?));
        }

        Ok(result)
    }

    /// Encode as a network info confirm payload
    pub fn encode(&self) -> Result<Vec<u8>, MmeError> {
        let num_networks = count_byte("network", self.networks.len())?;
        let num_stations = count_byte("station", self.stations.len())?;

        let mut buf = Vec::with_capacity(
            2 + self.networks.len() * NETWORK_RECORD_LEN
                + self.stations.len() * STATION_RECORD_LEN,
        );

        buf.push(num_networks);
        for network in &self.networks {
            network.encode_into(&mut buf);
        }

        buf.push(num_stations);
        for station in &self.stations {
            station.encode_into(&mut buf);
        }

        Ok(buf)
    }
}

/// Bounds-checked cursor over a payload
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], MmeError> {
        let end = self.offset + len;
        let slice = self.data.get(self.offset..end).ok_or(MmeError::Truncated {
            needed: end,
            available: self.data.len(),
        })?;
        self.offset = end;
        Ok(slice)
    }

    fn count(&mut self) -> Result<usize, MmeError> {
        Ok(self.take(1)?[0] as usize)
    }
}

fn read_address(b: &[u8]) -> MacAddress {
    let mut octets = [0u8; 6];
    octets.copy_from_slice(b);
    MacAddress(octets)
}

fn count_byte(kind: &'static str, count: usize) -> Result<u8, MmeError> {
    u8::try_from(count).map_err(|_| MmeError::TooManyRecords { kind, count })
}

fn serialize_hex<S: serde::Serializer>(bytes: &[u8; 7], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}
