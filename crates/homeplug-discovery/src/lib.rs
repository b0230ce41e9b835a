//! HomePlug Discovery - Network info discovery over raw Ethernet
//!
//! This crate provides:
//! - Interface selection for the power-line bridge
//! - A raw link-layer transport for `0x88E1` management frames
//! - Discovery cycles collecting network info confirms until the link goes quiet

pub mod collector;
pub mod interface;
pub mod transport;

pub use collector::{CollectorConfig, DiscoveryCollector, DiscoveryError};
pub use interface::{interface_address, select_interface};
pub use transport::{LinkReceiver, LinkSender, LinkTransport, ReceivedFrame, TransportError};
