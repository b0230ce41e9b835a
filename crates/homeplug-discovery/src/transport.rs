//! Raw link-layer transport for HomePlug AV management messages

use homeplug_core::{Frame, MacAddress, HOMEPLUG_ETHERTYPE};
use pnet::datalink::{self, Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};
use pnet::packet::ethernet::{EtherType, EthernetPacket, MutableEthernetPacket};
use pnet::packet::Packet;
use pnet::util::MacAddr;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::interface::interface_address;

/// Per-attempt read deadline of the receive loop
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Ethernet header length (destination, source, EtherType)
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Shortest Ethernet frame on the wire, excluding the FCS
pub const MIN_FRAME_LEN: usize = 60;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to send frame: {0}")]
    Send(#[source] io::Error),
    #[error("Failed to open datalink channel on {interface}: {source}")]
    ChannelOpen {
        interface: String,
        #[source]
        source: io::Error,
    },
    #[error("Unsupported datalink channel type on {0}")]
    UnsupportedChannel(String),
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),
    #[error("No usable network interface (up, non-loopback, with hardware address)")]
    NoUsableInterface,
    #[error("Interface {0} has no hardware address")]
    NoHardwareAddress(String),
}

/// Sending half of a raw link-layer socket
pub trait LinkSender: Send {
    /// Transmit one complete Ethernet frame
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()>;
}

/// Receiving half of a raw link-layer socket
pub trait LinkReceiver: Send {
    /// Read one Ethernet frame
    ///
    /// Returns `Ok(None)` when the read deadline passes with no data.
    fn recv_frame(&mut self) -> io::Result<Option<&[u8]>>;
}

struct PnetSender(Box<dyn DataLinkSender>);

impl LinkSender for PnetSender {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.0
            .send_to(frame, None)
            .unwrap_or_else(|| Err(io::Error::other("datalink sender refused frame")))
    }
}

struct PnetReceiver(Box<dyn DataLinkReceiver>);

impl LinkReceiver for PnetReceiver {
    fn recv_frame(&mut self) -> io::Result<Option<&[u8]>> {
        match self.0.next() {
            Ok(frame) => Ok(Some(frame)),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// A decoded MME together with the station that sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFrame {
    pub source: MacAddress,
    pub frame: Frame,
}

/// Raw socket shared between request sends and per-cycle receive tasks
pub struct LinkTransport {
    local_address: MacAddress,
    sender: Arc<Mutex<Box<dyn LinkSender>>>,
    receiver: Arc<Mutex<Box<dyn LinkReceiver>>>,
}

impl LinkTransport {
    /// Open an Ethernet channel on `iface`
    pub fn open(iface: &NetworkInterface) -> Result<Self, TransportError> {
        let local_address = interface_address(iface)?;

        let config = datalink::Config {
            read_timeout: Some(READ_TIMEOUT),
            ..Default::default()
        };

        let (tx, rx) = match datalink::channel(iface, config) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => return Err(TransportError::UnsupportedChannel(iface.name.clone())),
            Err(source) => {
                return Err(TransportError::ChannelOpen {
                    interface: iface.name.clone(),
                    source,
                })
            }
        };

        debug!(interface = %iface.name, address = %local_address, "Opened datalink channel");

        Ok(Self::from_parts(
            local_address,
            Box::new(PnetSender(tx)),
            Box::new(PnetReceiver(rx)),
        ))
    }

    /// Build a transport over arbitrary socket halves
    pub fn from_parts(
        local_address: MacAddress,
        sender: Box<dyn LinkSender>,
        receiver: Box<dyn LinkReceiver>,
    ) -> Self {
        Self {
            local_address,
            sender: Arc::new(Mutex::new(sender)),
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }

    pub fn local_address(&self) -> MacAddress {
        self.local_address
    }

    /// Send one network info request to `destination`
    ///
    /// No retry; the socket error is returned as is.
    pub fn send(&self, destination: MacAddress, payload: &[u8]) -> Result<(), TransportError> {
        let mut frame = Frame::network_info_request();
        frame.payload.extend_from_slice(payload);

        let packet = build_ethernet_frame(destination, self.local_address, &frame.encode());

        trace!(
            destination = %destination,
            mme_type = %frame.mme_type,
            len = packet.len(),
            "Sending MME"
        );

        let mut sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sender.send_frame(&packet).map_err(TransportError::Send)
    }

    /// Start the receive loop on a blocking task
    ///
    /// The loop ends once `stop` is set, `frames` is closed, or the socket
    /// fails with anything other than a read timeout. Both flags are checked
    /// between reads, so a stopped loop exits within one read deadline.
    pub fn spawn_receiver(
        &self,
        frames: mpsc::Sender<ReceivedFrame>,
        stop: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let receiver = self.receiver.clone();
        let local_address = self.local_address;

        tokio::task::spawn_blocking(move || {
            let mut receiver = receiver
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            receive_loop(&mut **receiver, local_address, &frames, &stop);
        })
    }
}

/// Wrap an MME in an Ethernet II header, padded to the minimum frame size
pub fn build_ethernet_frame(
    destination: MacAddress,
    source: MacAddress,
    payload: &[u8],
) -> Vec<u8> {
    let len = (ETHERNET_HEADER_LEN + payload.len()).max(MIN_FRAME_LEN);
    let mut buf = vec![0u8; len];

    // The buffer is always at least ETHERNET_HEADER_LEN long
    if let Some(mut packet) = MutableEthernetPacket::new(&mut buf) {
        packet.set_destination(to_pnet(destination));
        packet.set_source(to_pnet(source));
        packet.set_ethertype(EtherType::new(HOMEPLUG_ETHERTYPE));
    }
    buf[ETHERNET_HEADER_LEN..ETHERNET_HEADER_LEN + payload.len()].copy_from_slice(payload);
    buf
}

fn receive_loop(
    receiver: &mut dyn LinkReceiver,
    local_address: MacAddress,
    frames: &mpsc::Sender<ReceivedFrame>,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Relaxed) && !frames.is_closed() {
        let raw = match receiver.recv_frame() {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(e) => {
                debug!(error = %e, "Failed to receive frame, stopping receive loop");
                break;
            }
        };

        let Some(received) = decode_received(raw, local_address) else {
            continue;
        };

        debug!(
            source = %received.source,
            mme_type = %received.frame.mme_type,
            payload_len = received.frame.payload.len(),
            "Received MME"
        );

        if frames.blocking_send(received).is_err() {
            trace!("Frame consumer closed, stopping receive loop");
            break;
        }
    }
}

/// Decode one raw frame, logging and returning `None` for anything that is
/// not a well-formed HomePlug MME from another station
fn decode_received(raw: &[u8], local_address: MacAddress) -> Option<ReceivedFrame> {
    let Some(packet) = EthernetPacket::new(raw) else {
        warn!(len = raw.len(), "Failed to decode ethernet frame");
        return None;
    };

    if packet.get_ethertype() != EtherType::new(HOMEPLUG_ETHERTYPE) {
        trace!(ethertype = packet.get_ethertype().0, "Ignoring non-HomePlug frame");
        return None;
    }

    let source = from_pnet(packet.get_source());
    if source == local_address {
        trace!("Ignoring our own frame");
        return None;
    }

    match Frame::decode(packet.payload()) {
        Ok(frame) => Some(ReceivedFrame { source, frame }),
        Err(e) => {
            warn!(source = %source, error = %e, "Failed to decode HomePlug frame");
            None
        }
    }
}

fn to_pnet(address: MacAddress) -> MacAddr {
    let o = address.octets();
    MacAddr::new(o[0], o[1], o[2], o[3], o[4], o[5])
}

fn from_pnet(mac: MacAddr) -> MacAddress {
    MacAddress::new([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5])
}
