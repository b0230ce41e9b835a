//! Network interface selection

use homeplug_core::MacAddress;
use pnet::datalink::{self, NetworkInterface};
use tracing::debug;

use crate::transport::TransportError;

/// Pick the interface to talk to HomePlug devices through
///
/// With a name, that interface must exist. Without one, the first interface
/// that is up, is not loopback and has a hardware address wins.
pub fn select_interface(name: Option<&str>) -> Result<NetworkInterface, TransportError> {
    pick_interface(datalink::interfaces(), name)
}

fn pick_interface(
    interfaces: Vec<NetworkInterface>,
    name: Option<&str>,
) -> Result<NetworkInterface, TransportError> {
    match name {
        Some(name) => interfaces
            .into_iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| TransportError::InterfaceNotFound(name.to_string())),
        None => {
            let iface = interfaces
                .into_iter()
                .find(|iface| iface.is_up() && !iface.is_loopback() && iface.mac.is_some())
                .ok_or(TransportError::NoUsableInterface)?;
            debug!(interface = %iface.name, "Selected default interface");
            Ok(iface)
        }
    }
}

/// Hardware address of an interface
pub fn interface_address(iface: &NetworkInterface) -> Result<MacAddress, TransportError> {
    let mac = iface
        .mac
        .ok_or_else(|| TransportError::NoHardwareAddress(iface.name.clone()))?;
    Ok(MacAddress::new([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::util::MacAddr;

    // IFF_UP | IFF_RUNNING and IFF_LOOPBACK as reported by Linux
    const FLAGS_UP: u32 = 0x1 | 0x40;
    const FLAG_LOOPBACK: u32 = 0x8;

    fn iface(name: &str, index: u32, flags: u32, mac: Option<MacAddr>) -> NetworkInterface {
        NetworkInterface {
            name: name.to_string(),
            description: String::new(),
            index,
            mac,
            ips: Vec::new(),
            flags,
        }
    }

    fn sample() -> Vec<NetworkInterface> {
        vec![
            iface("lo", 1, FLAGS_UP | FLAG_LOOPBACK, Some(MacAddr::zero())),
            iface("eth0", 2, 0, Some(MacAddr::new(0x02, 0, 0, 0, 0, 0x02))),
            iface("eth1", 3, FLAGS_UP, Some(MacAddr::new(0x02, 0, 0, 0, 0, 0x03))),
        ]
    }

    #[test]
    fn test_pick_named_interface() {
        let picked = pick_interface(sample(), Some("eth0")).unwrap();
        assert_eq!(picked.index, 2);
    }

    #[test]
    fn test_pick_missing_interface() {
        assert!(matches!(
            pick_interface(sample(), Some("wlan9")),
            Err(TransportError::InterfaceNotFound(name)) if name == "wlan9"
        ));
    }

    #[test]
    fn test_default_skips_down_and_loopback() {
        let picked = pick_interface(sample(), None).unwrap();
        assert_eq!(picked.name, "eth1");
        assert_eq!(
            interface_address(&picked).unwrap().to_string(),
            "02:00:00:00:00:03"
        );
    }

    #[test]
    fn test_default_without_candidates() {
        let only_lo = vec![iface("lo", 1, FLAGS_UP | FLAG_LOOPBACK, None)];
        assert!(matches!(
            pick_interface(only_lo, None),
            Err(TransportError::NoUsableInterface)
        ));
    }
}
