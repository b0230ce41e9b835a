//! Prometheus exposition of a discovery cycle

use homeplug_core::DiscoveryResult;
use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Render one scrape
///
/// `None` means the cycle failed; only `homeplug_up` and build info are
/// reported then. A fresh recorder per scrape keeps stations that stopped
/// answering from lingering.
pub fn render_metrics(result: Option<&DiscoveryResult>) -> String {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        describe_gauge!("homeplug_up", "Whether the last discovery cycle succeeded");
        describe_gauge!(
            "homeplug_exporter_build_info",
            "Build information of the HomePlug exporter"
        );
        describe_gauge!("homeplug_network_id", "Logical network information");
        describe_gauge!("homeplug_station_tx_rate_bytes", "Average PHY Tx data rate");
        describe_gauge!("homeplug_station_rx_rate_bytes", "Average PHY Rx data rate");

        gauge!("homeplug_exporter_build_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
        gauge!("homeplug_up").set(if result.is_some() { 1.0 } else { 0.0 });

        if let Some(result) = result {
            record(result);
        }
    });

    handle.render()
}

fn record(result: &DiscoveryResult) {
    for network in &result.networks {
        gauge!(
            "homeplug_network_id",
            "network_identifier" => network.network_id_hex(),
            "terminal_equipment_identifier" => network.terminal_equipment_id.to_string(),
            "coordinator_mac_address" => network.coordinator_address.to_string()
        )
        .set(f64::from(network.short_id));
    }

    for station in &result.stations {
        let mac = station.address.to_string();
        let tei = station.terminal_equipment_id.to_string();

        gauge!(
            "homeplug_station_tx_rate_bytes",
            "mac_address" => mac.clone(),
            "terminal_equipment_identifier" => tei.clone()
        )
        .set(station.tx_rate_bytes() as f64);
        gauge!(
            "homeplug_station_rx_rate_bytes",
            "mac_address" => mac,
            "terminal_equipment_identifier" => tei
        )
        .set(station.rx_rate_bytes() as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeplug_core::{MacAddress, NetworkRecord, StationRecord};

    fn sample() -> DiscoveryResult {
        DiscoveryResult {
            networks: vec![NetworkRecord {
                network_id: [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07],
                short_id: 1,
                terminal_equipment_id: 2,
                role: 0,
                coordinator_address: MacAddress::new([0x00, 0xb0, 0x52, 0x00, 0x00, 0x10]),
                coordinator_terminal_equipment_id: 1,
            }],
            stations: vec![StationRecord {
                address: MacAddress::new([0x00, 0xb0, 0x52, 0x00, 0x00, 0x03]),
                terminal_equipment_id: 3,
                bridged_address: MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x03]),
                tx_rate_code: 100,
                rx_rate_code: 50,
            }],
        }
    }

    #[test]
    fn test_render_successful_cycle() {
        let text = render_metrics(Some(&sample()));

        assert!(text.contains("homeplug_up 1"));
        let network = text
            .lines()
            .find(|line| line.starts_with("homeplug_network_id{"))
            .expect("network line");
        assert!(network.contains("network_identifier=\"01020304050607\""));
        assert!(network.contains("terminal_equipment_identifier=\"2\""));
        assert!(network.contains("coordinator_mac_address=\"00:b0:52:00:00:10\""));
        assert!(network.contains("} 1"));
        assert!(text.contains(
            "homeplug_station_tx_rate_bytes{mac_address=\"00:b0:52:00:00:03\",terminal_equipment_identifier=\"3\"} 13107200"
        ));
        assert!(text.contains(
            "homeplug_station_rx_rate_bytes{mac_address=\"00:b0:52:00:00:03\",terminal_equipment_identifier=\"3\"} 6553600"
        ));
        assert!(text.contains("# HELP homeplug_station_tx_rate_bytes Average PHY Tx data rate"));
    }

    #[test]
    fn test_render_failed_cycle() {
        let text = render_metrics(None);
        assert!(text.contains("homeplug_up 0"));
        assert!(text.contains("homeplug_exporter_build_info"));
        assert!(!text.contains("homeplug_station_tx_rate_bytes{"));
    }

    #[test]
    fn test_scrapes_do_not_share_state() {
        let _ = render_metrics(Some(&sample()));
        let text = render_metrics(Some(&DiscoveryResult::default()));
        assert!(!text.contains("00:b0:52:00:00:03"));
    }
}
