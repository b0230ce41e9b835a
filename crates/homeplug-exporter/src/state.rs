//! Application state management

use anyhow::Result;
use homeplug_discovery::{select_interface, DiscoveryCollector, LinkTransport};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Shared application state
pub struct AppState {
    /// Discovery collector bound to the selected interface
    pub collector: DiscoveryCollector,
    /// Configuration
    pub config: Config,
}

impl AppState {
    /// Open the configured interface and create application state
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let iface = select_interface(config.homeplug.interface.as_deref())?;
        let transport = LinkTransport::open(&iface)?;
        let collector = DiscoveryCollector::new(config.to_collector_config(), transport);

        info!(
            destination = %collector.config().destination,
            idle_timeout_ms = collector.config().idle_timeout_ms,
            interface = %iface.name,
            address = %collector.local_address(),
            "Collecting from HomePlug devices"
        );

        Ok(Self::with_collector(config, collector))
    }

    /// Create application state around an existing collector
    pub fn with_collector(config: Config, collector: DiscoveryCollector) -> Arc<Self> {
        Arc::new(Self { collector, config })
    }
}
