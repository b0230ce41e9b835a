//! Discovery cycles: one request out, confirms collected until the link goes quiet

use homeplug_core::{DiscoveryResult, MacAddress, MmeType};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::transport::{LinkTransport, ReceivedFrame, TransportError};

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to send network info request: {0}")]
    Send(#[from] TransportError),
}

/// Collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Where the network info request is sent
    pub destination: MacAddress,
    /// Quiet period that ends collection, restarted by every received frame
    pub idle_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            destination: MacAddress::HOMEPLUG_LOCAL,
            idle_timeout_ms: 1000,
        }
    }
}

impl CollectorConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Runs discovery cycles over a [`LinkTransport`], one at a time
pub struct DiscoveryCollector {
    config: CollectorConfig,
    transport: LinkTransport,
    /// Cycle lock, holding the receive task of the last cycle
    ///
    /// That task has been told to stop but may still be inside one read
    /// deadline. It is joined before the next request goes out.
    cycle: Mutex<Option<JoinHandle<()>>>,
}

/// Sets the stop flag when a cycle ends, however it ends
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl DiscoveryCollector {
    pub fn new(config: CollectorConfig, transport: LinkTransport) -> Self {
        Self {
            config,
            transport,
            cycle: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn local_address(&self) -> MacAddress {
        self.transport.local_address()
    }

    /// Run one discovery cycle
    ///
    /// Concurrent callers wait for the cycle in progress to finish. Only a
    /// failed request send is an error; undecodable or unexpected frames are
    /// logged and dropped. Dropping the returned future stops the cycle's
    /// receive task.
    pub async fn collect(&self) -> Result<DiscoveryResult, DiscoveryError> {
        let mut receive_task = self.cycle.lock().await;
        join_receiver(&mut receive_task).await;
        let started = Instant::now();

        let (frames_tx, mut frames) = mpsc::channel(1);
        let stop = Arc::new(AtomicBool::new(false));
        *receive_task = Some(self.transport.spawn_receiver(frames_tx, stop.clone()));
        let _stop = StopOnDrop(stop);

        debug!(destination = %self.config.destination, "Starting discovery cycle");

        self.transport.send(self.config.destination, &[])?;

        let idle_timeout = self.config.idle_timeout();
        let mut result = DiscoveryResult::default();
        let mut confirms = 0usize;

        loop {
            match timeout(idle_timeout, frames.recv()).await {
                Ok(Some(received)) => {
                    if absorb(received, &mut result) {
                        confirms += 1;
                    }
                }
                // Receive loop ended on a read error; everything queued has been drained
                Ok(None) => break,
                Err(_) => break,
            }
        }

        info!(
            confirms,
            networks = result.networks.len(),
            stations = result.stations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Discovery cycle complete"
        );

        Ok(result)
    }

    /// Wait for the last cycle's receive task to exit
    pub async fn shutdown(&self) {
        let mut receive_task = self.cycle.lock().await;
        join_receiver(&mut receive_task).await;
        debug!("Discovery collector stopped");
    }
}

async fn join_receiver(task: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = task.as_mut() {
        if let Err(e) = handle.await {
            warn!(error = %e, "Receive task failed");
        }
        *task = None;
    }
}

/// Fold one received frame into the cycle result, returning whether it was a
/// usable network info confirm
fn absorb(received: ReceivedFrame, result: &mut DiscoveryResult) -> bool {
    let ReceivedFrame { source, frame } = received;

    if frame.mme_type != MmeType::NETWORK_INFO_CONFIRM {
        warn!(source = %source, mme_type = %frame.mme_type, "Unhandled MME type");
        return false;
    }

    match DiscoveryResult::decode(&frame.payload) {
        Ok(info) => {
            debug!(
                source = %source,
                networks = info.networks.len(),
                stations = info.stations.len(),
                "Network info confirm"
            );
            result.merge(info);
            true
        }
        Err(e) => {
            warn!(source = %source, error = %e, "Failed to decode network info confirm");
            false
        }
    }
}
