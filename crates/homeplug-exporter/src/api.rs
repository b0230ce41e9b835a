//! HTTP handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::exposition::render_metrics;
use crate::state::AppState;

/// Content type of the Prometheus text exposition format
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// API error response
#[derive(Serialize)]
struct ApiError {
    error: String,
}

impl ApiError {
    fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// Landing page linking to the metrics endpoint
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let path = state.config.metrics_path();
    Html(format!(
        "<html>\n\
         <head><title>HomePlug Exporter</title></head>\n\
         <body>\n\
         <h1>HomePlug Exporter</h1>\n\
         <p><a href='{path}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n"
    ))
}

/// Run one discovery cycle and render it as Prometheus metrics
///
/// A failed cycle still answers 200 with `homeplug_up 0`.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let result = match state.collector.collect().await {
        Ok(result) => Some(result),
        Err(e) => {
            error!(error = %e, "Error scraping HomePlug devices");
            None
        }
    };

    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        render_metrics(result.as_ref()),
    )
}

/// Run one discovery cycle and return it as JSON
pub async fn netinfo(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.collector.collect().await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            error!(error = %e, "Error scraping HomePlug devices");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiError::new(format!("Discovery failed: {}", e))),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::build_router;
    use axum::body::Body;
    use axum::http::Request;
    use homeplug_core::{
        DiscoveryResult, Frame, MacAddress, MmeType, StationRecord, HOMEPLUG_VENDOR,
    };
    use homeplug_discovery::transport::build_ethernet_frame;
    use homeplug_discovery::{DiscoveryCollector, LinkReceiver, LinkSender, LinkTransport};
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    const LOCAL: MacAddress = MacAddress([0x02, 0, 0, 0, 0, 0x01]);
    const BRIDGE: MacAddress = MacAddress([0x00, 0xb0, 0x52, 0, 0, 0x09]);

    /// Flags a pending request for the bridge, or fails every send
    struct Sender {
        pending: Arc<AtomicBool>,
        fail: bool,
    }

    impl LinkSender for Sender {
        fn send_frame(&mut self, _frame: &[u8]) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "no raw socket"));
            }
            self.pending.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Answers each request with the same confirm
    struct Bridge {
        pending: Arc<AtomicBool>,
        confirm: Vec<u8>,
    }

    impl LinkReceiver for Bridge {
        fn recv_frame(&mut self) -> io::Result<Option<&[u8]>> {
            if self.pending.swap(false, Ordering::SeqCst) {
                return Ok(Some(&self.confirm));
            }
            std::thread::sleep(Duration::from_millis(10));
            Ok(None)
        }
    }

    fn app(fail: bool) -> axum::Router {
        let payload = DiscoveryResult {
            networks: Vec::new(),
            stations: vec![StationRecord {
                address: MacAddress::new([0x00, 0xb0, 0x52, 0, 0, 0x03]),
                terminal_equipment_id: 3,
                bridged_address: MacAddress::new([0x02, 0, 0, 0, 0, 0x03]),
                tx_rate_code: 100,
                rx_rate_code: 50,
            }],
        }
        .encode()
        .unwrap();
        let frame = Frame {
            version: 0,
            mme_type: MmeType::NETWORK_INFO_CONFIRM,
            vendor: HOMEPLUG_VENDOR,
            payload,
        };

        let pending = Arc::new(AtomicBool::new(false));
        let transport = LinkTransport::from_parts(
            LOCAL,
            Box::new(Sender {
                pending: pending.clone(),
                fail,
            }),
            Box::new(Bridge {
                pending,
                confirm: build_ethernet_frame(LOCAL, BRIDGE, &frame.encode()),
            }),
        );

        let mut config = Config::default();
        config.homeplug.idle_timeout_ms = 100;
        let collector = DiscoveryCollector::new(config.to_collector_config(), transport);
        build_router(AppState::with_collector(config, collector))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_index_links_metrics() {
        let (status, body) = get(app(false), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<a href='/metrics'>"));
    }

    #[tokio::test]
    async fn test_metrics_scrape() {
        let (status, body) = get(app(false), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("homeplug_up 1"));
        assert!(body.contains(
            "homeplug_station_tx_rate_bytes{mac_address=\"00:b0:52:00:00:03\",terminal_equipment_identifier=\"3\"} 13107200"
        ));
    }

    #[tokio::test]
    async fn test_metrics_scrape_send_failure() {
        let (status, body) = get(app(true), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("homeplug_up 0"));
    }

    #[tokio::test]
    async fn test_netinfo_json() {
        let (status, body) = get(app(false), "/api/netinfo").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["stations"][0]["address"], "00:b0:52:00:00:03");
        assert_eq!(json["stations"][0]["tx_rate_code"], 100);
        assert_eq!(json["networks"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_netinfo_send_failure() {
        let (status, body) = get(app(true), "/api/netinfo").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("Discovery failed"));
    }
}
