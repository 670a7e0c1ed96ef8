//! Charging notification callbacks

use async_trait::async_trait;
use chf_core::models::ChargingNotifyRequest;
use chf_core::traits::ChargingNotifier;
use chf_core::{ChargingError, ChargingResult};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// POSTs charging notifications to the consumer's notify URI
pub struct NotificationClient {
    http_client: Client,
    timeout_ms: u64,
}

impl NotificationClient {
    pub fn new(timeout_ms: u64) -> ChargingResult<Self> {
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ChargingError::Rpc(e.to_string()))?;

        Ok(Self {
            http_client,
            timeout_ms,
        })
    }
}

#[async_trait]
impl ChargingNotifier for NotificationClient {
    #[instrument(skip(self, request))]
    async fn notify(&self, notify_uri: &str, request: &ChargingNotifyRequest) -> ChargingResult<()> {
        let response = self
            .http_client
            .post(notify_uri)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChargingError::Timeout(self.timeout_ms)
                } else {
                    ChargingError::Rpc(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => {
                debug!("Charging notification delivered");
                Ok(())
            }
            status => {
                error!(status = %status, "Charging notification rejected");
                Err(ChargingError::RpcStatus {
                    code: i32::from(status.as_u16()),
                    message: format!("notification rejected by {}", notify_uri),
                })
            }
        }
    }
}
