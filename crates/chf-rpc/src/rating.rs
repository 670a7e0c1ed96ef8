//! Rating exchange with a remote rating function

use async_trait::async_trait;
use chf_core::config::ExchangeConfig;
use chf_core::models::{ServiceUsageRequest, ServiceUsageResponse};
use chf_core::traits::RatingExchange;
use chf_core::{ChargingError, ChargingResult};
use tracing::instrument;

use crate::client::JsonRpcClient;
use crate::types::SERVICE_USAGE_METHOD;

pub struct RatingClient {
    rpc: JsonRpcClient,
}

impl RatingClient {
    pub fn new(url: &str, timeout_ms: u64) -> ChargingResult<Self> {
        Ok(Self {
            rpc: JsonRpcClient::new(url, timeout_ms)?,
        })
    }

    pub fn from_config(config: &ExchangeConfig) -> ChargingResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| ChargingError::Config("rating.url is not set".to_string()))?;
        Self::new(url, config.timeout_ms)
    }
}

#[async_trait]
impl RatingExchange for RatingClient {
    #[instrument(skip(self, request), fields(
        session_id = %request.session_id,
        rating_group = request.service_rating.service_identifier,
    ))]
    async fn service_usage(
        &self,
        request: &ServiceUsageRequest,
    ) -> ChargingResult<ServiceUsageResponse> {
        Ok(self.rpc.call(SERVICE_USAGE_METHOD, request).await?)
    }
}
