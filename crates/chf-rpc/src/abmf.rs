//! Account debit exchange with the account/balance function

use async_trait::async_trait;
use chf_core::config::ExchangeConfig;
use chf_core::models::{AccountDebitRequest, AccountDebitResponse};
use chf_core::traits::AccountDebitExchange;
use chf_core::{ChargingError, ChargingResult};
use tracing::{debug, instrument, warn};

use crate::client::JsonRpcClient;
use crate::types::ACCOUNT_DEBIT_METHOD;

pub struct AbmfClient {
    rpc: JsonRpcClient,
}

impl AbmfClient {
    pub fn new(url: &str, timeout_ms: u64) -> ChargingResult<Self> {
        Ok(Self {
            rpc: JsonRpcClient::new(url, timeout_ms)?,
        })
    }

    pub fn from_config(config: &ExchangeConfig) -> ChargingResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| ChargingError::Config("abmf.url is not set".to_string()))?;
        Self::new(url, config.timeout_ms)
    }
}

#[async_trait]
impl AccountDebitExchange for AbmfClient {
    #[instrument(skip(self, request), fields(
        session_id = %request.session_id,
        rating_group = request.rating_group(),
        request_type = ?request.cc_request_type,
    ))]
    async fn debit(&self, request: &AccountDebitRequest) -> ChargingResult<AccountDebitResponse> {
        let response: AccountDebitResponse = self.rpc.call(ACCOUNT_DEBIT_METHOD, request).await?;

        if !response.is_success() {
            warn!(result_code = response.result_code, "Account debit rejected");
            return Err(ChargingError::RpcStatus {
                code: response.result_code as i32,
                message: "account debit rejected".to_string(),
            });
        }

        debug!(granted = %response.granted_amount(), "Account debit answered");
        Ok(response)
    }
}
