//! Collaborator traits
//!
//! The engine and the rating responder only see these seams; the RPC
//! clients, the Redis store and the test fakes implement them.

use crate::models::{
    AccountDebitRequest, AccountDebitResponse, ChargingNotifyRequest, ServiceUsageRequest,
    ServiceUsageResponse,
};
use crate::ChargingResult;
use async_trait::async_trait;

/// Credit-control exchange with the account/balance function
#[async_trait]
pub trait AccountDebitExchange: Send + Sync {
    /// Send one credit-control request and wait for its answer
    async fn debit(&self, request: &AccountDebitRequest) -> ChargingResult<AccountDebitResponse>;
}

/// Rating exchange
#[async_trait]
pub trait RatingExchange: Send + Sync {
    async fn service_usage(
        &self,
        request: &ServiceUsageRequest,
    ) -> ChargingResult<ServiceUsageResponse>;
}

/// Tariff store: `(subscriber, rating group) -> unit cost string`
#[async_trait]
pub trait TariffStore: Send + Sync {
    /// Stored unit cost, `None` when no tariff is provisioned
    async fn unit_cost(&self, subscriber: &str, rating_group: u32)
        -> ChargingResult<Option<String>>;

    /// Provision or replace a unit cost
    async fn set_unit_cost(
        &self,
        subscriber: &str,
        rating_group: u32,
        unit_cost: &str,
    ) -> ChargingResult<()>;
}

/// Charging notification delivery (callback to the session management function)
#[async_trait]
pub trait ChargingNotifier: Send + Sync {
    async fn notify(&self, notify_uri: &str, request: &ChargingNotifyRequest)
        -> ChargingResult<()>;
}
