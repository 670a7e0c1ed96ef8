//! Rating responder
//!
//! Prices a service-usage request against the unit cost stored for the
//! subscriber's rating group. RESERVE converts a monetary quota into allowed
//! units; DEBIT prices consumed units. All arithmetic is exact decimal.

use async_trait::async_trait;
use chf_core::models::{
    MonetaryTariff, RequestSubType, ServiceRatingResult, ServiceUsageRequest, ServiceUsageResponse,
    UnitValue,
};
use chf_core::traits::{RatingExchange, TariffStore};
use chf_core::{ChargingError, ChargingResult};
use parking_lot::RwLock;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Answers service-usage requests from a tariff store
pub struct RatingResponder {
    tariffs: Arc<dyn TariffStore>,
}

impl RatingResponder {
    pub fn new(tariffs: Arc<dyn TariffStore>) -> Self {
        Self { tariffs }
    }

    /// Price one service-usage request
    ///
    /// # Errors
    ///
    /// - `SubscriberNotFound` when the subscription id is not an IMSI
    /// - `TariffNotFound` when no unit cost is provisioned
    /// - `InvalidTariff` when the stored unit cost is malformed
    /// - `ZeroTariff` when a reservation is priced against a zero tariff
    #[instrument(skip(self, request), fields(
        session_id = %request.session_id,
        rating_group = request.service_rating.service_identifier,
        sub_type = ?request.service_rating.request_sub_type,
    ))]
    pub async fn rate(&self, request: &ServiceUsageRequest) -> ChargingResult<ServiceUsageResponse> {
        let rating = &request.service_rating;
        let rating_group = rating.service_identifier;

        let subscriber = request.subscription_id.subscriber_key().ok_or_else(|| {
            warn!(
                id_type = ?request.subscription_id.subscription_id_type,
                "Unsupported subscription id type"
            );
            ChargingError::SubscriberNotFound(request.subscription_id.subscription_id_data.clone())
        })?;

        let raw = self
            .tariffs
            .unit_cost(&subscriber, rating_group)
            .await?
            .ok_or_else(|| ChargingError::TariffNotFound {
                subscriber: subscriber.clone(),
                rating_group,
            })?;

        let unit_value = UnitValue::parse(&raw)?;
        let unit_cost = unit_value.to_decimal()?;
        debug!(unit_cost = %unit_cost, "Tariff resolved");

        let (allowed_units, price) = match rating.request_sub_type {
            RequestSubType::Debit => {
                let consumed = rating.consumed_units.unwrap_or(0);
                let price = Decimal::from(consumed)
                    .checked_mul(unit_cost)
                    .ok_or_else(|| ChargingError::InvalidTariff("price overflow".to_string()))?;
                (0, price)
            }
            RequestSubType::Reserve => {
                if unit_cost.is_zero() {
                    warn!("Zero tariff, cannot convert monetary quota into units");
                    return Err(ChargingError::ZeroTariff(rating_group));
                }
                let quota = rating.monetary_quota.unwrap_or_default().max(Decimal::ZERO);
                let allowed = quota
                    .checked_div(unit_cost)
                    .map(|units| units.trunc())
                    .and_then(|units| units.to_u64())
                    .ok_or_else(|| {
                        ChargingError::InvalidInput(format!("monetary quota {} out of range", quota))
                    })?;
                (allowed, Decimal::from(allowed) * unit_cost)
            }
            RequestSubType::Unknown => {
                warn!("Unrecognized request sub-type, answering with zero units");
                (0, Decimal::ZERO)
            }
        };

        debug!(allowed_units, price = %price, "Service usage rated");

        Ok(ServiceUsageResponse {
            session_id: request.session_id.clone(),
            service_rating: ServiceRatingResult {
                service_identifier: rating_group,
                monetary_tariff: Some(MonetaryTariff::money(unit_value)),
                allowed_units,
                price,
            },
        })
    }
}

#[async_trait]
impl RatingExchange for RatingResponder {
    async fn service_usage(
        &self,
        request: &ServiceUsageRequest,
    ) -> ChargingResult<ServiceUsageResponse> {
        self.rate(request).await
    }
}

/// Tariff store kept in process memory
#[derive(Default)]
pub struct InMemoryTariffStore {
    tariffs: RwLock<HashMap<(String, u32), String>>,
}

impl InMemoryTariffStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `(subscriber, rating group, unit cost)` entries
    pub fn with_tariffs<'a>(entries: impl IntoIterator<Item = (&'a str, u32, &'a str)>) -> Self {
        let tariffs = entries
            .into_iter()
            .map(|(subscriber, rating_group, cost)| {
                ((subscriber.to_string(), rating_group), cost.to_string())
            })
            .collect();
        Self {
            tariffs: RwLock::new(tariffs),
        }
    }
}

#[async_trait]
impl TariffStore for InMemoryTariffStore {
    async fn unit_cost(&self, subscriber: &str, rating_group: u32) -> ChargingResult<Option<String>> {
        Ok(self
            .tariffs
            .read()
            .get(&(subscriber.to_string(), rating_group))
            .cloned())
    }

    async fn set_unit_cost(
        &self,
        subscriber: &str,
        rating_group: u32,
        unit_cost: &str,
    ) -> ChargingResult<()> {
        self.tariffs
            .write()
            .insert((subscriber.to_string(), rating_group), unit_cost.to_string());
        Ok(())
    }
}
