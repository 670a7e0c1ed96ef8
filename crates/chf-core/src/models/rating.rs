//! Rating exchange models
//!
//! A service-usage request asks the rating function to convert a monetary
//! quota into allowed units (RESERVE) or to price consumed units (DEBIT).

use super::credit_control::SubscriptionId;
use super::monetary::UnitValue;
use crate::ChargingResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISO 4217 numeric code used for every tariff
pub const TARIFF_CURRENCY_CODE: u32 = 901;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestSubType {
    Reserve,
    Debit,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CcUnitType {
    Time,
    Money,
    TotalOctets,
    InputOctets,
    OutputOctets,
    ServiceSpecificUnits,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateElement {
    pub cc_unit_type: CcUnitType,
    pub unit_cost: UnitValue,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonetaryTariff {
    pub currency_code: u32,
    pub scale_factor: UnitValue,
    pub rate_element: RateElement,
}

impl MonetaryTariff {
    /// Money tariff with the given unit cost
    pub fn money(unit_cost: UnitValue) -> Self {
        Self {
            currency_code: TARIFF_CURRENCY_CODE,
            scale_factor: UnitValue::default(),
            rate_element: RateElement {
                cc_unit_type: CcUnitType::Money,
                unit_cost,
            },
        }
    }

    pub fn unit_cost(&self) -> ChargingResult<Decimal> {
        self.rate_element.unit_cost.to_decimal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRating {
    /// Rating group being priced
    pub service_identifier: u32,
    pub request_sub_type: RequestSubType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monetary_quota: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumed_units: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUsageRequest {
    pub session_id: String,
    pub origin_host: String,
    pub origin_realm: String,
    pub subscription_id: SubscriptionId,
    pub service_rating: ServiceRating,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRatingResult {
    pub service_identifier: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monetary_tariff: Option<MonetaryTariff>,
    #[serde(default)]
    pub allowed_units: u64,
    #[serde(default)]
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUsageResponse {
    pub session_id: String,
    pub service_rating: ServiceRatingResult,
}
