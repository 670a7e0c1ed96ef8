//! Credit-control exchange with the account/balance function
//!
//! One request per rating group: either a direct debit of a monetary amount
//! (reservation or final shortfall) or a refund of surplus reserved funds.

use super::charging_data::{FinalUnitAction, FinalUnitIndication};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Result code of a successful credit-control answer
pub const RESULT_CODE_SUCCESS: u32 = 2001;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionIdType {
    EndUserE164,
    EndUserImsi,
    EndUserSipUri,
    EndUserNai,
    EndUserPrivate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionId {
    pub subscription_id_type: SubscriptionIdType,
    pub subscription_id_data: String,
}

impl SubscriptionId {
    pub fn imsi(data: impl Into<String>) -> Self {
        Self {
            subscription_id_type: SubscriptionIdType::EndUserImsi,
            subscription_id_data: data.into(),
        }
    }

    /// Build a subscription id from a SUPI such as `imsi-208930000000001`
    ///
    /// `imsi-` maps to an IMSI identity; `nai-`, `gci-` and `gli-` map to a
    /// NAI identity. Anything else is not representable.
    pub fn from_supi(supi: &str) -> Option<Self> {
        if let Some(imsi) = supi.strip_prefix("imsi-") {
            return Some(Self::imsi(imsi));
        }

        for prefix in ["nai-", "gci-", "gli-"] {
            if let Some(data) = supi.strip_prefix(prefix) {
                return Some(Self {
                    subscription_id_type: SubscriptionIdType::EndUserNai,
                    subscription_id_data: data.to_string(),
                });
            }
        }

        warn!(supi = %supi, "Unsupported SUPI format, no subscription id");
        None
    }

    /// Canonical subscriber key used by the tariff store
    ///
    /// Only IMSI identities are converted.
    pub fn subscriber_key(&self) -> Option<String> {
        match self.subscription_id_type {
            SubscriptionIdType::EndUserImsi => Some(format!("imsi-{}", self.subscription_id_data)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CcRequestType {
    InitialRequest,
    UpdateRequest,
    TerminationRequest,
    EventRequest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestedAction {
    DirectDebiting,
    RefundAccount,
    CheckBalance,
    PriceEnquiry,
}

/// Monetary service unit
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUnit {
    pub cc_money: Decimal,
}

impl ServiceUnit {
    pub fn money(amount: Decimal) -> Self {
        Self { cc_money: amount }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MultipleServicesCreditControl {
    pub rating_group: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_service_unit: Option<ServiceUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_service_unit: Option<ServiceUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_service_unit: Option<ServiceUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_unit_indication: Option<FinalUnitIndication>,
}

/// Credit-control request sent to the account/balance function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountDebitRequest {
    pub session_id: String,
    pub origin_host: String,
    pub origin_realm: String,
    pub user_name: String,
    pub subscription_id: Option<SubscriptionId>,
    pub cc_request_type: CcRequestType,
    pub cc_request_number: u32,
    pub requested_action: RequestedAction,
    pub event_timestamp: DateTime<Utc>,
    pub multiple_services_credit_control: MultipleServicesCreditControl,
}

impl AccountDebitRequest {
    pub fn rating_group(&self) -> u32 {
        self.multiple_services_credit_control.rating_group
    }

    /// Requested or used monetary amount carried by the request
    pub fn amount(&self) -> Decimal {
        let mscc = &self.multiple_services_credit_control;
        mscc.requested_service_unit
            .or(mscc.used_service_unit)
            .map(|unit| unit.cc_money)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountDebitResponse {
    pub session_id: String,
    pub result_code: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_services_credit_control: Option<MultipleServicesCreditControl>,
}

impl AccountDebitResponse {
    pub fn is_success(&self) -> bool {
        self.result_code == RESULT_CODE_SUCCESS
    }

    /// Granted monetary amount, zero when absent
    pub fn granted_amount(&self) -> Decimal {
        self.multiple_services_credit_control
            .as_ref()
            .and_then(|mscc| mscc.granted_service_unit)
            .map(|unit| unit.cc_money)
            .unwrap_or_default()
    }

    pub fn final_unit_action(&self) -> Option<FinalUnitAction> {
        self.multiple_services_credit_control
            .as_ref()
            .and_then(|mscc| mscc.final_unit_indication.as_ref())
            .map(|fui| fui.final_unit_action)
    }
}
