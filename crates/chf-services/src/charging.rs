//! Reservation/debit decision engine
//!
//! Converts a usage report into credit-control decisions, one rating group
//! at a time:
//!
//! - RESERVE groups deduct the reported usage from the reserved amount,
//!   request more money from the account function, then ask the rating
//!   function how many units the reservation buys.
//! - DEBIT groups are priced one last time and the difference with the
//!   reservation is refunded or debited.
//!
//! The caller holds the subscriber lock for the whole call. A failed exchange
//! only skips its own rating group.

use chf_core::models::{
    AccountDebitRequest, CcRequestType, ChargingDataRequest, FinalUnitAction, FinalUnitIndication,
    GrantedUnit, MultipleServicesCreditControl, MultipleUnitInformation, MultipleUnitUsage,
    QuotaManagementIndicator, RequestSubType, RequestedAction, ServiceRating, ServiceUnit,
    ServiceUsageRequest, SubscriptionId, Trigger, TriggerCategory,
};
use chf_core::traits::{AccountDebitExchange, RatingExchange};
use chf_core::{ChargingError, ChargingResult};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use crate::constants::FIRST_RESERVATION_MULTIPLIER;
use crate::subscriber::{ChargingState, RatingType};

/// Origin-Host / Origin-Realm pair of one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginIdentity {
    pub origin_host: String,
    pub origin_realm: String,
}

impl OriginIdentity {
    pub fn new(origin_host: impl Into<String>, origin_realm: impl Into<String>) -> Self {
        Self {
            origin_host: origin_host.into(),
            origin_realm: origin_realm.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// NF name, sent as User-Name
    pub nf_name: String,
    pub abmf: OriginIdentity,
    pub rating: OriginIdentity,
    pub first_reservation_multiplier: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            nf_name: "CHF".to_string(),
            abmf: OriginIdentity::new("chf", "chf.localdomain"),
            rating: OriginIdentity::new("chf", "chf.localdomain"),
            first_reservation_multiplier: FIRST_RESERVATION_MULTIPLIER,
        }
    }
}

/// Result of processing one usage report
#[derive(Debug, Clone, Default)]
pub struct EngineOutcome {
    /// One entry per rating group that completed credit control
    pub unit_information: Vec<MultipleUnitInformation>,
    /// The open charging record must be closed and reopened
    pub partial_record: bool,
    /// ONLINE rating groups whose credit control failed
    pub failed_groups: Vec<u32>,
}

impl EngineOutcome {
    /// Online usage was reported but no rating group completed
    pub fn nothing_processed(&self) -> bool {
        self.unit_information.is_empty() && !self.failed_groups.is_empty()
    }
}

/// Online usage of one rating group
#[derive(Debug, Default)]
struct OnlineUsage {
    total_used: u64,
    partial_record: bool,
    final_trigger: bool,
}

/// What the branches need to know about the entry being processed
struct GroupUsage<'a> {
    rating_group: u32,
    upf_id: Option<&'a str>,
    requested_volume: u64,
    total_used: u64,
}

/// Sum the ONLINE containers of an entry and inspect their triggers
///
/// Returns `None` when no container is ONLINE.
fn classify_usage(report_triggers: &[Trigger], usage: &MultipleUnitUsage) -> Option<OnlineUsage> {
    let mut online: Option<OnlineUsage> = None;

    for container in &usage.used_unit_container {
        match container.quota_management_indicator {
            QuotaManagementIndicator::OfflineCharging => continue,
            QuotaManagementIndicator::QuotaManagementSuspended => {
                warn!(
                    rating_group = usage.rating_group,
                    "Quota management suspended is not supported, container skipped"
                );
            }
            QuotaManagementIndicator::OnlineCharging => {
                let entry = online.get_or_insert_with(OnlineUsage::default);
                for trigger in report_triggers.iter().chain(&container.triggers) {
                    if trigger.forces_partial_record() {
                        entry.partial_record = true;
                    }
                    if trigger.is_final() {
                        entry.final_trigger = true;
                    }
                }
                entry.total_used = entry.total_used.saturating_add(container.total_volume);
            }
        }
    }

    online
}

fn overflow(what: &str) -> ChargingError {
    ChargingError::InvalidInput(format!("{} out of range", what))
}

pub struct ChargingEngine {
    account: Arc<dyn AccountDebitExchange>,
    rating: Arc<dyn RatingExchange>,
    settings: EngineSettings,
}

impl ChargingEngine {
    pub fn new(
        account: Arc<dyn AccountDebitExchange>,
        rating: Arc<dyn RatingExchange>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            account,
            rating,
            settings,
        }
    }

    /// Process every rating group of a usage report
    ///
    /// `state` must come from the subscriber's lock guard.
    #[instrument(skip(self, state, subscriber_id, request), fields(
        subscriber = %subscriber_id,
        entries = request.multiple_unit_usage.len(),
    ))]
    pub async fn process(
        &self,
        state: &mut ChargingState,
        subscriber_id: &str,
        request: &ChargingDataRequest,
    ) -> EngineOutcome {
        let subscription_id = SubscriptionId::from_supi(subscriber_id);
        let mut outcome = EngineOutcome::default();
        let mut pdu_limit_pending = true;

        for usage in &request.multiple_unit_usage {
            let rating_group = usage.rating_group;
            state.register_rating_group(rating_group);

            let Some(online) = classify_usage(&request.triggers, usage) else {
                debug!(rating_group, "No online container, credit control skipped");
                continue;
            };

            if online.partial_record {
                outcome.partial_record = true;
            }
            if online.final_trigger {
                state.register_rating_group(rating_group).rating_type = RatingType::Debit;
            }

            let group = GroupUsage {
                rating_group,
                upf_id: usage.upf_id.as_deref(),
                requested_volume: usage.requested_volume(),
                total_used: online.total_used,
            };

            let rating_type = state.register_rating_group(rating_group).rating_type;
            let result = match rating_type {
                RatingType::Reserve => {
                    self.reserve(state, subscription_id.as_ref(), &group, &mut pdu_limit_pending)
                        .await
                }
                RatingType::Debit => self.debit(state, subscription_id.as_ref(), &group).await,
            };

            match result {
                Ok(information) => {
                    let entry = state.register_rating_group(rating_group);
                    entry.acct_request_num = entry.acct_request_num.wrapping_add(1);
                    outcome.unit_information.push(information);
                }
                Err(e) => {
                    error!(rating_group, error = %e, "Credit control failed, rating group skipped");
                    outcome.failed_groups.push(rating_group);
                }
            }
        }

        outcome
    }

    /// Quota reservation for a group in RESERVE mode
    async fn reserve(
        &self,
        state: &mut ChargingState,
        subscription_id: Option<&SubscriptionId>,
        usage: &GroupUsage<'_>,
        pdu_limit_pending: &mut bool,
    ) -> ChargingResult<MultipleUnitInformation> {
        let rating_group = usage.rating_group;
        let current = state.register_rating_group(rating_group).clone();
        let requested_volume = Decimal::from(usage.requested_volume);

        let (reserved_after_usage, requested) = if current.reserved_quota.is_zero() {
            let multiplier = Decimal::from(self.settings.first_reservation_multiplier);
            let requested = requested_volume
                .checked_mul(multiplier)
                .ok_or_else(|| overflow("requested amount"))?;
            (current.reserved_quota, requested)
        } else {
            let used_quota = Decimal::from(usage.total_used)
                .checked_mul(current.unit_cost)
                .ok_or_else(|| overflow("used amount"))?;
            let insufficient = used_quota
                .checked_sub(current.reserved_quota)
                .ok_or_else(|| overflow("insufficient amount"))?;
            let requested = requested_volume
                .checked_mul(current.unit_cost)
                .and_then(|amount| amount.checked_add(insufficient))
                .ok_or_else(|| overflow("requested amount"))?;
            debug!(
                rating_group,
                used_quota = %used_quota,
                insufficient = %insufficient,
                "Usage deducted from reservation"
            );
            let remaining = current
                .reserved_quota
                .checked_sub(used_quota)
                .ok_or_else(|| overflow("reserved amount"))?;
            (remaining, requested)
        };

        // A surplus reservation never turns into a negative request
        let requested = requested.max(Decimal::ZERO);

        let request = self.account_request(
            state,
            subscription_id,
            CcRequestType::UpdateRequest,
            RequestedAction::DirectDebiting,
            MultipleServicesCreditControl {
                rating_group,
                requested_service_unit: Some(ServiceUnit::money(requested)),
                ..Default::default()
            },
        );
        let answer = self.account.debit(&request).await?;
        let granted = answer.granted_amount();
        debug!(rating_group, requested = %requested, granted = %granted, "Reservation granted");

        let mut information = MultipleUnitInformation {
            rating_group,
            upf_id: usage.upf_id.map(str::to_string),
            ..Default::default()
        };

        let reserved_quota = reserved_after_usage
            .checked_add(granted)
            .ok_or_else(|| overflow("reserved amount"))?;

        {
            let group = state.register_rating_group(rating_group);
            group.reserved_quota = reserved_quota;

            match answer.final_unit_action() {
                Some(FinalUnitAction::Terminate) => {
                    warn!(rating_group, "Last granted quota");
                    information.final_unit_indication = Some(FinalUnitIndication {
                        final_unit_action: FinalUnitAction::Terminate,
                    });
                    group.rating_type = RatingType::Debit;
                }
                Some(action) => debug!(rating_group, ?action, "Final unit action ignored"),
                None => {}
            }
        }

        let rating_request = self.rating_request(
            state,
            subscription_id,
            ServiceRating {
                service_identifier: rating_group,
                request_sub_type: RequestSubType::Reserve,
                monetary_quota: Some(reserved_quota.max(Decimal::ZERO)),
                consumed_units: None,
            },
        )?;
        let rated = self.rating.service_usage(&rating_request).await?;

        let tariff = rated.service_rating.monetary_tariff.ok_or_else(|| {
            ChargingError::InvalidTariff("rating answer carries no tariff".to_string())
        })?;
        let unit_cost = tariff.unit_cost()?;
        if unit_cost.is_sign_negative() {
            return Err(ChargingError::InvalidTariff(format!(
                "negative unit cost {}",
                unit_cost
            )));
        }
        let granted_unit = rated.service_rating.allowed_units;
        debug!(rating_group, unit_cost = %unit_cost, granted_unit, "Tariff refreshed");

        let policy = state.policy.clone();
        let group = state.register_rating_group(rating_group);
        group.unit_cost = unit_cost;

        if group.rating_type == RatingType::Reserve {
            information.volume_quota_threshold = Decimal::from(granted_unit)
                .checked_mul(policy.volume_threshold_rate)
                .and_then(|threshold| threshold.trunc().to_u64())
                .unwrap_or(0);
        }

        information.granted_unit = Some(GrantedUnit::symmetric(granted_unit));

        if policy.volume_limit != 0 {
            information.triggers.push(Trigger::volume_limit(
                TriggerCategory::DeferredReport,
                policy.volume_limit,
            ));
        }

        // Session-wide limit, attached once per report
        if policy.volume_limit_pdu != 0 && *pdu_limit_pending {
            information.triggers.push(Trigger::volume_limit(
                TriggerCategory::ImmediateReport,
                policy.volume_limit_pdu,
            ));
            *pdu_limit_pending = false;
        }

        if policy.quota_validity_time != 0 {
            information.validity_time = Some(policy.quota_validity_time);
        }

        Ok(information)
    }

    /// Final accounting for a group in DEBIT mode
    async fn debit(
        &self,
        state: &mut ChargingState,
        subscription_id: Option<&SubscriptionId>,
        usage: &GroupUsage<'_>,
    ) -> ChargingResult<MultipleUnitInformation> {
        let rating_group = usage.rating_group;
        warn!(rating_group, "Debit mode, no further units granted");

        let rating_request = self.rating_request(
            state,
            subscription_id,
            ServiceRating {
                service_identifier: rating_group,
                request_sub_type: RequestSubType::Debit,
                monetary_quota: None,
                consumed_units: Some(usage.total_used),
            },
        )?;
        let rated = self.rating.service_usage(&rating_request).await?;
        let price = rated.service_rating.price;

        let reserved = state.register_rating_group(rating_group).reserved_quota;
        let refund = price < reserved;

        let (request_type, action, mscc) = if refund {
            let surplus = reserved
                .checked_sub(price)
                .ok_or_else(|| overflow("refund amount"))?;
            debug!(rating_group, price = %price, surplus = %surplus, "Refunding surplus reservation");
            (
                CcRequestType::UpdateRequest,
                RequestedAction::RefundAccount,
                MultipleServicesCreditControl {
                    rating_group,
                    requested_service_unit: Some(ServiceUnit::money(surplus)),
                    ..Default::default()
                },
            )
        } else {
            let shortfall = price
                .checked_sub(reserved)
                .ok_or_else(|| overflow("debit amount"))?;
            debug!(rating_group, price = %price, shortfall = %shortfall, "Debiting usage beyond reservation");
            (
                CcRequestType::TerminationRequest,
                RequestedAction::DirectDebiting,
                MultipleServicesCreditControl {
                    rating_group,
                    used_service_unit: Some(ServiceUnit::money(shortfall)),
                    ..Default::default()
                },
            )
        };

        let request = self.account_request(state, subscription_id, request_type, action, mscc);
        self.account.debit(&request).await?;

        let group = state.register_rating_group(rating_group);
        group.reserved_quota = Decimal::ZERO;
        if refund {
            // Sibling flows may still need quota
            group.rating_type = RatingType::Reserve;
        }

        Ok(MultipleUnitInformation {
            rating_group,
            upf_id: usage.upf_id.map(str::to_string),
            ..Default::default()
        })
    }

    fn account_request(
        &self,
        state: &ChargingState,
        subscription_id: Option<&SubscriptionId>,
        cc_request_type: CcRequestType,
        requested_action: RequestedAction,
        multiple_services_credit_control: MultipleServicesCreditControl,
    ) -> AccountDebitRequest {
        let cc_request_number = state
            .rating_group(multiple_services_credit_control.rating_group)
            .map(|group| group.acct_request_num)
            .unwrap_or(0);

        AccountDebitRequest {
            session_id: state.acct_session_id.to_string(),
            origin_host: self.settings.abmf.origin_host.clone(),
            origin_realm: self.settings.abmf.origin_realm.clone(),
            user_name: self.settings.nf_name.clone(),
            subscription_id: subscription_id.cloned(),
            cc_request_type,
            cc_request_number,
            requested_action,
            event_timestamp: Utc::now(),
            multiple_services_credit_control,
        }
    }

    fn rating_request(
        &self,
        state: &ChargingState,
        subscription_id: Option<&SubscriptionId>,
        service_rating: ServiceRating,
    ) -> ChargingResult<ServiceUsageRequest> {
        let subscription_id = subscription_id.cloned().ok_or_else(|| {
            ChargingError::SubscriberNotFound("no subscription id for rating".to_string())
        })?;

        Ok(ServiceUsageRequest {
            session_id: state.rate_session_id.to_string(),
            origin_host: self.settings.rating.origin_host.clone(),
            origin_realm: self.settings.rating.origin_realm.clone(),
            subscription_id,
            service_rating,
        })
    }
}
