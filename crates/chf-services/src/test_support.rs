//! In-process fakes for the charging collaborators

use async_trait::async_trait;
use chf_core::models::{
    AccountDebitRequest, AccountDebitResponse, ChargingNotifyRequest, FinalUnitAction,
    FinalUnitIndication, MultipleServicesCreditControl, ServiceUnit, ServiceUsageRequest,
    ServiceUsageResponse, RESULT_CODE_SUCCESS,
};
use chf_core::traits::{AccountDebitExchange, ChargingNotifier, RatingExchange};
use chf_core::{ChargingError, ChargingResult};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

use crate::charging::{ChargingEngine, EngineSettings, OriginIdentity};
use crate::rating::{InMemoryTariffStore, RatingResponder};

/// How the fake account function answers
#[derive(Debug, Clone, Copy)]
pub enum AccountReply {
    /// Grant exactly what was requested
    GrantRequested,
    /// Grant what was requested and mark it as the last grant
    GrantAndTerminate,
    /// Grant a fixed amount whatever was requested
    GrantAmount(Decimal),
}

pub struct FakeAccountExchange {
    reply: Mutex<AccountReply>,
    failing_groups: Mutex<HashSet<u32>>,
    requests: Mutex<Vec<AccountDebitRequest>>,
}

impl FakeAccountExchange {
    pub fn new() -> Self {
        Self {
            reply: Mutex::new(AccountReply::GrantRequested),
            failing_groups: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_reply(&self, reply: AccountReply) {
        *self.reply.lock() = reply;
    }

    pub fn fail_group(&self, rating_group: u32) {
        self.failing_groups.lock().insert(rating_group);
    }

    pub fn heal_group(&self, rating_group: u32) {
        self.failing_groups.lock().remove(&rating_group);
    }

    pub fn requests(&self) -> Vec<AccountDebitRequest> {
        self.requests.lock().clone()
    }

    pub fn clear(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl AccountDebitExchange for FakeAccountExchange {
    async fn debit(&self, request: &AccountDebitRequest) -> ChargingResult<AccountDebitResponse> {
        self.requests.lock().push(request.clone());

        let rating_group = request.rating_group();
        if self.failing_groups.lock().contains(&rating_group) {
            return Err(ChargingError::Rpc("account function unreachable".to_string()));
        }

        let mscc = &request.multiple_services_credit_control;
        let requested = mscc.requested_service_unit.map(|unit| unit.cc_money);
        let (granted, final_unit_indication) = match *self.reply.lock() {
            AccountReply::GrantRequested => (requested, None),
            AccountReply::GrantAndTerminate => (
                requested,
                Some(FinalUnitIndication {
                    final_unit_action: FinalUnitAction::Terminate,
                }),
            ),
            AccountReply::GrantAmount(amount) => (Some(amount), None),
        };

        Ok(AccountDebitResponse {
            session_id: request.session_id.clone(),
            result_code: RESULT_CODE_SUCCESS,
            multiple_services_credit_control: Some(MultipleServicesCreditControl {
                rating_group,
                granted_service_unit: granted.map(ServiceUnit::money),
                final_unit_indication,
                ..Default::default()
            }),
        })
    }
}

/// Rating exchange backed by a real responder that records and can fail
pub struct RecordingRatingExchange {
    responder: RatingResponder,
    failing: Mutex<bool>,
    requests: Mutex<Vec<ServiceUsageRequest>>,
}

impl RecordingRatingExchange {
    pub fn with_tariffs<'a>(entries: impl IntoIterator<Item = (&'a str, u32, &'a str)>) -> Self {
        Self {
            responder: RatingResponder::new(Arc::new(InMemoryTariffStore::with_tariffs(entries))),
            failing: Mutex::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn requests(&self) -> Vec<ServiceUsageRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl RatingExchange for RecordingRatingExchange {
    async fn service_usage(
        &self,
        request: &ServiceUsageRequest,
    ) -> ChargingResult<ServiceUsageResponse> {
        self.requests.lock().push(request.clone());
        if *self.failing.lock() {
            return Err(ChargingError::Timeout(1000));
        }
        self.responder.rate(request).await
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, ChargingNotifyRequest)>>,
    pub failing: Mutex<bool>,
}

#[async_trait]
impl ChargingNotifier for RecordingNotifier {
    async fn notify(&self, notify_uri: &str, request: &ChargingNotifyRequest) -> ChargingResult<()> {
        self.sent.lock().push((notify_uri.to_string(), request.clone()));
        if *self.failing.lock() {
            return Err(ChargingError::Rpc("connection refused".to_string()));
        }
        Ok(())
    }
}

pub fn test_settings() -> EngineSettings {
    EngineSettings {
        nf_name: "CHF".to_string(),
        abmf: OriginIdentity::new("chf-test", "chf.localdomain"),
        rating: OriginIdentity::new("chf-test", "chf.localdomain"),
        first_reservation_multiplier: 10,
    }
}

/// Engine wired to the given fakes
pub fn engine(
    account: Arc<FakeAccountExchange>,
    rating: Arc<RecordingRatingExchange>,
) -> ChargingEngine {
    ChargingEngine::new(account, rating, test_settings())
}
