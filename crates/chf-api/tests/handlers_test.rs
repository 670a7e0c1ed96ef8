//! HTTP route tests against in-process collaborators

use actix_web::{http::header, http::StatusCode, test, web, App};
use async_trait::async_trait;
use chf_api::{configure_api, configure_charging_data, configure_rating, AppState};
use chf_core::models::{
    AccountDebitRequest, AccountDebitResponse, ChargingNotifyRequest,
    MultipleServicesCreditControl, RESULT_CODE_SUCCESS,
};
use chf_core::traits::{AccountDebitExchange, ChargingNotifier};
use chf_core::{ChargingError, ChargingResult};
use chf_services::{
    ChargingEngine, ChargingSessionService, EngineSettings, InMemoryTariffStore, RatingResponder,
    SubscriberStore,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

/// Grants every requested amount
struct GrantingAccount;

#[async_trait]
impl AccountDebitExchange for GrantingAccount {
    async fn debit(&self, request: &AccountDebitRequest) -> ChargingResult<AccountDebitResponse> {
        let mscc = &request.multiple_services_credit_control;
        Ok(AccountDebitResponse {
            session_id: request.session_id.clone(),
            result_code: RESULT_CODE_SUCCESS,
            multiple_services_credit_control: Some(MultipleServicesCreditControl {
                rating_group: mscc.rating_group,
                granted_service_unit: mscc.requested_service_unit,
                ..Default::default()
            }),
        })
    }
}

/// Account function that cannot be reached
struct UnreachableAccount;

#[async_trait]
impl AccountDebitExchange for UnreachableAccount {
    async fn debit(&self, _request: &AccountDebitRequest) -> ChargingResult<AccountDebitResponse> {
        Err(ChargingError::Rpc("connection refused".to_string()))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, ChargingNotifyRequest)>>,
}

#[async_trait]
impl ChargingNotifier for RecordingNotifier {
    async fn notify(&self, notify_uri: &str, request: &ChargingNotifyRequest) -> ChargingResult<()> {
        self.sent.lock().push((notify_uri.to_string(), request.clone()));
        Ok(())
    }
}

fn app_state(notifier: Arc<RecordingNotifier>) -> AppState {
    app_state_with(Arc::new(GrantingAccount), notifier)
}

fn app_state_with(
    account: Arc<dyn AccountDebitExchange>,
    notifier: Arc<RecordingNotifier>,
) -> AppState {
    let tariffs = Arc::new(InMemoryTariffStore::with_tariffs([
        ("imsi-001", 5, "10"),
        ("imsi-001", 7, "0"),
    ]));
    let rating = Arc::new(RatingResponder::new(tariffs));
    let engine = ChargingEngine::new(account, rating.clone(), EngineSettings::default());
    let sessions = Arc::new(ChargingSessionService::new(
        Arc::new(SubscriberStore::default()),
        engine,
        notifier,
    ));
    AppState::new(sessions, rating, "http://chf.example:8000/")
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(configure_api)
                .configure(configure_charging_data)
                .configure(configure_rating),
        )
        .await
    };
}

fn usage_report(used: u64) -> Value {
    json!({
        "subscriberIdentifier": "imsi-001",
        "nfConsumerIdentification": {"nFName": "SMF"},
        "invocationSequenceNumber": 1,
        "notifyUri": "http://smf.example/notify",
        "multipleUnitUsage": [{
            "ratingGroup": 5,
            "requestedUnit": {"totalVolume": 100},
            "usedUnitContainer": [
                {"quotaManagementIndicator": "ONLINE_CHARGING", "totalVolume": used}
            ]
        }]
    })
}

fn service_usage(method: &str, sub_type: &str, rating_group: u32) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "id": 42,
        "params": [{
            "sessionId": "2",
            "originHost": "chf",
            "originRealm": "chf.localdomain",
            "subscriptionId": {
                "subscriptionIdType": "END_USER_IMSI",
                "subscriptionIdData": "001"
            },
            "serviceRating": {
                "serviceIdentifier": rating_group,
                "requestSubType": sub_type,
                "monetaryQuota": "1000",
                "consumedUnits": 37
            }
        }]
    })
}

#[actix_rt::test]
async fn test_health() {
    let app = init_app!(app_state(Arc::default()));

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
}

#[actix_rt::test]
async fn test_charging_data_lifecycle() {
    let app = init_app!(app_state(Arc::default()));

    let req = test::TestRequest::post()
        .uri("/nchf-convergedcharging/v3/chargingdata")
        .set_json(usage_report(0))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(
        location,
        "http://chf.example:8000/nchf-convergedcharging/v3/chargingdata/imsi-001SMF1"
    );

    let body: Value = test::read_body_json(resp).await;
    let info = &body["multipleUnitInformation"][0];
    assert_eq!(info["ratingGroup"], 5);
    assert_eq!(info["grantedUnit"]["totalVolume"], 100);
    assert_eq!(info["volumeQuotaThreshold"], 80);

    let req = test::TestRequest::post()
        .uri("/nchf-convergedcharging/v3/chargingdata/imsi-001SMF1/update")
        .set_json(usage_report(50))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/nchf-convergedcharging/v3/chargingdata/imsi-001SMF1/release")
        .set_json(usage_report(10))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/nchf-convergedcharging/v3/chargingdata/imsi-001SMF1/update")
        .set_json(usage_report(10))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "session_not_found");
    assert_eq!(body["status"], 404);
}

#[actix_rt::test]
async fn test_create_with_unreachable_account_function() {
    let app = init_app!(app_state_with(Arc::new(UnreachableAccount), Arc::default()));

    let req = test::TestRequest::post()
        .uri("/nchf-convergedcharging/v3/chargingdata")
        .set_json(usage_report(0))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert!(resp.headers().get(header::LOCATION).is_none());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "exchange_error");
    assert_eq!(body["status"], 502);
}

#[actix_rt::test]
async fn test_update_unknown_subscriber() {
    let app = init_app!(app_state(Arc::default()));

    let req = test::TestRequest::post()
        .uri("/nchf-convergedcharging/v3/chargingdata/imsi-001SMF1/update")
        .set_json(usage_report(10))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "subscriber_not_found");
}

#[actix_rt::test]
async fn test_create_rejects_missing_subscriber() {
    let app = init_app!(app_state(Arc::default()));
    let mut report = usage_report(0);
    report["subscriberIdentifier"] = json!("");

    let req = test::TestRequest::post()
        .uri("/nchf-convergedcharging/v3/chargingdata")
        .set_json(report)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_recharge_notifies_session_manager() {
    let notifier = Arc::new(RecordingNotifier::default());
    let app = init_app!(app_state(notifier.clone()));

    let req = test::TestRequest::post()
        .uri("/nchf-convergedcharging/v3/chargingdata")
        .set_json(usage_report(0))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/recharge")
        .set_json(json!({"subscriber_id": "imsi-001", "rating_group": 5}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let sent = notifier.sent.lock().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "http://smf.example/notify");
    assert_eq!(sent[0].1.reauthorization_details[0].rating_group, 5);
}

#[actix_rt::test]
async fn test_recharge_unknown_subscriber() {
    let app = init_app!(app_state(Arc::default()));

    let req = test::TestRequest::post()
        .uri("/api/v1/recharge")
        .set_json(json!({"subscriber_id": "imsi-404", "rating_group": 5}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_rating_reserve() {
    let app = init_app!(app_state(Arc::default()));

    let req = test::TestRequest::post()
        .uri("/rating/jsonrpc")
        .set_json(service_usage("RatingSv1.ServiceUsage", "RESERVE", 5))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["id"], 42);
    let rating = &body["result"]["serviceRating"];
    assert_eq!(rating["allowedUnits"], 100);
    assert_eq!(rating["monetaryTariff"]["currencyCode"], 901);
    assert_eq!(rating["monetaryTariff"]["rateElement"]["ccUnitType"], "MONEY");
    assert!(body.get("error").is_none());
}

#[actix_rt::test]
async fn test_rating_debit() {
    let app = init_app!(app_state(Arc::default()));

    let req = test::TestRequest::post()
        .uri("/rating/jsonrpc")
        .set_json(service_usage("RatingSv1.ServiceUsage", "DEBIT", 5))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["result"]["serviceRating"]["price"], "370");
}

#[actix_rt::test]
async fn test_rating_unknown_method() {
    let app = init_app!(app_state(Arc::default()));

    let req = test::TestRequest::post()
        .uri("/rating/jsonrpc")
        .set_json(service_usage("RatingSv1.Unknown", "RESERVE", 5))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["error"]["code"], -32601);
    assert!(body.get("result").is_none());
}

#[actix_rt::test]
async fn test_rating_zero_tariff_is_an_error() {
    let app = init_app!(app_state(Arc::default()));

    let req = test::TestRequest::post()
        .uri("/rating/jsonrpc")
        .set_json(service_usage("RatingSv1.ServiceUsage", "RESERVE", 7))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["error"]["code"], -32000);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("zero_tariff"));
}

#[actix_rt::test]
async fn test_rating_malformed_body() {
    let app = init_app!(app_state(Arc::default()));

    let req = test::TestRequest::post()
        .uri("/rating/jsonrpc")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["error"]["code"], -32700);
}
