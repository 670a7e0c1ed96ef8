//! Converged charging data handlers
//!
//! Create, update and release of charging data resources.

use actix_web::{http::header, web, HttpResponse};
use chf_core::models::ChargingDataRequest;
use chf_core::ChargingError;
use chf_services::constants::CHARGING_DATA_PATH;
use chf_services::ChargingOutcome;
use tracing::{info, instrument};

use crate::state::AppState;

fn log_partial_record(outcome: &ChargingOutcome) {
    if outcome.partial_record {
        info!(
            charging_ref = ?outcome.charging_ref,
            "Volume limit reached, charging record rolled over"
        );
    }
}

/// Open a charging data resource
///
/// POST /nchf-convergedcharging/v3/chargingdata
#[instrument(skip(state, body), fields(subscriber = %body.subscriber_identifier))]
pub async fn create_charging_data(
    state: web::Data<AppState>,
    body: web::Json<ChargingDataRequest>,
) -> Result<HttpResponse, ChargingError> {
    let outcome = state.sessions.create(&body).await?;
    log_partial_record(&outcome);

    let mut response = HttpResponse::Created();
    if let Some(charging_ref) = &outcome.charging_ref {
        response.insert_header((
            header::LOCATION,
            format!("{}{}/{}", state.sbi_uri, CHARGING_DATA_PATH, charging_ref),
        ));
    }

    Ok(response.json(outcome.response))
}

/// Interim usage report
///
/// POST /nchf-convergedcharging/v3/chargingdata/{ref}/update
#[instrument(skip(state, body), fields(subscriber = %body.subscriber_identifier))]
pub async fn update_charging_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ChargingDataRequest>,
) -> Result<HttpResponse, ChargingError> {
    let charging_ref = path.into_inner();
    let outcome = state.sessions.update(&body, &charging_ref).await?;
    log_partial_record(&outcome);

    Ok(HttpResponse::Ok().json(outcome.response))
}

/// Final usage report
///
/// POST /nchf-convergedcharging/v3/chargingdata/{ref}/release
#[instrument(skip(state, body), fields(subscriber = %body.subscriber_identifier))]
pub async fn release_charging_data(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ChargingDataRequest>,
) -> Result<HttpResponse, ChargingError> {
    let charging_ref = path.into_inner();
    state.sessions.release(&body, &charging_ref).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Configure charging data routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(CHARGING_DATA_PATH)
            .route("", web::post().to(create_charging_data))
            .route("/{charging_ref}/update", web::post().to(update_charging_data))
            .route("/{charging_ref}/release", web::post().to(release_charging_data)),
    );
}
