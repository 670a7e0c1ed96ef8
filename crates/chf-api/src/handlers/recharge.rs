//! Recharge trigger
//!
//! Called once a subscriber's account has been topped up: the rating group
//! leaves debit mode and the session management function is asked to
//! re-authorize it.

use actix_web::{web, HttpResponse};
use chf_core::ChargingError;
use tracing::instrument;
use validator::Validate;

use crate::dto::RechargeRequest;
use crate::state::AppState;

/// POST /api/v1/recharge
#[instrument(skip(state, body), fields(
    subscriber = %body.subscriber_id,
    rating_group = body.rating_group,
))]
pub async fn recharge(
    state: web::Data<AppState>,
    body: web::Json<RechargeRequest>,
) -> Result<HttpResponse, ChargingError> {
    body.validate()?;

    state
        .sessions
        .notify_recharge(&body.subscriber_id, body.rating_group)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}
