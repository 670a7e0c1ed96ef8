//! In-process rating endpoint
//!
//! Serves `RatingSv1.ServiceUsage` over JSON-RPC 2.0 from the configured
//! tariff store. Protocol and application failures are JSON-RPC errors
//! carried in a 200 response.

use actix_web::{web, HttpResponse};
use chf_core::models::{ServiceUsageRequest, ServiceUsageResponse};
use chf_rpc::types::{error_codes, JsonRpcRequest, JsonRpcResponse, SERVICE_USAGE_METHOD};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::state::AppState;

type RatingReply = JsonRpcResponse<ServiceUsageResponse>;

/// POST /rating/jsonrpc
#[instrument(skip(state, body))]
pub async fn service_usage(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let request: JsonRpcRequest<Value> = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed JSON-RPC request");
            return reply(RatingReply::failure(0, error_codes::PARSE_ERROR, e.to_string()));
        }
    };
    let id = request.id;

    if request.method != SERVICE_USAGE_METHOD {
        warn!(method = %request.method, "Unknown JSON-RPC method");
        return reply(RatingReply::failure(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("method not found: {}", request.method),
        ));
    }

    let Some(params) = request.params.into_iter().next() else {
        return reply(RatingReply::failure(
            id,
            error_codes::INVALID_PARAMS,
            "missing service usage request",
        ));
    };

    let usage: ServiceUsageRequest = match serde_json::from_value(params) {
        Ok(usage) => usage,
        Err(e) => {
            return reply(RatingReply::failure(
                id,
                error_codes::INVALID_PARAMS,
                e.to_string(),
            ))
        }
    };

    match state.rating.rate(&usage).await {
        Ok(rated) => {
            debug!(session_id = %rated.session_id, "Service usage rated");
            reply(RatingReply::success(id, rated))
        }
        Err(e) => {
            warn!(error = %e, "Service usage rejected");
            reply(RatingReply::failure(
                id,
                error_codes::SERVER_ERROR,
                format!("{}: {}", e.error_code(), e),
            ))
        }
    }
}

fn reply(body: RatingReply) -> HttpResponse {
    HttpResponse::Ok().json(body)
}

/// Configure the rating endpoint
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/rating/jsonrpc", web::post().to(service_usage));
}
