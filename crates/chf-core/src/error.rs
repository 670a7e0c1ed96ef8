//! Unified error handling for the charging core
//!
//! This module provides the error type shared by the engine, the rating
//! responder, the exchange clients and the HTTP layer, with automatic HTTP
//! response mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main charging error type
///
/// Inside the decision engine these errors are contained to a single rating
/// group; they only surface to callers for lookup and validation failures.
#[derive(Error, Debug)]
pub enum ChargingError {
    // ==================== Lookup Errors ====================
    #[error("Subscriber not found: {0}")]
    SubscriberNotFound(String),

    #[error("Charging session not found: {0}")]
    SessionNotFound(String),

    #[error("Tariff not found for subscriber {subscriber} rating group {rating_group}")]
    TariffNotFound { subscriber: String, rating_group: u32 },

    // ==================== Rating Errors ====================
    #[error("Invalid tariff: {0}")]
    InvalidTariff(String),

    #[error("Zero tariff for rating group {0}")]
    ZeroTariff(u32),

    // ==================== Exchange Errors ====================
    #[error("Exchange error: {0}")]
    Rpc(String),

    #[error("Exchange returned error {code}: {message}")]
    RpcStatus { code: i32, message: String },

    #[error("Timeout: exchange took longer than {0}ms")]
    Timeout(u64),

    // ==================== Validation Errors ====================
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ==================== Cache Errors ====================
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cache connection failed: {0}")]
    CacheConnection(String),

    // ==================== Internal Errors ====================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChargingError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            ChargingError::Validation(_) | ChargingError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }

            // 404 Not Found
            ChargingError::SubscriberNotFound(_)
            | ChargingError::SessionNotFound(_)
            | ChargingError::TariffNotFound { .. } => StatusCode::NOT_FOUND,

            // 422 Unprocessable Entity
            ChargingError::InvalidTariff(_) | ChargingError::ZeroTariff(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // 502 Bad Gateway
            ChargingError::Rpc(_) | ChargingError::RpcStatus { .. } => StatusCode::BAD_GATEWAY,

            // 504 Gateway Timeout
            ChargingError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ChargingError::SubscriberNotFound(_) => "subscriber_not_found",
            ChargingError::SessionNotFound(_) => "session_not_found",
            ChargingError::TariffNotFound { .. } => "tariff_not_found",
            ChargingError::InvalidTariff(_) => "invalid_tariff",
            ChargingError::ZeroTariff(_) => "zero_tariff",
            ChargingError::Rpc(_) => "exchange_error",
            ChargingError::RpcStatus { .. } => "exchange_status_error",
            ChargingError::Timeout(_) => "exchange_timeout",
            ChargingError::Validation(_) => "validation_error",
            ChargingError::InvalidInput(_) => "invalid_input",
            ChargingError::Cache(_) => "cache_error",
            ChargingError::CacheConnection(_) => "cache_connection_error",
            ChargingError::Config(_) => "config_error",
            ChargingError::Serialization(_) => "serialization_error",
            ChargingError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for ChargingError {
    fn status_code(&self) -> StatusCode {
        ChargingError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for ChargingError {
    fn from(err: serde_json::Error) -> Self {
        ChargingError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ChargingError {
    fn from(err: std::io::Error) -> Self {
        ChargingError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for ChargingError {
    fn from(err: config::ConfigError) -> Self {
        ChargingError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ChargingError {
    fn from(err: validator::ValidationErrors) -> Self {
        ChargingError::Validation(err.to_string())
    }
}
