//! Request/response DTOs that are not charging models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Recharge trigger
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RechargeRequest {
    #[validate(length(min = 1, message = "Subscriber id is required"))]
    pub subscriber_id: String,
    pub rating_group: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            service: "chf".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
