//! Shared application state

use chf_services::{ChargingSessionService, RatingResponder};
use std::sync::Arc;

/// State injected into every handler through `web::Data`
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<ChargingSessionService>,
    pub rating: Arc<RatingResponder>,
    /// Base URI used in `Location` headers
    pub sbi_uri: String,
}

impl AppState {
    pub fn new(
        sessions: Arc<ChargingSessionService>,
        rating: Arc<RatingResponder>,
        sbi_uri: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            rating,
            sbi_uri: sbi_uri.into().trim_end_matches('/').to_string(),
        }
    }
}
