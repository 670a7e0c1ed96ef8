//! API layer for the charging function
//!
//! HTTP handlers for the converged charging resources, the recharge trigger
//! and the in-process rating endpoint.

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;
pub mod state;

pub use dto::{HealthResponse, RechargeRequest};
pub use handlers::{configure_api, configure_charging_data, configure_rating};
pub use state::AppState;
