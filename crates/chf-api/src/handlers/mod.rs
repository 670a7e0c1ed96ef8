//! HTTP request handlers

pub mod charging_data;
pub mod health;
pub mod rating;
pub mod recharge;

use actix_web::web;

pub use charging_data::configure as configure_charging_data;
pub use rating::configure as configure_rating;

/// Operational endpoints under `/api/v1`
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health::health_check))
            .route("/recharge", web::post().to(recharge::recharge)),
    );
}
