//! CHF Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the converged charging core. It includes:
//!
//! - Charging data models (usage reports, unit information, triggers)
//! - Credit-control and rating exchange messages
//! - Exact fixed-point monetary values
//! - Collaborator traits (account debit, rating, tariff store, notifier)
//! - Unified error handling with HTTP response mapping
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use error::ChargingError;

/// Result type alias using ChargingError
pub type ChargingResult<T> = Result<T, ChargingError>;
