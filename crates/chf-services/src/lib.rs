//! Charging services
//!
//! This crate holds the converged-charging core:
//!
//! - `ChargingEngine` - per-rating-group reservation/debit decisions driving
//!   the account debit and rating exchanges
//! - `RatingResponder` - prices a service-usage request against a stored tariff
//! - `SubscriberStore` - per-subscriber charging state behind an async lock
//! - `ChargingSessionService` - charging data create/update/release and
//!   recharge notifications around the engine
//!
//! Collaborators (exchanges, tariff store, notifier) are injected as trait
//! objects so the services can be exercised with in-process fakes.

pub mod charging;
pub mod rating;
pub mod session;
pub mod subscriber;

#[cfg(test)]
pub(crate) mod test_support;

pub use charging::{ChargingEngine, EngineOutcome, EngineSettings, OriginIdentity};
pub use rating::{InMemoryTariffStore, RatingResponder};
pub use session::{ChargingOutcome, ChargingSessionService};
pub use subscriber::{ChargingState, QuotaPolicy, RatingGroupState, RatingType, Subscriber, SubscriberStore};

/// Charging constants
pub mod constants {
    /// Monetary units requested per requested volume unit on a first reservation
    pub const FIRST_RESERVATION_MULTIPLIER: u64 = 10;

    /// Path prefix of charging data resources
    pub const CHARGING_DATA_PATH: &str = "/nchf-convergedcharging/v3/chargingdata";
}
