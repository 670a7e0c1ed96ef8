//! Exchange clients for the charging function
//!
//! - [`AbmfClient`]: credit-control requests to the account/balance function
//! - [`RatingClient`]: service-usage requests to a remote rating function
//! - [`NotificationClient`]: charging notifications to the session management function
//!
//! The two exchanges share a JSON-RPC 2.0 framing over HTTP; transport
//! failures and timeouts are surfaced as `ChargingError::Rpc` /
//! `ChargingError::Timeout`.

mod abmf;
mod client;
mod notification;
mod rating;
pub mod types;

pub use abmf::AbmfClient;
pub use client::{resolve_origin_host, JsonRpcClient, RpcError};
pub use notification::NotificationClient;
pub use rating::RatingClient;
