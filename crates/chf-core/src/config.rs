//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub nf: NfConfig,
    pub abmf: ExchangeConfig,
    pub rating: ExchangeConfig,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub charging: ChargingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Identity of this charging function towards its peers
#[derive(Debug, Deserialize, Clone)]
pub struct NfConfig {
    /// NF name, sent as User-Name in every exchange
    #[serde(default = "default_nf_name")]
    pub name: String,

    /// Base URI used to build charging data resource locations
    #[serde(default = "default_sbi_uri")]
    pub sbi_uri: String,
}

fn default_nf_name() -> String {
    "CHF".to_string()
}

fn default_sbi_uri() -> String {
    "http://127.0.0.1:8000".to_string()
}

/// Peer configuration for a request/response exchange (ABMF or rating function)
#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    /// JSON-RPC endpoint. For the rating exchange `None` selects the
    /// in-process rating responder.
    #[serde(default)]
    pub url: Option<String>,

    /// Origin-Host override; the machine hostname is used when absent
    #[serde(default)]
    pub origin_host: Option<String>,

    /// Origin-Realm
    #[serde(default = "default_origin_realm")]
    pub origin_realm: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_exchange_timeout")]
    pub timeout_ms: u64,
}

fn default_origin_realm() -> String {
    "chf.localdomain".to_string()
}

fn default_exchange_timeout() -> u64 {
    1000
}

/// Redis configuration (tariff store)
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,
}

/// Quota and reservation policy applied to every subscriber
#[derive(Debug, Deserialize, Clone)]
pub struct ChargingConfig {
    /// Monetary units requested per requested volume unit on a first reservation
    #[serde(default = "default_first_reservation_multiplier")]
    pub first_reservation_multiplier: u64,

    /// Fraction of the granted volume at which the reporter must report again
    #[serde(default = "default_volume_threshold_rate")]
    pub volume_threshold_rate: Decimal,

    /// Subscriber-level volume limit (deferred report), 0 disables it
    #[serde(default)]
    pub volume_limit: u32,

    /// PDU-session-level volume limit (immediate report), 0 disables it
    #[serde(default)]
    pub volume_limit_pdu: u32,

    /// Quota validity time in seconds, 0 disables it
    #[serde(default)]
    pub quota_validity_time: u32,

    /// Timeout for charging notification callbacks in milliseconds
    #[serde(default = "default_notification_timeout")]
    pub notification_timeout_ms: u64,
}

fn default_first_reservation_multiplier() -> u64 {
    10
}

fn default_volume_threshold_rate() -> Decimal {
    Decimal::new(8, 1)
}

fn default_notification_timeout() -> u64 {
    3000
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            first_reservation_multiplier: default_first_reservation_multiplier(),
            volume_threshold_rate: default_volume_threshold_rate(),
            volume_limit: 0,
            volume_limit_pdu: 0,
            quota_validity_time: 0,
            notification_timeout_ms: default_notification_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("nf.name", "CHF")?
            .set_default("nf.sbi_uri", "http://127.0.0.1:8000")?
            .set_default("abmf.origin_realm", "chf.localdomain")?
            .set_default("abmf.timeout_ms", 1000)?
            .set_default("rating.origin_realm", "chf.localdomain")?
            .set_default("rating.timeout_ms", 1000)?
            .set_default("charging.first_reservation_multiplier", 10)?
            .set_default("charging.volume_threshold_rate", "0.8")?
            .set_default("charging.volume_limit", 0)?
            .set_default("charging.volume_limit_pdu", 0)?
            .set_default("charging.quota_validity_time", 0)?
            .set_default("charging.notification_timeout_ms", 3000)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with CHF_ prefix
            .add_source(
                Environment::with_prefix("CHF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_charging_config() {
        let config = ChargingConfig::default();
        assert_eq!(config.first_reservation_multiplier, 10);
        assert_eq!(config.volume_threshold_rate, dec!(0.8));
        assert_eq!(config.volume_limit, 0);
        assert_eq!(config.volume_limit_pdu, 0);
    }
}
