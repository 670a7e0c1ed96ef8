//! Redis key builders for the tariff store
//!
//! # Key Patterns
//!
//! - `tariff:{subscriber}:{rating_group}` - Unit cost string for one rating group
//!
//! # Example
//!
//! ```
//! use chf_cache::keys;
//!
//! let key = keys::tariff_key("imsi-208930000000001", 5);
//! assert_eq!(key, "tariff:imsi-208930000000001:5");
//! ```

/// Prefix for stored unit costs
///
/// Format: `tariff:{subscriber}:{rating_group}`
pub const TARIFF_KEY_PREFIX: &str = "tariff";

/// Build the key holding the unit cost of a subscriber's rating group
pub fn tariff_key(subscriber: &str, rating_group: u32) -> String {
    format!("{}:{}:{}", TARIFF_KEY_PREFIX, subscriber, rating_group)
}
