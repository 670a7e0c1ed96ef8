//! Per-subscriber charging state
//!
//! The store maps a subscriber identity to a [`Subscriber`]; each subscriber
//! owns its [`ChargingState`] behind an async mutex. Every read or write of
//! rating type, reserved quota, unit cost or request numbers happens through
//! the guard, which is held across the exchange round-trips of a report.

use chf_core::config::ChargingConfig;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Credit-control mode of a rating group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatingType {
    /// Quota is granted speculatively
    #[default]
    Reserve,
    /// Final accounting; no further quota until reset
    Debit,
}

/// State of one rating group
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RatingGroupState {
    pub rating_type: RatingType,
    /// Monetary amount currently reserved; may go transiently negative
    pub reserved_quota: Decimal,
    /// Last tariff returned by the rating exchange
    pub unit_cost: Decimal,
    /// CC-Request-Number of the next account debit request
    pub acct_request_num: u32,
}

/// Quota policy applied to every rating group of a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub volume_threshold_rate: Decimal,
    pub volume_limit: u32,
    pub volume_limit_pdu: u32,
    pub quota_validity_time: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::from(&ChargingConfig::default())
    }
}

impl From<&ChargingConfig> for QuotaPolicy {
    fn from(config: &ChargingConfig) -> Self {
        Self {
            volume_threshold_rate: config.volume_threshold_rate,
            volume_limit: config.volume_limit,
            volume_limit_pdu: config.volume_limit_pdu,
            quota_validity_time: config.quota_validity_time,
        }
    }
}

/// Charging state of one subscriber
#[derive(Debug, Clone, Default)]
pub struct ChargingState {
    rating_groups: Vec<u32>,
    groups: HashMap<u32, RatingGroupState>,
    sessions: HashSet<String>,
    pub policy: QuotaPolicy,
    pub notify_uri: Option<String>,
    pub acct_session_id: u32,
    pub rate_session_id: u32,
}

impl ChargingState {
    pub fn new(policy: QuotaPolicy, acct_session_id: u32, rate_session_id: u32) -> Self {
        Self {
            policy,
            acct_session_id,
            rate_session_id,
            ..Default::default()
        }
    }

    /// Register a rating group in RESERVE mode if it is not known yet
    pub fn register_rating_group(&mut self, rating_group: u32) -> &mut RatingGroupState {
        if !self.groups.contains_key(&rating_group) {
            debug!(rating_group, "Registering rating group");
            self.rating_groups.push(rating_group);
        }
        self.groups.entry(rating_group).or_default()
    }

    pub fn rating_group(&self, rating_group: u32) -> Option<&RatingGroupState> {
        self.groups.get(&rating_group)
    }

    /// Known rating groups in registration order
    pub fn rating_groups(&self) -> &[u32] {
        &self.rating_groups
    }

    /// Put a rating group back in RESERVE mode (recharge)
    pub fn reset_to_reserve(&mut self, rating_group: u32) {
        self.register_rating_group(rating_group).rating_type = RatingType::Reserve;
    }

    pub fn open_session(&mut self, charging_ref: &str) -> bool {
        self.sessions.insert(charging_ref.to_string())
    }

    pub fn has_session(&self, charging_ref: &str) -> bool {
        self.sessions.contains(charging_ref)
    }

    pub fn close_session(&mut self, charging_ref: &str) -> bool {
        self.sessions.remove(charging_ref)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// A subscriber and its lock-protected charging state
#[derive(Debug)]
pub struct Subscriber {
    id: String,
    state: Mutex<ChargingState>,
}

impl Subscriber {
    pub fn new(id: impl Into<String>, state: ChargingState) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(state),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Acquire the subscriber lock
    pub async fn lock(&self) -> MutexGuard<'_, ChargingState> {
        self.state.lock().await
    }
}

/// Registry of subscribers with charging state
pub struct SubscriberStore {
    subscribers: RwLock<HashMap<String, Arc<Subscriber>>>,
    policy: QuotaPolicy,
    next_session_id: AtomicU32,
}

impl SubscriberStore {
    pub fn new(policy: QuotaPolicy) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            policy,
            next_session_id: AtomicU32::new(1),
        }
    }

    pub fn get(&self, subscriber_id: &str) -> Option<Arc<Subscriber>> {
        self.subscribers.read().get(subscriber_id).cloned()
    }

    /// Return the subscriber, creating it with fresh state on first use
    pub fn get_or_create(&self, subscriber_id: &str) -> Arc<Subscriber> {
        if let Some(subscriber) = self.get(subscriber_id) {
            return subscriber;
        }

        let mut subscribers = self.subscribers.write();
        subscribers
            .entry(subscriber_id.to_string())
            .or_insert_with(|| {
                info!(subscriber = %subscriber_id, "New charging subscriber");
                let acct_session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
                let rate_session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
                Arc::new(Subscriber::new(
                    subscriber_id,
                    ChargingState::new(self.policy.clone(), acct_session_id, rate_session_id),
                ))
            })
            .clone()
    }

    /// Tear down a subscriber
    pub fn remove(&self, subscriber_id: &str) -> Option<Arc<Subscriber>> {
        let removed = self.subscribers.write().remove(subscriber_id);
        if removed.is_some() {
            info!(subscriber = %subscriber_id, "Charging subscriber removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }
}

impl Default for SubscriberStore {
    fn default() -> Self {
        Self::new(QuotaPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    #[test]
    fn test_register_rating_group_defaults_to_reserve() {
        let mut state = ChargingState::default();
        let group = state.register_rating_group(5);
        assert_eq!(group.rating_type, RatingType::Reserve);
        assert_eq!(group.reserved_quota, Decimal::ZERO);

        state.register_rating_group(7);
        state.register_rating_group(5);
        assert_eq!(state.rating_groups(), &[5, 7]);
    }

    #[test]
    fn test_reset_to_reserve() {
        let mut state = ChargingState::default();
        state.register_rating_group(5).rating_type = RatingType::Debit;
        state.reset_to_reserve(5);
        assert_eq!(state.rating_group(5).unwrap().rating_type, RatingType::Reserve);
    }

    #[test]
    fn test_policy_from_config() {
        let config = ChargingConfig {
            volume_limit: 1000,
            volume_limit_pdu: 5000,
            ..Default::default()
        };
        let policy = QuotaPolicy::from(&config);
        assert_eq!(policy.volume_threshold_rate, dec!(0.8));
        assert_eq!(policy.volume_limit, 1000);
        assert_eq!(policy.volume_limit_pdu, 5000);
    }

    #[test]
    fn test_store_get_or_create_is_stable() {
        let store = SubscriberStore::default();
        assert!(store.get("imsi-001").is_none());

        let first = store.get_or_create("imsi-001");
        let second = store.get_or_create("imsi-001");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);

        assert!(store.remove("imsi-001").is_some());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_get_distinct_session_ids() {
        let store = SubscriberStore::default();
        let a = store.get_or_create("imsi-001");
        let b = store.get_or_create("imsi-002");

        let (a_acct, a_rate) = {
            let state = a.lock().await;
            (state.acct_session_id, state.rate_session_id)
        };
        let state = b.lock().await;
        assert_ne!(a_acct, state.acct_session_id);
        assert_ne!(a_rate, state.rate_session_id);
    }

    #[tokio::test]
    async fn test_lock_serializes_same_subscriber() {
        let store = Arc::new(SubscriberStore::default());
        let subscriber = store.get_or_create("imsi-001");

        let guard = subscriber.lock().await;

        let contender = {
            let subscriber = store.get_or_create("imsi-001");
            tokio::spawn(async move {
                let mut state = subscriber.lock().await;
                state.register_rating_group(9).acct_request_num += 1;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        assert!(guard.rating_group(9).is_none());

        drop(guard);
        contender.await.unwrap();
        assert_eq!(subscriber.lock().await.rating_group(9).unwrap().acct_request_num, 1);
    }

    #[tokio::test]
    async fn test_other_subscribers_are_not_blocked() {
        let store = SubscriberStore::default();
        let a = store.get_or_create("imsi-001");
        let b = store.get_or_create("imsi-002");

        let _held = a.lock().await;
        let locked = tokio::time::timeout(Duration::from_millis(100), b.lock()).await;
        assert!(locked.is_ok());
    }
}
