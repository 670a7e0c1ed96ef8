//! Charging session service
//!
//! Charging data create/update/release around the decision engine, plus the
//! recharge notification path. Every operation runs under the subscriber lock.

use chf_core::models::{ChargingDataRequest, ChargingDataResponse, ChargingNotifyRequest};
use chf_core::traits::ChargingNotifier;
use chf_core::{ChargingError, ChargingResult};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use crate::charging::{ChargingEngine, EngineOutcome};
use crate::subscriber::{ChargingState, Subscriber, SubscriberStore};

/// Result of a charging data operation
#[derive(Debug, Clone)]
pub struct ChargingOutcome {
    pub response: ChargingDataResponse,
    /// Charging session id, absent for one-time events
    pub charging_ref: Option<String>,
    /// The open charging record must be closed and a new one opened
    pub partial_record: bool,
}

pub struct ChargingSessionService {
    store: Arc<SubscriberStore>,
    engine: ChargingEngine,
    notifier: Arc<dyn ChargingNotifier>,
    local_record_sequence: AtomicU64,
}

impl ChargingSessionService {
    pub fn new(
        store: Arc<SubscriberStore>,
        engine: ChargingEngine,
        notifier: Arc<dyn ChargingNotifier>,
    ) -> Self {
        Self {
            store,
            engine,
            notifier,
            local_record_sequence: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<SubscriberStore> {
        &self.store
    }

    /// Open a charging session
    ///
    /// Creates the subscriber on first use. The engine only runs when the
    /// request reports unit usage.
    #[instrument(skip(self, request), fields(subscriber = %request.subscriber_identifier))]
    pub async fn create(&self, request: &ChargingDataRequest) -> ChargingResult<ChargingOutcome> {
        validate(request)?;
        let subscriber_id = request.subscriber_identifier.as_str();

        let subscriber = self.store.get_or_create(subscriber_id);
        let mut state = subscriber.lock().await;

        if let Some(uri) = &request.notify_uri {
            state.notify_uri = Some(uri.clone());
        }

        let charging_ref = if request.one_time_event {
            debug!("One-time event, no charging session");
            None
        } else {
            let sequence = self.local_record_sequence.fetch_add(1, Ordering::Relaxed) + 1;
            let charging_ref = format!("{}{}{}", subscriber_id, request.consumer_name(), sequence);
            state.open_session(&charging_ref);
            info!(charging_ref = %charging_ref, "Charging session created");
            Some(charging_ref)
        };

        let outcome = if request.multiple_unit_usage.is_empty() {
            EngineOutcome::default()
        } else {
            self.engine.process(&mut state, subscriber_id, request).await
        };

        if let Err(e) = ensure_processed(&outcome) {
            if let Some(charging_ref) = &charging_ref {
                state.close_session(charging_ref);
            }
            return Err(e);
        }

        Ok(ChargingOutcome {
            response: response_for(request, &outcome),
            charging_ref,
            partial_record: outcome.partial_record,
        })
    }

    /// Process an interim usage report
    #[instrument(skip(self, request), fields(subscriber = %request.subscriber_identifier))]
    pub async fn update(
        &self,
        request: &ChargingDataRequest,
        charging_ref: &str,
    ) -> ChargingResult<ChargingOutcome> {
        validate(request)?;
        let subscriber = self.subscriber(&request.subscriber_identifier)?;
        let mut state = subscriber.lock().await;
        ensure_session(&state, charging_ref)?;

        if let Some(uri) = &request.notify_uri {
            state.notify_uri = Some(uri.clone());
        }

        let outcome = self
            .engine
            .process(&mut state, subscriber.id(), request)
            .await;
        ensure_processed(&outcome)?;

        Ok(ChargingOutcome {
            response: response_for(request, &outcome),
            charging_ref: Some(charging_ref.to_string()),
            partial_record: outcome.partial_record,
        })
    }

    /// Final usage report; the session is forgotten afterwards
    ///
    /// The subscriber and its rating group state survive the release.
    #[instrument(skip(self, request), fields(subscriber = %request.subscriber_identifier))]
    pub async fn release(
        &self,
        request: &ChargingDataRequest,
        charging_ref: &str,
    ) -> ChargingResult<ChargingOutcome> {
        validate(request)?;
        let subscriber = self.subscriber(&request.subscriber_identifier)?;
        let mut state = subscriber.lock().await;
        ensure_session(&state, charging_ref)?;

        let outcome = self
            .engine
            .process(&mut state, subscriber.id(), request)
            .await;

        state.close_session(charging_ref);
        info!(charging_ref = %charging_ref, "Charging session released");
        ensure_processed(&outcome)?;

        Ok(ChargingOutcome {
            response: response_for(request, &outcome),
            charging_ref: Some(charging_ref.to_string()),
            partial_record: outcome.partial_record,
        })
    }

    /// Put a rating group back in reserve mode after a recharge and ask the
    /// session management function to re-authorize it
    ///
    /// Delivery failures are logged only.
    #[instrument(skip(self))]
    pub async fn notify_recharge(&self, subscriber_id: &str, rating_group: u32) -> ChargingResult<()> {
        let subscriber = self.subscriber(subscriber_id)?;

        // Released before the callback: the peer answers with an update
        // that needs the same lock.
        let notify_uri = {
            let mut state = subscriber.lock().await;
            state.reset_to_reserve(rating_group);
            state.notify_uri.clone()
        };
        info!(rating_group, "Rating group recharged");

        let Some(notify_uri) = notify_uri else {
            warn!(rating_group, "No notify URI, re-authorization not sent");
            return Ok(());
        };

        let notification = ChargingNotifyRequest::reauthorize(rating_group);
        match self.notifier.notify(&notify_uri, &notification).await {
            Ok(()) => debug!(notify_uri = %notify_uri, "Re-authorization sent"),
            Err(e) => {
                error!(notify_uri = %notify_uri, error = %e, "Re-authorization delivery failed")
            }
        }

        Ok(())
    }

    fn subscriber(&self, subscriber_id: &str) -> ChargingResult<Arc<Subscriber>> {
        self.store
            .get(subscriber_id)
            .ok_or_else(|| ChargingError::SubscriberNotFound(subscriber_id.to_string()))
    }
}

fn validate(request: &ChargingDataRequest) -> ChargingResult<()> {
    request
        .validate()
        .map_err(|e| ChargingError::Validation(e.to_string()))
}

fn ensure_session(state: &ChargingState, charging_ref: &str) -> ChargingResult<()> {
    if state.has_session(charging_ref) {
        Ok(())
    } else {
        Err(ChargingError::SessionNotFound(charging_ref.to_string()))
    }
}

/// A report whose online groups all failed gets no answer
fn ensure_processed(outcome: &EngineOutcome) -> ChargingResult<()> {
    if outcome.nothing_processed() {
        warn!(failed_groups = ?outcome.failed_groups, "No rating group processed");
        return Err(ChargingError::Rpc("no rating group processed".to_string()));
    }
    Ok(())
}

fn response_for(request: &ChargingDataRequest, outcome: &EngineOutcome) -> ChargingDataResponse {
    ChargingDataResponse {
        invocation_time_stamp: Utc::now(),
        invocation_sequence_number: request.invocation_sequence_number,
        multiple_unit_information: outcome.unit_information.clone(),
    }
}
