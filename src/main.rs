//! CHF converged charging server
//!
//! Serves the Nchf converged charging resources, drives the account/balance
//! and rating exchanges and exposes an in-process rating endpoint backed by
//! the tariff store.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use chf_api::{configure_api, configure_charging_data, configure_rating, AppState};
use chf_cache::RedisTariffStore;
use chf_core::traits::{RatingExchange, TariffStore};
use chf_core::AppConfig;
use chf_rpc::{resolve_origin_host, AbmfClient, NotificationClient, RatingClient};
use chf_services::{
    ChargingEngine, ChargingSessionService, EngineSettings, InMemoryTariffStore, OriginIdentity,
    QuotaPolicy, RatingResponder, SubscriberStore,
};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "chf={0},chf_api={0},chf_services={0},chf_rpc={0},chf_cache={0},actix_web=info",
            log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();
}

async fn tariff_store(config: &AppConfig) -> anyhow::Result<Arc<dyn TariffStore>> {
    match &config.redis {
        Some(redis) => {
            info!("Connecting to Redis tariff store...");
            let store = RedisTariffStore::new(&redis.url)
                .await
                .context("Failed to connect to the tariff store")?;
            store.ping().await.context("Tariff store not responding")?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("No Redis configured, tariffs are kept in memory");
            Ok(Arc::new(InMemoryTariffStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting CHF v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().context("Failed to load configuration")?;

    let responder = Arc::new(RatingResponder::new(tariff_store(&config).await?));

    let rating: Arc<dyn RatingExchange> = if config.rating.url.is_some() {
        info!("Rating exchange: remote rating function");
        Arc::new(RatingClient::from_config(&config.rating)?)
    } else {
        info!("Rating exchange: in-process responder");
        responder.clone()
    };
    let account = Arc::new(AbmfClient::from_config(&config.abmf)?);

    let settings = EngineSettings {
        nf_name: config.nf.name.clone(),
        abmf: OriginIdentity::new(
            resolve_origin_host(config.abmf.origin_host.as_deref()),
            config.abmf.origin_realm.as_str(),
        ),
        rating: OriginIdentity::new(
            resolve_origin_host(config.rating.origin_host.as_deref()),
            config.rating.origin_realm.as_str(),
        ),
        first_reservation_multiplier: config.charging.first_reservation_multiplier,
    };
    info!(
        nf_name = %settings.nf_name,
        origin_host = %settings.abmf.origin_host,
        "Charging engine configured"
    );

    let engine = ChargingEngine::new(account, rating, settings);
    let notifier = Arc::new(NotificationClient::new(
        config.charging.notification_timeout_ms,
    )?);
    let store = Arc::new(SubscriberStore::new(QuotaPolicy::from(&config.charging)));
    let sessions = Arc::new(ChargingSessionService::new(store, engine, notifier));
    let state = AppState::new(sessions, responder, config.nf.sbi_uri.as_str());

    let bind_addr = config.server_addr();
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, config.server.workers
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(TracingLogger::default())
            .configure(configure_api)
            .configure(configure_charging_data)
            .configure(configure_rating)
    })
    .workers(config.server.workers)
    .bind(&bind_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
