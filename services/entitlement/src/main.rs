use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::Database;
use tracing::info;

use daypass_core::config::Config as _;
use daypass_core::tracing::init_tracing;
use daypass_entitlement::config::EntitlementConfig;
use daypass_entitlement::domain::clock::{Clock, SystemClock};
use daypass_entitlement::infra::mail::HttpMailer;
use daypass_entitlement::router::build_router;
use daypass_entitlement::state::AppState;
use daypass_entitlement::usecase::rate_limit::{RateLimitPolicy, RateLimiterState};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = EntitlementConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let limits = Arc::new(RateLimiterState::new(RateLimitPolicy::new(
        config.contact_window_secs,
        config.contact_max_requests,
        config.contact_block_secs,
    )));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Evict stale limiter entries in the background
    let sweep_limits = Arc::clone(&limits);
    let sweep_clock = Arc::clone(&clock);
    let sweep_every = Duration::from_secs(config.rate_limit_sweep_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let dropped = sweep_limits.sweep(sweep_clock.now());
            tracing::debug!(dropped, "rate limiter sweep");
        }
    });

    let state = AppState {
        db,
        mailer: HttpMailer::new(&config.mail_api_url, config.mail_api_key, config.mail_from),
        limits,
        clock,
        hash_cost: bcrypt::DEFAULT_COST,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("entitlement service listening on {addr}");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}
