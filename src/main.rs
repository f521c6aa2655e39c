//! Authbox - Minimal Authentication API
//! Mission: Register, login, logout, refresh, and identity lookup over JWT

use anyhow::{Context, Result};
use chrono::Utc;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::{net::TcpListener, time::interval};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authbox_backend::{
    api::create_router,
    auth::{AuthState, JwtHandler, PasswordHasher, RevocationLedger, UserStore},
    config::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;

    let user_store = Arc::new(UserStore::new(
        &config.database_path,
        config.database_echo,
    )?);
    let revocation = Arc::new(RevocationLedger::new(
        &config.database_path,
        config.database_echo,
    )?);
    let jwt_handler = Arc::new(JwtHandler::new(
        config.jwt_secret.clone(),
        config.access_ttl_minutes,
        config.refresh_ttl_days,
    ));
    let hasher = PasswordHasher::new(config.bcrypt_cost);

    let state = AuthState::new(
        user_store,
        revocation.clone(),
        jwt_handler,
        hasher,
    );

    // Denylist rows older than the refresh TTL name tokens that have
    // expired on their own; drop them periodically to bound growth.
    tokio::spawn(revocation_pruning(
        revocation,
        config.prune_interval_secs,
        config.refresh_ttl_days,
    ));

    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filter support
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authbox_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Periodic denylist maintenance. Failures are logged and the next
/// tick tries again; this task never takes the process down.
async fn revocation_pruning(
    ledger: Arc<RevocationLedger>,
    interval_secs: u64,
    refresh_ttl_days: i64,
) {
    let mut ticker = interval(std::time::Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;

        let cutoff = Utc::now() - chrono::Duration::days(refresh_ttl_days);
        if let Err(e) = ledger.prune_older_than(cutoff) {
            warn!("Denylist pruning failed: {}", e);
        }
    }
}
