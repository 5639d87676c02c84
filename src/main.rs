use mimalloc::MiMalloc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use subtrack::config::Config;
use subtrack::router::{SubtrackState, subtrack_router};
use subtrack::service::{onboarding_actor, reminders};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        proxy = %cfg.oauth.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.basic.loglevel,
        default_currency = %cfg.defaults.currency_code,
        oauth_configured = !cfg.oauth.client_id.is_empty()
    );

    let storage = subtrack::db::connect(&cfg.basic.database_url).await?;
    let onboarding = onboarding_actor::spawn().await?;

    if cfg.basic.reminder_interval_secs > 0 {
        reminders::spawn_reminder_task(
            storage.clone(),
            Duration::from_secs(cfg.basic.reminder_interval_secs),
        );
    }

    let addr = cfg.basic.listen_addr.clone();
    let state = SubtrackState::new(storage, cfg, onboarding)?;
    let app = subtrack_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
