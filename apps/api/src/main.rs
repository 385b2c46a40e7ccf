mod config;
mod errors;
mod llm_client;
mod routes;
mod screening;
mod state;
mod usage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{init_model, ModelState};
use crate::routes::build_router;
use crate::screening::extract::PdfExtractor;
use crate::screening::Screener;
use crate::state::AppState;
use crate::usage::{FileUsageTracker, NoopUsageTracker, UsageTracker};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("screener_api={}", &config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Screener API v{}", env!("CARGO_PKG_VERSION"));

    // A missing credential degrades instead of aborting so the status
    // endpoints stay reachable.
    let model = init_model(&config);
    match &model {
        ModelState::Ready { name, .. } => info!("Completion client initialized (model: {name})"),
        ModelState::Unavailable { reason } => {
            warn!("Model not initialized ({reason}); screening endpoints will return errors")
        }
    }

    // Usage tracking is opt-in via USAGE_FILE; the default is a no-op.
    let usage: Arc<dyn UsageTracker> = match &config.usage_file {
        Some(path) => {
            let tracker = FileUsageTracker::load(path)?;
            let daily = tracker.daily_stats().await;
            let monthly = tracker.monthly_stats().await;
            info!(
                "Usage tracking enabled ({path}): {} requests on {} ({} free remaining, paid tier: {}); \
                 {} requests in {}, projected {} (est. ${:.2})",
                daily.requests,
                daily.date,
                daily.free_remaining,
                daily.is_paid_tier,
                monthly.requests,
                monthly.month,
                monthly.projected_total,
                monthly.estimated_cost
            );
            Arc::new(tracker)
        }
        None => Arc::new(NoopUsageTracker),
    };

    let screener = Arc::new(Screener::new(model.clone(), Box::new(PdfExtractor), usage));
    let state = AppState { model, screener };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
