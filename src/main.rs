use anyhow::Context;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use chrono::Utc;
use market_cap_server::{
    create_router, startup, MarketCapRefresher, QuoteProvider, RefreshScheduler, ServerConfig,
    StockStore, YahooProvider,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_cron_scheduler::JobScheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_cap_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Both the HTTPS listener and the quote client use rustls
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut config = ServerConfig::from_env();
    config
        .apply_args(std::env::args().skip(1))
        .context("invalid launch arguments")?;

    let store = Arc::new(StockStore::new(&config.stocks_file));
    let provider = Arc::new(
        YahooProvider::new(config.refresh.provider_timeout())
            .context("failed to create quote provider")?,
    ) as Arc<dyn QuoteProvider>;
    let refresher = Arc::new(MarketCapRefresher::new(
        store,
        provider,
        config.refresh.clone(),
    ));

    tracing::info!("📄 Stock data: {}", config.stocks_file.display());
    tracing::info!("📁 Public directory: {}", config.public_dir.display());

    // Decide on an immediate refresh before the scheduler starts ticking
    let started_at = Utc::now();
    startup::reconcile(&refresher, config.force_refresh, started_at).await;

    initialize_cron_scheduler(refresher.clone(), started_at).await;

    let app = create_router(refresher, &config.public_dir);

    // Optional HTTPS listener alongside the plain one
    if let Some((cert_path, key_path)) = config.tls_paths() {
        initialize_tls_listener(app.clone(), &config.https_addr(), cert_path, key_path).await;
    } else {
        tracing::info!("🔓 HTTPS disabled (SSL_KEY_PATH / SSL_CERT_PATH not set)");
    }

    let addr = config.http_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("🚀 Server running on http://{}", addr);
    tracing::info!("📊 Status: http://{}/market-cap-status", addr);
    tracing::info!("📚 Swagger UI: http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Start the per-minute refresh scheduler
///
/// A scheduler that fails to start is logged; the server keeps serving the
/// data already on disk.
async fn initialize_cron_scheduler(
    refresher: Arc<MarketCapRefresher>,
    started_at: chrono::DateTime<Utc>,
) {
    tracing::info!("⏰ Initializing cron scheduler...");

    let scheduler = match JobScheduler::new().await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!("❌ Failed to create cron scheduler: {}", e);
            return;
        }
    };

    let refresh_scheduler = Arc::new(RefreshScheduler::new(refresher, started_at));
    if let Err(e) = refresh_scheduler.register(&scheduler).await {
        tracing::error!("❌ Failed to register market cap refresh job: {}", e);
        return;
    }

    if let Err(e) = scheduler.start().await {
        tracing::error!("❌ Failed to start cron scheduler: {}", e);
        return;
    }

    tracing::info!("✅ Cron scheduler started successfully");

    // Keep scheduler alive for the lifetime of the process
    std::mem::forget(scheduler);
}

/// Load the certificate and spawn the HTTPS listener
///
/// Any failure only disables HTTPS; the plain listener is unaffected.
async fn initialize_tls_listener(app: Router, addr: &str, cert_path: PathBuf, key_path: PathBuf) {
    let addr: SocketAddr = match addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("❌ Invalid HTTPS address {}: {}", addr, e);
            return;
        }
    };

    let tls_config = match RustlsConfig::from_pem_file(&cert_path, &key_path).await {
        Ok(tls_config) => tls_config,
        Err(e) => {
            tracing::error!(
                "❌ Failed to load TLS certificate ({}, {}): {}",
                cert_path.display(),
                key_path.display(),
                e
            );
            tracing::warn!("⚠️  HTTPS listener disabled");
            return;
        }
    };

    tokio::spawn(async move {
        tracing::info!("🔒 HTTPS server running on https://{}", addr);
        if let Err(e) = axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
        {
            tracing::error!("❌ HTTPS server error: {}", e);
        }
    });
}
