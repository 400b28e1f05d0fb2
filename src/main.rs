use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use medvision_relay::services::{ChatHistoryStore, GroqClient, InMemoryHistory, VisionModel};
use medvision_relay::web::server::create_router;
use medvision_relay::{Config, ImageQueryRelay};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("🚀 Starting MedVision relay server...");

    // Fails here, before any route is served, when GROQ_API_KEY is missing
    let config = Config::from_env()?;

    let groq: Arc<dyn VisionModel> = Arc::new(GroqClient::new(&config)?);
    log::info!(
        "✅ Groq client initialized (explanation: {}, medications: {}, timeout: {:?})",
        config.explanation_model,
        config.medication_model,
        config.request_timeout
    );

    let relay = Arc::new(ImageQueryRelay::new(groq, &config));
    let history: Arc<dyn ChatHistoryStore> =
        Arc::new(InMemoryHistory::with_limit(config.history_limit));
    match config.history_limit {
        Some(limit) => log::info!("✅ Chat history initialized (last {} entries)", limit),
        None => log::info!("✅ Chat history initialized (unbounded, in memory)"),
    }

    let app = create_router(relay, history).context("Failed to compile chat page template")?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    log::info!("🌐 Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("🛑 Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("❌ Failed to listen for Ctrl+C: {}", e);
    }
}
