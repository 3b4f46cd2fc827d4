use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use upsse_converter::{api, AppConfig, ConverterService};

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging with local time
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // Config
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    if !config.data.dir.exists() {
        std::fs::create_dir_all(&config.data.dir)?;
        info!("Created data directory {}", config.data.dir.display());
    }

    let converter = Arc::new(ConverterService::new(config.data.clone()));

    let app = Router::new()
        .route("/health", get(api::health_check))
        .route("/process", post(api::process))
        .with_state(converter)
        .layer(
            ServiceBuilder::new().layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /health");
    info!("  POST /process  - BKHD (+ BM19) -> UpSSE workbook");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
