use std::sync::Arc;
use std::time::Duration;

use polycabinet::api::router::create_router;
use polycabinet::config::AppConfig;
use polycabinet::polymarket::PolymarketGateway;
use polycabinet::services::scheduler;
use polycabinet::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let db = db::init_pool(&config.database_url).await?;
    tracing::info!("Database connected");

    sqlx::migrate!("./migrations").run(&db).await?;

    let metrics_handle = metrics::init_metrics()?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let gateway = Arc::new(PolymarketGateway::new(http, &config));

    scheduler::spawn_background_jobs(db.clone(), gateway.clone(), &config);

    let state = AppState {
        db,
        config,
        gateway,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
