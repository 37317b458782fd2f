use kb_core::ServerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the knowledge base service
///
/// Serves the flat-file HTTP API backing the knowledge-base clients. On first start the
/// collection file is seeded with the shipped base collection.
///
/// # Environment Variables
/// - `KB_REST_ADDR`: Server address (default: "0.0.0.0:3001")
/// - `KB_BOT_FILE`: Collection file (default: "api/bot.json")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the collection file cannot be prepared, or
/// - the server address cannot be bound or the server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kb_run=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ServerConfig::from_env_values(
        std::env::var("KB_REST_ADDR").ok(),
        std::env::var("KB_BOT_FILE").ok(),
    )?;

    tracing::info!("++ Starting knowledge base service on {}", cfg.bind_addr());
    api_rest::serve(&cfg).await
}
