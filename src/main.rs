use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use weather_history_service::app::Application;
use weather_history_service::config::Config;
use weather_history_service::db::{connect_and_migrate, WeatherStores};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,weather_history_service=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    info!("Starting weather history service with config: {:?}", config);

    let pool = connect_and_migrate(&config.database_url, config.db_max_connections).await?;

    let app = Application::build(config, WeatherStores::postgres(pool)).await?;
    app.run_until_stopped().await
}
