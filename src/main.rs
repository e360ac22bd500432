use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hopeforall::{
    api,
    config::Settings,
    payments::{CashfreeClient, PaymentGateway, UnconfiguredGateway},
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hopeforall=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting HopeForAll server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    // Initialize the payment gateway if configured
    let gateway: Arc<dyn PaymentGateway> = if settings.cashfree.enabled {
        match CashfreeClient::new(&settings.cashfree) {
            Ok(client) => {
                tracing::info!(base_url = %settings.cashfree.base_url, "Cashfree payment processing enabled");
                Arc::new(client)
            }
            Err(e) => {
                tracing::warn!("Cashfree enabled but misconfigured: {}", e);
                Arc::new(UnconfiguredGateway)
            }
        }
    } else {
        tracing::info!("Cashfree payment processing disabled");
        Arc::new(UnconfiguredGateway)
    };

    if settings.cashfree.webhook_secret.is_none() {
        tracing::warn!("No webhook secret configured; webhook signatures will not be checked");
    }

    let service_context = Arc::new(ServiceContext::new(db_pool, gateway, &settings));

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
