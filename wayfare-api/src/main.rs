use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wayfare_api::{app, AppState};
use wayfare_chat::{BookingTransactionManager, FunctionDispatcher, Orchestrator};
use wayfare_http::{ResilientClient, RetryPolicy};
use wayfare_llm::{ChatClient, LlmConfig};
use wayfare_providers::{AmadeusProvider, FlightProvider, KiwiProvider, ProviderChain};
use wayfare_store::{
    app_config::Config, Db, PostgresBookingRepository, PostgresConversationRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // All configuration is read once here; missing keys abort startup
    // instead of surfacing per request.
    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Wayfare API on port {}", config.server.port);

    let db = Db::connect(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.run_migrations().await.expect("Failed to run migrations");

    let conversations = Arc::new(PostgresConversationRepository::new(db.pool.clone()));
    let bookings = Arc::new(PostgresBookingRepository::new(db.pool.clone()));

    let policy = RetryPolicy::new(
        config.http.max_attempts,
        Duration::from_millis(config.http.base_delay_ms),
    );
    let outbound = Arc::new(
        ResilientClient::new(
            policy.clone(),
            Duration::from_secs(config.http.request_timeout_secs),
        )
        .expect("Failed to build HTTP client"),
    );

    // Providers join the chain in priority order.
    let mut providers: Vec<Arc<dyn FlightProvider>> = Vec::new();
    if let Some(ref settings) = config.providers.amadeus {
        providers.push(Arc::new(AmadeusProvider::new(
            outbound.clone(),
            settings.api_key.clone(),
            settings.base_url.clone(),
        )));
    }
    if let Some(ref settings) = config.providers.kiwi {
        providers.push(Arc::new(KiwiProvider::new(
            outbound.clone(),
            settings.api_key.clone(),
            settings.base_url.clone(),
        )));
    }
    let chain = Arc::new(ProviderChain::new(providers));
    tracing::info!("Flight providers: {:?}", chain.provider_names());

    let llm = Arc::new(ChatClient::new(
        LlmConfig {
            api_key: config.llm.api_key.clone(),
            model: config.llm.model.clone(),
            base_url: config.llm.base_url.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        },
        ResilientClient::new(
            policy.clone(),
            Duration::from_secs(config.http.request_timeout_secs),
        )
        .expect("Failed to build HTTP client"),
    ));

    let dispatcher = FunctionDispatcher::new(
        chain,
        conversations.clone(),
        BookingTransactionManager::new(bookings),
        policy.clone(),
    );
    let orchestrator = Arc::new(Orchestrator::new(
        llm,
        dispatcher,
        conversations,
        policy,
    ));

    let app = app(AppState { orchestrator });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
