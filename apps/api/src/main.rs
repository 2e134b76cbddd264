use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use shared_config::{AppConfig, StoreBackend};
use shared_database::{BookingStore, InMemoryStore, SupabaseStore};
use shared_database::supabase::SupabaseClient;

fn build_store(config: &AppConfig) -> Arc<dyn BookingStore> {
    match config.store_backend {
        StoreBackend::Supabase if config.is_configured() => {
            info!("Using Supabase store at {}", config.supabase_url);
            Arc::new(SupabaseStore::new(Arc::new(SupabaseClient::new(config))))
        }
        StoreBackend::Supabase => {
            warn!("Supabase is not configured, falling back to the in-memory store");
            Arc::new(InMemoryStore::new())
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store, data will not survive a restart");
            Arc::new(InMemoryStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Booking API server");

    let config = Arc::new(AppConfig::from_env());
    let store = build_store(&config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(store, config.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = config.bind_address();
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
