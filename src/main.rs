use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seat_monitor::{app, config::Config, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Seat Monitor gateway");

    // Create the shared application state (backend client + seat-state source)
    let state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            // Например, не поднялась push-подписка: работать дальше не с чем.
            error!("Failed to initialize application state: {e:#}");
            std::process::exit(1);
        }
    };
    info!("Detection backend at {}", state.backend.base_url());

    // --- Start the web server ---

    // Браузерная панель живёт на другом origin, поэтому CORS открыт.
    let router = app(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, router.into_make_service())
        .await
        .unwrap();
}
