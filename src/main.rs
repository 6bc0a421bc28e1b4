use course_portal::{
    AccessPolicy, AppState, JsonCatalog,
    catalog::CatalogState,
    config::{AppConfig, Env},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point: initializes configuration, logging, the
/// access policy and the catalog, then starts the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env settings before configuration is read.
    dotenv::dotenv().ok();
    // AppConfig::load() panics on a missing production session secret.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise debug for this crate and info for tower-http.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "course_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for reading in a terminal.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: one JSON object per line for log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Access Policy
    // The built-in rules unless ACCESS_POLICY_FILE replaces them. A bad
    // pattern or document stops startup here, never at request time.
    let policy = match &config.policy_file {
        Some(path) => {
            tracing::info!("Loading access policy from {}", path.display());
            AccessPolicy::from_file(path)
        }
        None => AccessPolicy::standard(),
    }
    .expect("FATAL: Failed to build the access policy.");

    tracing::info!(
        rules = policy.rules().len(),
        public_paths = policy.public_paths().len(),
        "Access policy ready"
    );

    // 5. Catalog Initialization
    // Fixtures are read once; handlers only ever see the in-memory copy.
    let catalog = JsonCatalog::load(&config.data_dir)
        .await
        .expect("FATAL: Failed to load catalog fixtures. Check DATA_DIR.");
    let catalog = Arc::new(catalog) as CatalogState;

    // 6. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        catalog,
        policy: Arc::new(policy),
        config,
    };

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    // The long-running Axum server process.
    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
