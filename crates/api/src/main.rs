use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pitch_core::assets::AssetStore;
use pitch_events::{EventBus, EventPersistence};
use pitch_pipeline::{
    GenerationStore, GenerationWorkflow, InMemoryGenerationStore, PgGenerationStore,
    VoiceProfiles,
};
use pitch_providers::{ElevenLabsClient, LocalAssetStore, OpenAiScriptClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pitch_api::config::ServerConfig;
use pitch_api::router::build_app_router;
use pitch_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pitch_api=debug,pitch_pipeline=debug,pitch_providers=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    if config.request_timeout_secs <= config.max_upstream_timeout_secs() {
        tracing::warn!(
            request_timeout_secs = config.request_timeout_secs,
            upstream_timeout_secs = config.max_upstream_timeout_secs(),
            "Request timeout does not exceed the upstream timeouts; slow stages may be cut off"
        );
    }

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // --- Record store ---
    let (pool, store, persistence_handle): (_, Arc<dyn GenerationStore>, _) =
        match config.database_url.as_deref() {
            Some(database_url) => {
                let pool = pitch_db::create_pool(database_url)
                    .await
                    .expect("Failed to connect to database");
                tracing::info!("Database connection pool created");

                pitch_db::health_check(&pool)
                    .await
                    .expect("Database health check failed");
                tracing::info!("Database health check passed");

                pitch_db::run_migrations(&pool)
                    .await
                    .expect("Failed to run database migrations");
                tracing::info!("Database migrations applied");

                // Spawn event persistence (writes all events to the database).
                let handle = tokio::spawn(EventPersistence::run(
                    pool.clone(),
                    event_bus.subscribe(),
                ));

                let store = Arc::new(PgGenerationStore::new(pool.clone()));
                (Some(pool), store as Arc<dyn GenerationStore>, Some(handle))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, records are kept in memory only");
                let store = Arc::new(InMemoryGenerationStore::new());
                (None, store as Arc<dyn GenerationStore>, None)
            }
        };

    // --- Audio storage ---
    let assets: Arc<dyn AssetStore> = Arc::new(
        LocalAssetStore::open(config.audio_storage_dir.clone())
            .await
            .expect("Failed to open audio storage directory"),
    );
    tracing::info!(dir = %config.audio_storage_dir.display(), "Audio storage ready");

    // --- Providers ---
    if config.openai.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY not set, script generation will fail");
    }
    if config.elevenlabs.api_key.is_empty() {
        tracing::warn!("ELEVENLABS_API_KEY not set, audio generation will fail");
    }

    let profiles = VoiceProfiles {
        preview: config.elevenlabs.preview_profile(),
        hq: config.elevenlabs.hq_profile(),
    };
    let scripts = OpenAiScriptClient::new(config.openai.clone())
        .expect("Failed to build script writer HTTP client");
    let voices = ElevenLabsClient::new(config.elevenlabs.clone())
        .expect("Failed to build voice synthesis HTTP client");

    // --- Workflow ---
    let workflow = Arc::new(GenerationWorkflow::new(
        store,
        Arc::new(scripts),
        Arc::new(voices),
        Arc::clone(&assets),
        profiles,
        Arc::clone(&event_bus),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        workflow,
        assets,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // The router (and the workflow's bus handle) went with `serve`. Dropping
    // the last sender closes the channel so persistence drains and exits.
    drop(event_bus);
    if let Some(handle) = persistence_handle {
        let timeout = Duration::from_secs(config.shutdown_timeout_secs);
        if tokio::time::timeout(timeout, handle).await.is_err() {
            tracing::warn!("Event persistence did not finish before the shutdown timeout");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
