//! # Voice Chat Backend - Main Application Entry Point
//!
//! This is the main entry point for the voice-chat-backend web server.
//! It sets up an Actix-web HTTP server with the following key features:
//!
//! ## Key Rust Concepts Used:
//! - **async/await**: The entire application is asynchronous
//! - **modules**: Code is organized into separate modules (mod statements)
//! - **Result<T, E>**: Error handling using Rust's Result type
//! - **Trait objects**: Reply, transcription and storage strategies are injected
//!
//! ## Application Architecture:
//! - **config**: Application configuration (TOML file + environment variables)
//! - **state**: Shared application state and metrics
//! - **storage**: File-system port for uploaded audio
//! - **audio**: Upload validation and the upload store
//! - **registry**: Live websocket connections by chat id
//! - **reply / transcription**: Canned reply and mock transcription strategies
//! - **websocket**: Real-time chat channel
//! - **handlers / health**: HTTP endpoints
//! - **middleware**: Request logging and metrics
//! - **error**: Error types and HTTP error responses

mod audio;
mod config;
mod error;
mod handlers;
mod health;
mod middleware;
mod registry;
mod reply;
mod state;
mod storage;
mod transcription;
mod websocket;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use audio::{AudioStore, UploadPolicy};
use config::{AppConfig, MaintenanceConfig};
use reply::KeywordReplies;
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storage::LocalDirStorage;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transcription::MockTranscriber;
use websocket::ChatRegistry;

/// Set once SIGTERM or SIGINT has been received.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

/// The main application entry point.
///
/// ## What this function does:
/// 1. **Loads configuration** from files and environment variables
/// 2. **Sets up logging**
/// 3. **Opens the upload directory** and builds the shared state
/// 4. **Starts the periodic upload cleanup**
/// 5. **Configures the HTTP server** with middleware and routes
/// 6. **Handles graceful shutdown** when receiving system signals
#[actix_web::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting voice-chat-backend v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);

    let storage = LocalDirStorage::open(&config.upload.directory).with_context(|| {
        format!("Failed to open upload directory {}", config.upload.directory.display())
    })?;
    let uploads = AudioStore::new(Arc::new(storage), UploadPolicy::from_config(&config.upload));
    info!("Upload directory: {}", config.upload.directory.display());

    spawn_cleanup_task(uploads.clone(), &config.maintenance);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let app_state = AppState::new(
        config,
        uploads,
        ChatRegistry::new(),
        Arc::new(KeywordReplies),
        Arc::new(MockTranscriber),
    );

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            // Middleware executes in reverse order of registration for requests
            .wrap(cors)
            .wrap(middleware::MetricsMiddleware)
            .wrap(middleware::RequestLogging)
            .wrap(TracingLogger::default())
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health::health_check))
                    .route("/metrics", web::get().to(health::detailed_metrics))
                    .route("/uploads/stats", web::get().to(handlers::upload_stats))
                    .route("/uploads/cleanup", web::post().to(handlers::cleanup_uploads))
                    .route("/sessions/{chat_id}", web::delete().to(handlers::disconnect_session)),
            )
            .route("/", web::get().to(health::heartbeat))
            .route("/health", web::get().to(health::health_check))
            .route("/chat", web::post().to(handlers::chat))
            .route("/transcribe", web::post().to(handlers::transcribe))
            .route("/ws/chat/{chat_id}", web::get().to(websocket::chat_websocket))
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(server_result) => {
                    if let Err(e) = server_result {
                        error!("Server error: {}", e);
                    }
                }
                Err(e) => {
                    error!("Server task error: {}", e);
                }
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Initialize the tracing (logging) system.
///
/// ## Environment Variables:
/// - `RUST_LOG`: Controls what gets logged (e.g., "debug", "voice_chat_backend=debug")
/// - If not set, defaults to "voice_chat_backend=debug,actix_web=info"
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voice_chat_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Sweep old uploads every `cleanup_interval_minutes`.
///
/// The first sweep runs immediately, so files left over from a previous run
/// are collected at startup. An interval of 0 disables the task.
fn spawn_cleanup_task(uploads: AudioStore, maintenance: &MaintenanceConfig) {
    if maintenance.cleanup_interval_minutes == 0 {
        info!("Periodic upload cleanup disabled");
        return;
    }

    let period = Duration::from_secs(maintenance.cleanup_interval_minutes * 60);
    let max_age_hours = maintenance.cleanup_max_age_hours;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let removed = uploads.cleanup(max_age_hours).await;
            if removed > 0 {
                info!("Periodic cleanup removed {} upload(s) older than {}h", removed, max_age_hours);
            }
        }
    });
}

/// Listen for SIGTERM and SIGINT and raise the shutdown flag.
///
/// Graceful shutdown lets the server finish in-flight requests before it
/// stops accepting new ones.
fn setup_signal_handlers() {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async {
        let (mut sigterm, mut sigint) = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to install signal handlers: {}", e);
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

/// Poll the shutdown flag every 100ms.
async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
