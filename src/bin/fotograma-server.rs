use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fotograma::{AppState, ServiceConfig, Workspace, router};

#[derive(Debug, Parser)]
#[command(
    name = "fotograma-server",
    version,
    about = "HTTP service that samples still frames from uploaded videos"
)]
struct Cli {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Bind port.
    #[arg(long, default_value_t = 5000)]
    port: u16,

    /// Root directory for transient uploads.
    #[arg(long, default_value = "uploads")]
    uploads_root: PathBuf,

    /// Root directory for extracted frames.
    #[arg(long, default_value = "frames")]
    frames_root: PathBuf,

    /// HTTP request timeout in seconds.
    #[arg(long, default_value_t = 300)]
    request_timeout_secs: u64,

    /// Maximum accepted upload size, in mebibytes.
    #[arg(long, default_value_t = 512)]
    max_upload_mib: usize,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --- Tracing (also captures the library's `log` records) ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fotograma=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig {
        host: cli.host,
        port: cli.port,
        uploads_root: cli.uploads_root,
        frames_root: cli.frames_root,
        request_timeout_secs: cli.request_timeout_secs,
        max_upload_bytes: cli.max_upload_mib * 1024 * 1024,
    };
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    // --- Storage roots ---
    let workspace = Workspace::create(&config.uploads_root, &config.frames_root)
        .expect("Failed to create storage roots");
    tracing::info!(
        uploads_root = %config.uploads_root.display(),
        frames_root = %config.frames_root.display(),
        "Storage roots ready"
    );

    // --- Router ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid --host address"),
        config.port,
    );
    let app = router(AppState::new(config, workspace));

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts
/// down cleanly whether stopped interactively or by a process manager.
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
