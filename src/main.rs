use std::sync::Arc;

use axum::http::Method;
use axum::{Router, routing::get};
use bookshelf::authors;
use bookshelf::books;
use bookshelf::catalog::Catalog;
use bookshelf::config::{Cli, Config, default_config_dir, default_config_path};
use bookshelf::handler::{AppState, healthcheck};
use bookshelf::store::Store;
use bookshelf::unpack_error;
use clap::Parser;
use tokio::{signal, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    // Determine config path and data directory
    // If --config is provided, use its parent directory for data (database, etc.)
    // Otherwise use ~/.bookshelf/ for both
    let (config_path, data_dir) = match args.config_path {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            (path, dir)
        }
        None => {
            let dir = default_config_dir();
            (default_config_path(), dir)
        }
    };

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt().json().init();
    tracing::info!("bookshelf.svc starting");

    let cfg = Config::new(config_path.to_str().unwrap()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });
    let store = Arc::new(Store::open(data_dir.join(cfg.app.get_db())).unwrap_or_else(|e| {
        tracing::error!(error = %unpack_error(&e), "failed to open document store");
        std::process::exit(1);
    }));
    let catalog = Arc::new(Catalog::new(store).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to set up catalog");
        std::process::exit(1);
    }));

    // Heal any book count drift left over from a previous crash before
    // serving requests
    match catalog.reconcile_book_counts().await {
        Ok(0) => {}
        Ok(n) => tracing::warn!("repaired {} drifted book counts at startup", n),
        Err(e) => {
            tracing::error!(error = %unpack_error(&e), "startup reconciliation failed");
            std::process::exit(1);
        }
    }

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let cancellation_token = CancellationToken::new();
    let (shutdown_complete_tx, mut shutdown_complete_rx) = mpsc::channel::<()>(1);

    // Background task to reconcile author book counts periodically
    let reconcile_catalog = catalog.clone();
    let reconcile_token = cancellation_token.clone();
    let reconcile_done = shutdown_complete_tx.clone();
    let reconcile_interval = std::time::Duration::from_secs(cfg.app.reconcile_interval_seconds);
    tokio::spawn(async move {
        let _done = reconcile_done;
        let mut interval = tokio::time::interval(reconcile_interval);
        interval.tick().await; // first tick fires immediately, startup already reconciled
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match reconcile_catalog.reconcile_book_counts().await {
                        Ok(0) => {}
                        Ok(n) => tracing::warn!("repaired {} drifted book counts", n),
                        Err(e) => tracing::warn!("failed to reconcile book counts: {}", e),
                    }
                }
                _ = reconcile_token.cancelled() => {
                    tracing::info!("reconciliation task shutting down");
                    break;
                }
            }
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(healthcheck))
        .nest("/api/books", books::routes())
        .nest("/api/authors", authors::routes())
        .layer(cors)
        .with_state(AppState { catalog });

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("bookshelf.svc running on {}", &address);
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                tracing::error!(error = %err, "server exited with error");
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("ctrl+c signal received, preparing to shutdown");
            cancellation_token.cancel();
        }
    }

    drop(shutdown_complete_tx);
    shutdown_complete_rx.recv().await;
    tracing::info!("bookshelf.svc going off, graceful shutdown complete");
}
