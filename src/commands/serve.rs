//! HTTP server command implementation.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use reportd::config::{self, Config};
use reportd::policy::TaskIdPolicy;
use reportd::reaper::ReportReaper;
use reportd::server::{self, AppState};
use reportd::store::ReportStore;
use reportd::store::file::FileSnapshotStore;

pub async fn run(
    config_path: &str,
    host_override: Option<IpAddr>,
    port_override: Option<u16>,
    snapshots_dir_override: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load(config_path).await?;

    // CLI overrides config
    if let Some(host) = host_override {
        config.server.host = host.to_string();
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }
    if let Some(dir) = snapshots_dir_override {
        config.storage.snapshots_dir = Some(dir.to_path_buf());
    }

    // Resolve the snapshot blob directory relative to the config file
    let config_path_ref = Path::new(config_path);
    let snapshots_dir = config
        .storage
        .snapshots_dir
        .as_ref()
        .map(|p| config::resolve_path(config_path_ref, p))
        .unwrap_or_else(|| {
            config::resolve_path(config_path_ref, Path::new(config::DEFAULT_SNAPSHOTS_DIR))
        });

    let reports = ReportStore::new();
    let snapshots = Arc::new(FileSnapshotStore::new(&snapshots_dir));
    let policy = Arc::new(TaskIdPolicy::new(config.ingest.allowed_prefixes.clone()));
    info!(
        snapshots_dir = %snapshots_dir.display(),
        prefixes = ?policy.prefixes(),
        "Stores initialized"
    );

    // Spawn the report expiry loop
    let (reaper_shutdown_tx, reaper_shutdown_rx) = watch::channel(false);
    let reaper_handle = if config.retention.expiry_seconds > 0 {
        let handle = ReportReaper::new(
            reports.clone(),
            config.retention.expiry_seconds,
            config.retention.sweep_interval_seconds,
        )
        .spawn(reaper_shutdown_rx);
        info!(
            expiry_seconds = config.retention.expiry_seconds,
            sweep_interval_seconds = config.retention.sweep_interval_seconds,
            "Report expiry enabled"
        );
        Some(handle)
    } else {
        info!("Report expiry disabled");
        None
    };

    let state = AppState {
        reports,
        snapshots,
        policy,
    };
    let app = server::build_app(
        state,
        config.server.request_timeout_seconds,
        config.server.max_connections,
    );

    let ip: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the reaper and wait for it to finish its current sweep
    let _ = reaper_shutdown_tx.send(true);
    if let Some(handle) = reaper_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "Reaper task panicked during shutdown");
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
