use links_stats::config::Config;
use links_stats::server;
use links_stats::state::AppState;
use links_stats::storage::source::DataSource;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    init_tracing();

    // Load configuration
    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref().map(std::path::Path::new));

    let source = DataSource::from_config(&config);
    tracing::info!(
        host = %config.host,
        port = config.port,
        source = %source.describe(),
        snapshot_ttl_secs = config.snapshot_ttl_secs,
        "Starting Links Stats"
    );

    let state = Arc::new(AppState::new(source, &config));

    // Warm the snapshot so a broken source shows up in the startup log.
    // Requests still retry the load, so a failure here is not fatal.
    match state.snapshot().await {
        Ok(snapshot) => tracing::info!(
            items = snapshot.items.len(),
            logs = snapshot.logs.len(),
            "Initial snapshot loaded"
        ),
        Err(e) => tracing::warn!(error = %e, "Initial snapshot load failed"),
    }

    let app = server::build_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %addr, "Listening");
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
    tracing::info!("Shut down");
}

/// `LINKS_STATS_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "links_stats=info,tower_http=info".into());
    let json =
        std::env::var("LINKS_STATS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
