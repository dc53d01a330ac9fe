// Entry point for the market insights service.
//
// `serve` (the default) loads the dataset once and answers the aggregate and
// forecast endpoints from memory. `report` runs the default queries offline,
// prints a preview of each table and exports them to files.
mod api;
mod config;
mod error;
mod forecast;
mod loader;
mod output;
mod reports;
mod types;
mod util;

use clap::Parser;
use config::{Cli, Command};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use types::Record;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    info!("Loading dataset from {}", cli.data_path.display());
    let data_path = cli.data_path.clone();
    let dataset = tokio::task::spawn_blocking(move || loader::load_or_empty(&data_path))
        .await
        .unwrap_or_else(|e| {
            error!("Dataset loader crashed: {e}");
            Vec::new()
        });

    match cli.command {
        Some(Command::Report(args)) => {
            let outcomes = reports::write_report(&dataset, &args.out_dir, args.preview_rows);
            let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
            if failed > 0 {
                error!("{failed} of {} report outputs could not be written", outcomes.len());
            }
        }
        Some(Command::Serve) | None => serve(dataset, &cli.host, cli.port).await,
    }
}

async fn serve(dataset: Vec<Record>, host: &str, port: u16) {
    let app = api::build_router(dataset);

    let address = format!("{host}:{port}");
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {address}: {e}"));
    info!("Server running on http://{address}");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
    }

    info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
