//! SafeWalk routing service entry point

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use safewalk_core::loading::{load_graph, seed::demo_graph};

use safewalk_server::api::{self, AppState};
use safewalk_server::config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "safewalk-server", about = "Safety-weighted pedestrian routing service")]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON graph file (overrides the config file)
    #[arg(long)]
    graph: Option<PathBuf>,
    /// Listen address (overrides the config file)
    #[arg(long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("safewalk_server=info,safewalk_core=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match ServerConfig::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                error!("Failed to read config: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };
    if let Some(graph) = args.graph {
        config.graph_path = Some(graph);
    }
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    let graph = match &config.graph_path {
        Some(path) => match load_graph(path) {
            Ok(graph) => graph,
            Err(err) => {
                error!("Failed to load graph from {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            info!("No graph file configured, using the built-in demo graph");
            demo_graph()
        }
    };
    info!(
        "Serving {} intersections and {} streets (danger policy: {:?})",
        graph.node_count(),
        graph.street_count(),
        config.danger_policy
    );

    let state = Arc::new(AppState::new(graph, config.danger_policy));
    let app = api::create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.listen).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind {}: {err}", config.listen);
            return ExitCode::FAILURE;
        }
    };
    info!("Listening on http://{}", config.listen);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
