//! app-server: demo binary around the request-handling core.

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;

use app_server::config::{load_config, AppConfig};
use app_server::lifecycle::{wait_for_signal, Shutdown};
use app_server::observability::{logging, metrics};
use app_server::AppServer;

#[derive(Parser)]
#[command(name = "app-server")]
#[command(about = "HTTP application server", long_about = None)]
struct Cli {
    /// Config file (TOML, or JSON with a `.json` extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename = "Greeting")]
struct Greeting {
    name: String,
    message: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!("app-server v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        pool_capacity = config.context.pool_capacity,
        throttle = config.throttle.enabled,
        slowdown = config.slowdown.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let mut server = AppServer::new(config);
    server
        .get("/", |ctx| {
            Box::pin(async move {
                ctx.send("Hello from app-server")?;
                Ok(())
            })
        })
        .get("/hello/{name}", |ctx| {
            Box::pin(async move {
                let name = ctx.params().get("name").unwrap_or("world").to_string();
                let greeting = Greeting {
                    message: format!("Hello, {name}!"),
                    name,
                };
                ctx.render(&greeting)
            })
        });

    let shutdown = Shutdown::new();
    let serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();
    serving.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
