//! Courier - serves `/info` and `/hello` for one registry-discovered service.

use clap::Parser;
use courier::error::Result;
use courier::settings::Overrides;
use courier::{ConsumerService, ConsumerSettings, HttpTransport, SelectionPolicy, server};
use courier_http_client::HttpClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Registry-backed service consumer
#[derive(Parser)]
#[command(name = "courier")]
#[command(version)]
#[command(about = "Discover a service through a registry and call it over HTTP")]
struct Cli {
    /// Config file (TOML, JSON or .env)
    #[arg(short, long, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Registry address, e.g. http://127.0.0.1:8848
    #[arg(long)]
    registry_addr: Option<String>,

    /// Name of the service to call
    #[arg(long)]
    target_service: Option<String>,

    /// Instance selection policy (first or random)
    #[arg(long)]
    selection: Option<SelectionPolicy>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            server_port: self.port,
            registry_addr: self.registry_addr.clone(),
            target_service: self.target_service.clone(),
            selection: self.selection,
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings =
        ConsumerSettings::load(cli.config.as_deref())?.with_overrides(cli.overrides())?;

    courier::init_tracing(&settings.log_level, settings.log_format)?;

    let client = HttpClient::new(settings.http_client_config())?;
    let transport: Arc<dyn HttpTransport> = Arc::new(client);
    let discovery = settings.build_discovery().await?;

    info!(
        registry = discovery.description(),
        target_service = %settings.target_service,
        selection = %settings.selection,
        "Starting courier"
    );

    let consumer = ConsumerService::new(discovery, transport, settings.target())
        .with_policy(settings.selection);

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
    };

    server::listen(settings.bind_addr()?, Arc::new(consumer), shutdown).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
