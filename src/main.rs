use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use promscatter::{Args, Orchestrator, QueryOptions, ScatterRenderer, Settings};
use promscatter_client::{HttpTransport, PrometheusClient, TeeTransport};

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let settings = Settings::load(&args)?;

    // Build a tokio runtime
    let rt = tokio::runtime::Runtime::new()?;
    if let Err(e) = rt.block_on(run(settings)) {
        error!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(settings: Settings) -> Result<()> {
    let cancel = CancellationToken::new();

    // Ctrl-C cancels the in-flight request
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling request");
            interrupt.cancel();
        }
    });

    let transport = TeeTransport::new(HttpTransport::new());
    let client = PrometheusClient::new(&settings.address, transport)?;
    let orchestrator = Orchestrator::new(client, ScatterRenderer::new());

    orchestrator
        .run(&QueryOptions::from(&settings), &cancel)
        .await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
