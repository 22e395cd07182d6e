use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paygate::config::EngineConfig;
use paygate::engine::JobEngine;
use paygate::simulator::{EchoExecutor, SimulatedProvider};
use paygate::store::InMemoryJobStore;
use std::sync::Arc;
use std::time::Duration;

/// Run one payment-gated query end-to-end against a simulated payment
/// network, printing the receipt and each status snapshot as JSON.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Query text to submit
    input: String,

    /// Caller identifier recorded on the job
    #[arg(long, default_value = "local-requester")]
    requester: String,

    /// Number of status polls before the simulated payment confirms
    #[arg(long, default_value_t = 2)]
    confirm_after: u32,

    /// Monitor poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig {
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
        ..EngineConfig::default()
    };
    let engine = JobEngine::new(
        config,
        Arc::new(InMemoryJobStore::new()),
        Arc::new(SimulatedProvider::new(cli.confirm_after)),
        Arc::new(EchoExecutor),
    );

    let receipt = engine
        .create_job(&cli.requester, &cli.input)
        .await
        .into_diagnostic()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&receipt).into_diagnostic()?
    );

    loop {
        let view = engine.get_status(&receipt.job_id).await.into_diagnostic()?;
        println!("{}", serde_json::to_string(&view).into_diagnostic()?);
        if view.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(cli.poll_interval_ms)).await;
    }

    Ok(())
}
