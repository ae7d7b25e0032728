use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pledge_engine::application::orchestrator::{Collaborators, PaymentOrchestrator};
use pledge_engine::config::{CheckoutConfig, Environment};
use pledge_engine::domain::money::Currency;
use pledge_engine::domain::ports::PledgeStoreBox;
use pledge_engine::infrastructure::challenge::SharedSecretVerifier;
use pledge_engine::infrastructure::fees::RateFeeLocalizer;
use pledge_engine::infrastructure::gateway::{SandboxGateway, TimeoutGateway};
use pledge_engine::infrastructure::in_memory::InMemoryPledgeStore;
use pledge_engine::infrastructure::mailer::ChannelMailer;
use pledge_engine::interfaces::csv::rate_reader::RateReader;
use pledge_engine::interfaces::json::catalog::Catalog;
use pledge_engine::interfaces::json::request_reader::RequestReader;
use pledge_engine::interfaces::json::result_writer::ResultWriter;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Checkout requests, one JSON object per line
    input: PathBuf,

    /// JSON file with the projects and rewards on offer
    #[arg(long, env = "PLEDGE_CATALOG")]
    catalog: PathBuf,

    /// CSV file of `currency,rate` against the base currency
    #[arg(long, env = "PLEDGE_RATES")]
    rates: PathBuf,

    /// Path to persistent pledge storage (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    #[arg(long, value_enum, env = "PLEDGE_ENVIRONMENT", default_value_t = Environment::Sandbox)]
    environment: Environment,

    /// Currency assumed when a session does not pick one
    #[arg(long, env = "PLEDGE_BASE_CURRENCY", default_value = "mxn")]
    base_currency: String,

    #[arg(long, env = "PLEDGE_GATEWAY_TIMEOUT_MS", default_value_t = 30_000)]
    gateway_timeout_ms: u64,

    /// Expected anti-abuse challenge response in live mode
    #[arg(long, env = "PLEDGE_CHALLENGE_SECRET")]
    challenge_secret: Option<String>,

    /// Prefix of the redirect returned for approved pledges
    #[arg(long, env = "PLEDGE_SUCCESS_PATH", default_value = "/pledges")]
    success_path: String,
}

fn open_pledge_store(db_path: Option<PathBuf>) -> Result<PledgeStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            use pledge_engine::infrastructure::rocksdb::RocksDBPledgeStore;
            let store = RocksDBPledgeStore::open(path).into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
            );
            Ok(Box::new(InMemoryPledgeStore::new()))
        }
        None => Ok(Box::new(InMemoryPledgeStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let base_currency = Currency::parse(&cli.base_currency).into_diagnostic()?;
    let config = CheckoutConfig::new(cli.environment, base_currency, cli.success_path);

    let catalog = Catalog::from_reader(BufReader::new(File::open(&cli.catalog).into_diagnostic()?))
        .into_diagnostic()?;
    let (projects, rewards) = catalog.into_stores().await;
    let rates = RateReader::new(File::open(&cli.rates).into_diagnostic()?)
        .into_cache()
        .await
        .into_diagnostic()?;

    let gateway = TimeoutGateway::new(
        Box::new(SandboxGateway::new()),
        Duration::from_millis(cli.gateway_timeout_ms),
    );
    let verifier = match cli.challenge_secret {
        Some(secret) => SharedSecretVerifier::new(secret),
        None => SharedSecretVerifier::disabled(),
    };
    let (mailer, mail_worker) = ChannelMailer::spawn_logging();

    let orchestrator = PaymentOrchestrator::new(
        Collaborators {
            projects: Box::new(projects),
            rewards: Box::new(rewards),
            pledges: open_pledge_store(cli.db_path)?,
            rates: Box::new(rates.clone()),
            gateway: Box::new(gateway),
            verifier: Box::new(verifier),
            fees: Box::new(RateFeeLocalizer::new(Box::new(rates))),
            notifier: Box::new(mailer),
        },
        config,
    );

    let input = BufReader::new(File::open(cli.input).into_diagnostic()?);
    let stdout = io::stdout();
    let mut writer = ResultWriter::new(stdout.lock());
    for request in RequestReader::new(input).requests() {
        match request {
            Ok(request) => {
                let result = orchestrator.process(&request).await;
                writer.write_result(&result).into_diagnostic()?;
            }
            Err(e) => {
                error!(error = %e, "Error reading checkout request");
            }
        }
    }
    writer.flush().into_diagnostic()?;

    // Dropping the orchestrator closes the mail queue so the worker can finish.
    drop(orchestrator);
    let delivered = mail_worker.await.into_diagnostic()?;
    info!(delivered, "mail queue drained");

    Ok(())
}
