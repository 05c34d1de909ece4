use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use fundwatch::constants::{run as run_consts, store as store_consts};
use fundwatch::{
    run_forever, run_once, CsrcSearchClient, CsrcSearchConfig, CsvStore, EmailConfig,
    EmailNotifier, Notifier,
};

#[derive(Debug, Parser)]
#[command(
    name = "fundwatch",
    disable_help_subcommand = true,
    about = "Watch the CSRC disclosure platform for new QDII fund filings",
    long_about = "Fetch the recent QDII filing list, merge it into a persisted CSV archive \
        keyed by upload-detail id, and email the truly-new records to the configured recipients.",
    after_help = "Email delivery is configured through EMAIL_ADDRESS, EMAIL_PASSWORD, \
        EMAIL_PROVIDER, and EMAIL_RECIPIENTS; runs without them fetch and archive only."
)]
struct Cli {
    #[arg(long, help = "Keep polling at the configured interval instead of running once")]
    schedule: bool,
    #[arg(
        long,
        value_name = "MINUTES",
        default_value_t = run_consts::DEFAULT_INTERVAL_MINUTES,
        help = "Polling interval in minutes for scheduled mode"
    )]
    interval: u64,
    #[arg(
        long = "store-path",
        value_name = "PATH",
        help = "Archive CSV location (defaults to data/csrc_fund_data.csv)"
    )]
    store_path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let cli = Cli::parse();
    if cli.schedule && cli.interval == 0 {
        error!("--interval must be greater than zero");
        return ExitCode::FAILURE;
    }

    let source = match CsrcSearchClient::new(CsrcSearchConfig::default()) {
        Ok(source) => source,
        Err(err) => {
            error!(%err, "failed to build fetch client");
            return ExitCode::FAILURE;
        }
    };
    let store = CsvStore::new(
        cli.store_path
            .unwrap_or_else(|| PathBuf::from(store_consts::DEFAULT_STORE_PATH)),
    );
    let notifier: Option<EmailNotifier> = match EmailConfig::from_env() {
        Some(config) => Some(EmailNotifier::new(config)),
        None => {
            info!("email not configured; runs will fetch and archive only");
            None
        }
    };
    let notifier_ref = notifier.as_ref().map(|n| n as &dyn Notifier);

    if cli.schedule {
        run_forever(
            &source,
            &store,
            notifier_ref,
            Duration::from_secs(cli.interval * 60),
        );
        ExitCode::SUCCESS
    } else {
        match run_once(&source, &store, notifier_ref) {
            Ok(summary) => {
                info!(
                    new = summary.new_records,
                    total = summary.total,
                    notified = summary.notified,
                    "run complete"
                );
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(%err, "run failed");
                ExitCode::FAILURE
            }
        }
    }
}
