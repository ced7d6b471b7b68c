use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use policyhub_service::config::ServiceConfig;
use policyhub_service::{db, LogNotifier, PgPolicyStore, PolicyService, Result};

/// policyhub-resplit - Rebuild the tagged sections of stored policies against
/// the current compliance framework list.
///
/// Reads DATABASE_URL and DATABASE_MAX_CONNECTIONS from the environment.
#[derive(Parser)]
#[command(name = "policyhub-resplit")]
#[command(version, about, long_about = None)]
struct Args {
    /// Policy ids to re-split (every policy when omitted)
    #[arg(value_name = "POLICY_ID")]
    ids: Vec<Uuid>,
}

/// Returns the number of policies that failed.
async fn run(config: ServiceConfig, ids: Vec<Uuid>) -> Result<usize> {
    let pool = db::connect(&config).await?;

    let service = PolicyService::new(Arc::new(PgPolicyStore::new(pool)), Arc::new(LogNotifier));
    let report = if ids.is_empty() {
        service.resplit_all().await?
    } else {
        service.resplit_policies(&ids).await
    };

    tracing::info!(
        resplit = report.resplit.len(),
        failed = report.failed.len(),
        "re-split finished"
    );
    Ok(report.failed.len())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    match run(config, args.ids).await {
        Ok(0) => {}
        Ok(failed) => {
            tracing::error!(failed, "some policies could not be re-split");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "re-split failed");
            std::process::exit(1);
        }
    }
}
