//! Command-line and environment configuration.
//!
//! Every setting can be given as a flag or through its `TRANSIT_*`
//! environment variable; the defaults match a local development stack.

use crate::application::orchestrator::PollPolicy;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    /// Base URL of the user service (auth and profile)
    #[arg(long, env = "TRANSIT_USER_SERVICE_URL", default_value = "http://localhost:3000")]
    pub user_url: String,

    /// Base URL of the route service (GraphQL)
    #[arg(long, env = "TRANSIT_ROUTE_SERVICE_URL", default_value = "http://localhost:4000")]
    pub route_url: String,

    /// Base URL of the ticketing service
    #[arg(long, env = "TRANSIT_TICKETING_SERVICE_URL", default_value = "http://localhost:3002")]
    pub ticketing_url: String,

    /// Base URL of the payment service
    #[arg(long, env = "TRANSIT_PAYMENT_SERVICE_URL", default_value = "http://localhost:3004")]
    pub payment_url: String,

    /// Base URL of the wallet service
    #[arg(long, env = "TRANSIT_WALLET_SERVICE_URL", default_value = "http://localhost:3003")]
    pub wallet_url: String,
}

#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Milliseconds between payment status checks
    #[arg(long, env = "TRANSIT_POLL_INTERVAL_MS", default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// Status checks before a pending payment is reported as timed out
    #[arg(
        long,
        env = "TRANSIT_POLL_MAX_ATTEMPTS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub poll_max_attempts: u32,
}

impl From<PollSettings> for PollPolicy {
    fn from(settings: PollSettings) -> Self {
        Self {
            interval: Duration::from_millis(settings.poll_interval_ms),
            max_attempts: settings.poll_max_attempts,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// JSON file holding the session token and cached user
    #[arg(long, env = "TRANSIT_SESSION_FILE", default_value = ".transit-session.json")]
    pub session_file: PathBuf,

    /// RocksDB directory for the session (requires the storage-rocksdb feature)
    #[arg(long, env = "TRANSIT_SESSION_DB")]
    pub session_db: Option<PathBuf>,
}
