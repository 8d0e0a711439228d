//! vault-monitor
//!
//! Monitoring and logging service for the vault countdown product.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────┐
//!                 │                  VAULT MONITOR                   │
//!                 │                                                  │
//!   HTTP Request  │  ┌─────────┐   ┌────────────┐   ┌────────────┐   │
//!   ──────────────┼─▶│  http   │──▶│ middleware │──▶│  handlers  │   │
//!                 │  │ server  │   │ log/errors │   └─────┬──────┘   │
//!                 │  └─────────┘   └─────┬──────┘         │          │
//!                 │                      ▼                ▼          │
//!                 │               ┌──────────────────────────┐       │
//!                 │               │  observability::Monitor  │──▶ logs/app-YYYY-MM-DD.log
//!                 │               │ counters · last error    │──▶ console (tracing)
//!                 │               └────────────┬─────────────┘──▶ /metrics (Prometheus)
//!                 │                            │                     │
//!                 │   ┌────────┐   ┌──────────┴─┐   ┌───────────┐  │
//!                 │   │ config │   │   health   │   │ lifecycle │  │
//!                 │   │ +watch │   │  classify  │   │ shutdown  │  │
//!                 │   └────────┘   └────────────┘   └───────────┘  │
//!                 └──────────────────────────────────────────────────┘
//! ```
//!
//! The countdown reconciliation timer (`timer`, `transport`) is a client-side
//! component; `vault-cli watch` drives it against a live feed.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vault-monitor")]
#[command(about = "Vault monitoring and logging service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file (defaults apply when absent)
    #[arg(short, long, default_value = "vault-monitor.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    vault_monitor::lifecycle::run(&args.config).await
}
