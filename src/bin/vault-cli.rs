use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

use vault_monitor::config::load_or_default;
use vault_monitor::lifecycle::{shutdown_on_signal, Shutdown};
use vault_monitor::observability::logging;
use vault_monitor::resilience::Backoff;
use vault_monitor::timer::{ReconciliationTimer, TimerDriver, TimerSettings, TimerView};
use vault_monitor::transport::{PollTransport, WsTransport};
use vault_monitor::vault::VaultStage;

#[derive(Parser)]
#[command(name = "vault-cli")]
#[command(about = "Management CLI for the vault monitor", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service health
    Health,
    /// Show monitor counters
    Metrics,
    /// Show the tail of today's log
    Logs {
        #[arg(short, long, default_value_t = 20)]
        lines: usize,
    },
    /// Remove log files past retention now
    Cleanup,
    /// Record a vault stage transition
    Transition {
        vault_id: String,
        from: VaultStage,
        to: VaultStage,
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Record a countdown reset
    Reset {
        vault_id: String,
        signature: String,
        amount: f64,
    },
    /// Follow a live countdown feed
    Watch {
        /// WebSocket feed (overrides timer.ws_url)
        #[arg(long)]
        ws: Option<String>,
        /// Polling endpoint (overrides timer.poll_url)
        #[arg(long)]
        poll: Option<String>,
        /// Config file providing the timer section
        #[arg(short, long, default_value = "vault-monitor.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Metrics => {
            let res = client.get(format!("{}/api/metrics", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Logs { lines } => {
            let res = client
                .get(format!("{}/api/logs", cli.url))
                .query(&[("lines", lines)])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Cleanup => {
            let res = client
                .post(format!("{}/api/maintenance/cleanup", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Transition {
            vault_id,
            from,
            to,
            reason,
        } => {
            let res = client
                .post(format!("{}/api/vaults/{}/transitions", cli.url, vault_id))
                .json(&json!({ "from": from, "to": to, "reason": reason }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Reset {
            vault_id,
            signature,
            amount,
        } => {
            let res = client
                .post(format!("{}/api/vaults/{}/resets", cli.url, vault_id))
                .json(&json!({ "signature": signature, "amount": amount }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Watch { ws, poll, config } => watch(client, ws, poll, config).await?,
    }

    Ok(())
}

async fn watch(
    client: reqwest::Client,
    ws: Option<String>,
    poll: Option<String>,
    config_path: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_or_default(&config_path)?;
    logging::init("vault_monitor=warn");

    let non_empty = |url: String| (!url.is_empty()).then_some(url);
    let ws = ws.or_else(|| non_empty(config.timer.ws_url.clone()));
    let poll = poll.or_else(|| non_empty(config.timer.poll_url.clone()));

    let settings = TimerSettings::from(&config.timer);
    let poll_interval = settings.poll_interval;
    let (events_tx, events_rx) = mpsc::channel(64);
    let shutdown = Shutdown::new();

    match (ws, poll) {
        (Some(url), _) => {
            let backoff = Backoff::new(config.timer.reconnect_base_ms, config.timer.reconnect_max_ms);
            let transport = WsTransport::new(url, events_tx, backoff);
            tokio::spawn(transport.run(shutdown.subscribe()));
        }
        (None, Some(url)) => {
            let transport = PollTransport::new(client, url, poll_interval, events_tx);
            tokio::spawn(transport.run(shutdown.subscribe()));
        }
        (None, None) => return Err("no feed configured: pass --ws or --poll".into()),
    }

    let timer = ReconciliationTimer::with_system_clock(settings);
    let (driver, mut views) = TimerDriver::new(timer, events_rx);
    let driver_task = tokio::spawn(driver.run(shutdown.subscribe()));
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let mut stop = shutdown.subscribe();
    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                render(&view)?;
            }
            _ = stop.recv() => break,
        }
    }

    let timer = driver_task.await?;
    println!();
    for record in timer.history() {
        println!(
            "reset by {} ({}) ref {}",
            record.info.address, record.info.amount, record.info.reference
        );
    }
    Ok(())
}

fn render(view: &TimerView) -> std::io::Result<()> {
    let link = if view.connected { "live" } else { "offline" };
    let last = view
        .last_event
        .as_ref()
        .map(|e| format!("  last reset: {} by {}", e.amount, e.address))
        .unwrap_or_default();

    let mut out = std::io::stdout().lock();
    write!(out, "\r{} [{}]{}\x1b[K", view.format_hms(), link, last)?;
    out.flush()
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: vault monitor returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
