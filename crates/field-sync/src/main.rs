use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use field_sync::{flush, AgrilogClient, NewActivityPayload, OfflineQueue, SyncStatus};

#[derive(Debug, Parser)]
#[command(name = "field-sync")]
#[command(about = "Inspect and replay the AgriLog offline activity queue")]
struct Args {
    /// Queue file
    #[arg(long, env = "FIELD_SYNC_QUEUE", default_value = "./data/offline-queue.json")]
    queue: PathBuf,

    /// AgriLog server base URL
    #[arg(long, env = "AGRILOG_URL", default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Session bearer token
    #[arg(long, env = "AGRILOG_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show queued entries and whether the server is reachable
    Status,
    /// Replay queued entries to the server
    Flush,
    /// Queue an activity payload read from a JSON file
    Enqueue { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut queue = OfflineQueue::load(&args.queue)?;

    match args.command {
        Command::Status => {
            let client = AgrilogClient::new(&args.server, args.token)?;
            let online = client.health().await;
            println!("queue: {} ({} entries)", queue.path().display(), queue.len());
            for entry in queue.entries() {
                println!(
                    "  {}  {}  {} for {}",
                    entry.timestamp,
                    entry.id,
                    entry.data.activity_type,
                    entry.data.user_id
                );
            }
            println!(
                "server: {} ({})",
                client.base_url(),
                if online { "online" } else { "offline" }
            );
        }
        Command::Flush => {
            let client = AgrilogClient::new(&args.server, args.token)?;
            if !client.health().await {
                return Err(format!("{} is unreachable; entries stay queued", client.base_url()).into());
            }
            let report = flush(&mut queue, &client).await?;
            println!(
                "attempted {}, synced {}, failed {}",
                report.attempted, report.synced, report.failed
            );
        }
        Command::Enqueue { file } => {
            let text = fs::read_to_string(&file)?;
            let mut payload: NewActivityPayload = serde_json::from_str(&text)?;
            payload.sync_status = SyncStatus::Pending;
            let id = queue.push(payload);
            queue.save()?;
            info!(entry = %id, pending = queue.len(), "Entry queued");
            println!("{id}");
        }
    }

    Ok(())
}
