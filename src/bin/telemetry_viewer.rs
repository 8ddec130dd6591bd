//! # Telemetry Viewer CLI
//!
//! Command-line tool for querying a running relay's history server.
//!
//! Usage:
//!   telemetry_viewer history <ids> [--start MS] [--end MS]
//!   telemetry_viewer history <ids> --last-ms 60000
//!   telemetry_viewer health

use clap::{Parser, Subcommand};
use relay::client::HistoryClient;
use relay::types::{now_ms, ChannelId, Sample, SampleValue};
use relay::service::request::parse_channel_list;

#[derive(Parser)]
#[command(name = "telemetry_viewer")]
#[command(about = "Query telemetry history from a relay", long_about = None)]
struct Cli {
    /// Base URL of the history server
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show samples for one or more channels
    History {
        /// Comma-separated channel IDs (e.g. prop.fuel,pwr.v)
        ids: String,

        /// Exclusive start timestamp (Unix ms)
        #[arg(long)]
        start: Option<f64>,

        /// Exclusive end timestamp (Unix ms)
        #[arg(long)]
        end: Option<f64>,

        /// Window ending now; overrides --start and --end
        #[arg(long)]
        last_ms: Option<u64>,

        /// Print raw JSON instead of one line per sample
        #[arg(long)]
        json: bool,
    },

    /// Show server health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = HistoryClient::new(cli.url);

    match cli.command {
        Commands::History {
            ids,
            start,
            end,
            last_ms,
            json,
        } => {
            let ids: Vec<ChannelId> = parse_channel_list(&ids);
            let (start, end) = match last_ms {
                Some(window) => {
                    let now = now_ms();
                    (now.saturating_sub(window) as f64, (now + 1) as f64)
                }
                None => (
                    start.unwrap_or(f64::NEG_INFINITY),
                    end.unwrap_or(f64::INFINITY),
                ),
            };

            let samples = client.query(&ids, start, end).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&samples)?);
            } else {
                println!("📡 {} samples\n", samples.len());
                for sample in &samples {
                    print_sample(sample);
                }
            }
        }

        Commands::Health => {
            let health = client.health().await?;

            println!("🩺 Relay Health\n");
            println!("Status:       {}", health.status);
            println!("Uptime:       {} s", health.uptime_secs);
            println!("Channels:     {}", health.channels);
            println!("Samples:      {}", health.samples);
            println!("Subscribers:  {}", health.subscribers);
        }
    }

    Ok(())
}

fn print_sample(sample: &Sample) {
    let value = match &sample.value {
        SampleValue::Number(n) => format!("{:.3}", n),
        SampleValue::Text(s) => s.clone(),
    };
    println!("{:>14}  {:<16} {}", sample.timestamp, sample.id, value);
}
