use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "tracker-cli")]
#[command(about = "Command-line client for the India Post tracking API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "TRACKER_URL", default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service liveness
    Health,
    /// Track a single article
    Track {
        id: String,
        /// Return canned demo data instead of querying the portal
        #[arg(long)]
        demo: bool,
        /// Only list flight events
        #[arg(long)]
        flight_only: bool,
    },
    /// Track several articles at once (order is preserved)
    Bulk {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        demo: bool,
        #[arg(long)]
        flight_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Track {
            id,
            demo,
            flight_only,
        } => {
            let mut url = reqwest::Url::parse(&format!("{}/track", base))?;
            url.query_pairs_mut()
                .append_pair("id", &id)
                .append_pair("demo", if demo { "true" } else { "false" })
                .append_pair("flightOnly", if flight_only { "true" } else { "false" });
            let res = client.get(url).send().await?;
            print_response(res).await?;
        }
        Commands::Bulk {
            ids,
            demo,
            flight_only,
        } => {
            let body = json!({
                "tracking_numbers": ids,
                "demo": demo,
                "flightOnly": flight_only,
            });
            let res = client
                .post(format!("{}/track/bulk", base))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: tracking API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
