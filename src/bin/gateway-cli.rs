use api_gateway::http::introspection::{ServiceList, HEALTH_PATH, SERVICES_PATH};
use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Inspect a running API gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show gateway liveness and uptime
    Health,
    /// List registered backend services
    Services {
        /// Print the raw JSON document
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{base}{HEALTH_PATH}")).send().await?;
            print_response(res).await?;
        }
        Commands::Services { json: true } => {
            let res = client.get(format!("{base}{SERVICES_PATH}")).send().await?;
            print_response(res).await?;
        }
        Commands::Services { json: false } => {
            let res = client.get(format!("{base}{SERVICES_PATH}")).send().await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }
            let list: ServiceList = res.json().await?;
            println!("{} service(s)", list.total);
            for service in &list.services {
                println!(
                    "  {:<32} {:<24} {}  ({})",
                    service.prefix, service.name, service.url, service.description
                );
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
