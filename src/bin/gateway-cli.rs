use clap::{Parser, Subcommand};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the Clinic API Gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000", env = "GATEWAY_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the gateway's service descriptor
    Status,
    /// Probe every backend through the gateway
    Health,
    /// Send a request through the gateway
    Call {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,
        /// Path including the service prefix, e.g. /patients/42
        path: String,
        /// Bearer token to present
        #[arg(short, long, env = "GATEWAY_TOKEN")]
        token: Option<String>,
        /// Request body, sent as JSON
        #[arg(short, long)]
        data: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Call {
            method,
            path,
            token,
            data,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let path = if path.starts_with('/') {
                path
            } else {
                format!("/{}", path)
            };

            // Tag the call so it can be found in the gateway's logs.
            let request_id = Uuid::new_v4().to_string();
            eprintln!("x-request-id: {}", request_id);

            let mut req = client
                .request(method, format!("{}{}", base, path))
                .header("x-request-id", request_id);
            if let Some(token) = token {
                req = req.bearer_auth(token);
            }
            if let Some(data) = data {
                req = req.header(CONTENT_TYPE, "application/json").body(data);
            }

            print_response(req.send().await?).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
