use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Query a running Mailgun proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy liveness
    Health,
    /// List the domains of an account
    Domains { account: String },
    /// Event totals for an account, or one of its domains
    Stats {
        account: String,
        domain: Option<String>,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Events of one domain
    Events {
        account: String,
        domain: String,
        #[arg(long)]
        begin: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        ascending: Option<String>,
    },
    /// Follow a pagination link returned by `events`
    Page { account: String, link: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Health => client.get(format!("{base}/health")),
        Commands::Domains { account } => client.get(format!("{base}/api/domains/{account}")),
        Commands::Stats {
            account,
            domain,
            start,
            end,
        } => {
            let path = match domain {
                Some(domain) => format!("{base}/api/domains/stats/{account}/{domain}"),
                None => format!("{base}/api/domains/stats/{account}"),
            };
            client.get(path).query(&[("start", start), ("end", end)])
        }
        Commands::Events {
            account,
            domain,
            begin,
            end,
            event,
            limit,
            ascending,
        } => {
            let mut query = vec![("begin", begin), ("end", end)];
            if let Some(event) = event {
                query.push(("event", event));
            }
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }
            if let Some(ascending) = ascending {
                query.push(("ascending", ascending));
            }
            client
                .get(format!("{base}/api/domains/events/{account}/{domain}"))
                .query(&query)
        }
        Commands::Page { account, link } => client
            .get(format!("{base}/api/domains/events/pagination/{account}"))
            .query(&[("url", link)]),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;

    match serde_json::from_str::<Value>(&body) {
        Ok(json) => {
            if !status.is_success() {
                eprintln!("Error: proxy returned status {}", status);
            }
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Err(_) => {
            eprintln!("Error: proxy returned status {}", status);
            eprintln!("Response: {}", body);
        }
    }
    Ok(())
}
