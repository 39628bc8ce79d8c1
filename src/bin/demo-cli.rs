use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Parser)]
#[command(name = "demo-cli")]
#[command(about = "Management and traffic CLI for the telemetry demo service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Admin API key (bearer token).
    #[arg(short, long, default_value = "CHANGE_ME")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Service status (admin)
    Status,
    /// Log exporter counters (admin)
    Logs,
    /// Force a log flush (admin)
    Flush,
    /// Current weather for a city
    Weather {
        #[arg(long)]
        city: Option<String>,
    },
    /// Random quote
    Quote,
    /// Random joke
    Joke,
    /// Ask the mock LLM
    Chat {
        prompt: String,
        #[arg(long)]
        model: Option<String>,
    },
    /// Trigger a simulated failure (error, timeout, slow, random, exception)
    Fail {
        #[arg(value_name = "TYPE")]
        kind: String,
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Send a mix of requests and print a status histogram
    Traffic {
        #[arg(long, default_value_t = 100)]
        requests: usize,
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
    },
}

/// Endpoints cycled through by `traffic`.
const TRAFFIC_MIX: &[&str] = &[
    "/health",
    "/api/weather",
    "/api/quote",
    "/api/joke",
    "/api/llm/models",
    "/api/fail?type=random&rate=0.2",
    "/api/fail?type=slow&delay_ms=200",
    "/api/sdk-test",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/').to_string();

    let mut admin_headers = HeaderMap::new();
    admin_headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", base))
                .headers(admin_headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Logs => {
            let res = client
                .get(format!("{}/admin/logs", base))
                .headers(admin_headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Flush => {
            let res = client
                .post(format!("{}/admin/logs/flush", base))
                .headers(admin_headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Weather { city } => {
            let mut request = client.get(format!("{}/api/weather", base));
            if let Some(city) = city {
                request = request.query(&[("city", city)]);
            }
            print_response(request.send().await?).await?;
        }
        Commands::Quote => {
            let res = client.get(format!("{}/api/quote", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Joke => {
            let res = client.get(format!("{}/api/joke", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Chat { prompt, model } => {
            let res = client
                .post(format!("{}/api/llm/chat", base))
                .json(&json!({ "prompt": prompt, "model": model }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Fail { kind, delay_ms } => {
            let mut query = vec![("type", kind)];
            if let Some(delay) = delay_ms {
                query.push(("delay_ms", delay.to_string()));
            }
            let res = client
                .get(format!("{}/api/fail", base))
                .query(&query)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Traffic {
            requests,
            concurrency,
        } => {
            run_traffic(client, &base, requests, concurrency.max(1)).await;
        }
    }

    Ok(())
}

async fn run_traffic(client: reqwest::Client, base: &str, requests: usize, concurrency: usize) {
    let permits = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();
    let started = Instant::now();

    for i in 0..requests {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let client = client.clone();
        let path = TRAFFIC_MIX[i % TRAFFIC_MIX.len()];
        let url = format!("{}{}", base, path);

        tasks.spawn(async move {
            let outcome = match client.get(url).send().await {
                Ok(res) => res.status().as_u16().to_string(),
                Err(e) if e.is_timeout() => "timeout".to_string(),
                Err(_) => "error".to_string(),
            };
            drop(permit);
            outcome
        });
    }

    let mut histogram: BTreeMap<String, usize> = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.unwrap_or_else(|_| "panicked".to_string());
        *histogram.entry(outcome).or_default() += 1;
    }

    let elapsed = started.elapsed();
    println!(
        "{} requests in {:.2}s ({:.1} req/s)",
        requests,
        elapsed.as_secs_f64(),
        requests as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    for (status, count) in &histogram {
        println!("  {:>8}  {:>6}  {}", status, count, "#".repeat((count * 40 / requests.max(1)).max(1)));
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = serde_json::from_str::<Value>(&text)
        .and_then(|json| serde_json::to_string_pretty(&json))
        .unwrap_or(text);

    if status.is_success() {
        println!("{}", body);
    } else {
        eprintln!("Error: service returned status {}", status);
        eprintln!("{}", body);
    }
    Ok(())
}
