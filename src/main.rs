//! Telemetry demo service.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                   TELEMETRY DEMO                      │
//!                      │                                                       │
//!   Client Request     │  ┌──────────┐   ┌────────────┐   ┌───────────────┐  │
//!   ───────────────────┼─▶│  http    │──▶│  handler   │──▶│   upstream    │──┼──▶ Public APIs
//!                      │  │ server + │   │ weather /  │   │ client span + │  │
//!                      │  │ span     │   │ llm / fail │   │ traceparent   │  │
//!                      │  └──────────┘   └─────┬──────┘   └───────────────┘  │
//!                      │                       │                              │
//!                      │        ┌──────────────┴─────────────┐                │
//!                      │        ▼                            ▼                │
//!                      │  ┌────────────┐             ┌──────────────┐         │
//!                      │  │ tracing-   │             │ Logger →     │         │
//!                      │  │ opentelem. │             │ LogBatcher   │         │
//!                      │  └─────┬──────┘             └──────┬───────┘         │
//!                      └────────┼───────────────────────────┼─────────────────┘
//!                               ▼                           ▼
//!                        {endpoint}/v1/traces        {endpoint}/v1/logs
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use telemetry_demo::config::{load_config, DemoConfig};
use telemetry_demo::http::HttpServer;
use telemetry_demo::lifecycle::{wait_for_signal, Shutdown};
use telemetry_demo::logs::{LogBatcher, Logger, OtlpLogExporter, ResourceInfo};
use telemetry_demo::observability;

#[derive(Parser)]
#[command(name = "telemetry-demo", version)]
#[command(about = "Demo HTTP service exporting traces and logs over OTLP", long_about = None)]
struct Args {
    /// TOML config file; defaults and environment overrides apply without it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    // The span exporter owns a blocking HTTP client, so telemetry is set up
    // before the runtime exists and shut down after it is gone.
    let telemetry = observability::init(&config)?;

    tracing::info!(
        service = %config.service.name,
        version = %config.service.version,
        environment = %config.service.environment,
        endpoint = %config.telemetry.endpoint,
        protocol = config.telemetry.protocol.as_str(),
        traces_enabled = config.telemetry.traces_enabled,
        logs_enabled = config.telemetry.logs_enabled,
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(serve(config));
    drop(runtime);

    telemetry.shutdown();
    result
}

async fn serve(config: DemoConfig) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();
    // Fired only after the server has drained, so logs written by in-flight
    // requests make it into the final flush.
    let flush_shutdown = Shutdown::new();

    let batcher = if config.telemetry.logs_enabled {
        let exporter = OtlpLogExporter::new(&config.telemetry)?;
        Some(Arc::new(LogBatcher::new(
            config.logs.clone(),
            ResourceInfo::from(&config.service),
            exporter,
        )))
    } else {
        None
    };
    let flusher = batcher
        .clone()
        .map(|batcher| tokio::spawn(batcher.run(flush_shutdown.subscribe())));
    let logger = Logger::new(batcher.clone());

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    let server = HttpServer::new(config, logger.clone(), batcher)?;
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    logger.info(
        "Service started",
        &[("server.address", local_addr.to_string().into())],
    );

    let finished = tokio::select! {
        signal = wait_for_signal() => {
            tracing::info!(signal, "Shutdown signal received");
            None
        }
        result = &mut server_task => Some(result),
    };

    logger.info("Service stopping", &[]);
    shutdown.trigger();

    let server_result = match finished {
        Some(result) => result,
        None => server_task.await,
    };

    flush_shutdown.trigger();

    if let Some(flusher) = flusher {
        if let Err(e) = flusher.await {
            tracing::error!(error = %e, "Log flusher task failed");
        }
    }

    server_result??;
    tracing::info!("Shutdown complete");
    Ok(())
}
