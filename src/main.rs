// src/main.rs - Prepare print elements from the command line
use clap::Parser;
use spoolprep::input::parse_element;
use spoolprep::report::ElementSummary;
use spoolprep::{ElementPreparer, PrintJob};
use spoolprep_shared::config::{self, Config};

#[derive(Debug, Parser)]
#[command(name = "spoolprep", version, about = "Prepare print elements and summarize the result")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Per-element deadline in milliseconds, overriding the config
    #[arg(long, conflicts_with = "no_timeout")]
    timeout_ms: Option<u64>,

    /// Wait for every element regardless of how long it takes
    #[arg(long)]
    no_timeout: bool,

    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Elements as <kind>:<path>[,key=value...]
    #[arg(required = true)]
    elements: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries one JSON summary per element.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            config::load_config(path).map_err(|e| {
                tracing::error!("Failed to load config from '{}': {}", path, e);
                Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
            })?
        }
        None => Config::default(),
    };
    if let Some(ms) = cli.timeout_ms {
        config.prepare.timeout_ms = Some(ms);
    }
    if cli.no_timeout {
        config.prepare.timeout_ms = None;
    }
    config.validate()?;

    let preparer = ElementPreparer::from_config(&config);
    let mut job = PrintJob::new();
    for arg in &cli.elements {
        job.append(parse_element(arg, &config.prepare)?);
    }

    tracing::info!("Preparing {} elements for job {}", job.len(), job.id());
    let handles = job.prepare_all(&preparer)?;
    let outcomes = job.wait_all(handles).await;

    let mut failed = 0;
    for outcome in &outcomes {
        if outcome.result.is_err() {
            failed += 1;
        }
        let summary = ElementSummary::new(&outcome.element, Some(&outcome.result));
        println!("{}", serde_json::to_string(&summary)?);
    }

    if failed > 0 {
        tracing::error!("{} of {} elements failed to prepare", failed, outcomes.len());
        std::process::exit(1);
    }
    tracing::info!("Job {} prepared", job.id());
    Ok(())
}
