mod config;
mod runner;

use anyhow::Result;
use clap::Parser;
use cqlkit::{Consistency, Session};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cql-runner")]
#[command(about = "Run a single CQL statement against a ScyllaDB or Cassandra cluster")]
struct Args {
    #[arg(short, long, default_value = "config/cql-runner.yaml")]
    config: String,

    /// Statement text, with `?` or `:name` markers for values
    statement: String,

    /// Bound value, in order; parsed as JSON, otherwise taken as text
    #[arg(short, long = "value")]
    values: Vec<String>,

    /// Overrides the configured default consistency
    #[arg(long)]
    consistency: Option<Consistency>,

    /// Print one JSON object per row instead of tab-separated columns
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cql_runner=info,cqlkit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    // Load configuration
    let config = config::load_config(&args.config)?;
    let consistency = args.consistency.unwrap_or(config.database.consistency);
    info!(
        "Running statement against {:?} at {}",
        config.database.hosts, consistency
    );

    let session = Session::connect(&config.database).await?;
    session.health_check().await?;

    let values = args.values.iter().map(|raw| runner::parse_value(raw)).collect();
    let lines =
        runner::run_statement(&session, &args.statement, values, consistency, args.json).await?;

    for line in lines {
        println!("{}", line);
    }

    session.close();
    Ok(())
}
