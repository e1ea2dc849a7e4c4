use std::path::PathBuf;

use clap::Parser;
use ecoscan::error::AppError;
use ecoscan::{Configuration, WasteAnalysisPipeline};
use tracing::Level;

/// Classify waste in images: material, recyclability and disposal advice.
#[derive(Debug, Parser)]
#[command(name = "ecoscan", version, about)]
struct Cli {
    /// TOML/YAML/JSON configuration file layered over the built-in defaults
    #[arg(short, long, env = "ECOSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Skip the remote vision service and use local color analysis only
    #[arg(long)]
    local_only: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(required = true)]
    images: Vec<PathBuf>,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut configuration = Configuration::load(cli.config.as_deref())?;
    if cli.local_only {
        configuration.remote.enabled = false;
    }

    let pipeline = WasteAnalysisPipeline::new(configuration)?;
    for result in pipeline.analyze_batch(&cli.images).await {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}
