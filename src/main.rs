//! Command-line entry point for the cyc2eco converter.
//!
//! Reads an NCycDB/PCycDB abundance table (plus optional metadata and
//! sample-rename tables), assembles the dataset, prints a short summary and
//! optionally writes the dataset as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use cyc2eco::{convert, ConvertOptions, TableSource};
use log::info;
use std::path::PathBuf;

/// Define command-line arguments using clap.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input abundance table (NCycDB or PCycDB pipeline output).
    #[arg(short, long, required = true)]
    input: PathBuf,

    /// Sample metadata table (CSV or TSV); rows keyed by sample identifier.
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Headerless two-column table renaming raw sample IDs to canonical ones.
    #[arg(long)]
    match_table: Option<PathBuf>,

    /// Write the assembled dataset as JSON to this path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Drop metadata rows for samples absent from the abundance table.
    #[arg(long, default_value_t = false)]
    auto_tidy: bool,

    /// Label for the appended residual feature row.
    #[arg(long, default_value = "unclassified")]
    unclassified_label: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    info!("starting conversion with arguments: {:?}", args);

    let options = ConvertOptions {
        unclassified_label: args.unclassified_label.clone(),
        auto_tidy: args.auto_tidy,
    };
    let dataset = convert(
        &args.input,
        args.metadata.clone().map(TableSource::Path),
        args.match_table.as_deref(),
        &options,
    )
    .with_context(|| format!("failed to convert {}", args.input.display()))?;

    let (n_features, n_samples) = dataset.abundance.dimensions();
    println!("Detected ontology: {}", dataset.database().as_str());
    println!(
        "Features: {} (including '{}'), samples: {}",
        n_features, options.unclassified_label, n_samples
    );
    if let Some(metadata) = &dataset.metadata {
        println!("Metadata rows: {}", metadata.sample_count());
    }

    if let Some(output) = &args.output {
        dataset
            .to_json_file(output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("Wrote dataset JSON to {}", output.display());
    }

    Ok(())
}
