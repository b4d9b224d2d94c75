//! sirisort CLI
//!
//! Sorts SiRi/CACTUS list-mode data files into overview histograms.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::cast_lossless
)]

mod sink;

use clap::{Parser, Subcommand};
use sink::MultiplicitySink;
use sirisort_core::{FixedBlock, RecordBlock, SIRIUS_BLOCK_WORDS};
use sirisort_hist::HistogramRegistry;
use sirisort_io::{
    is_gzip, sort_file, CancelToken, FetchStrategy, PrefetchConfig, SortConfig,
    DEFAULT_POOL_SIZE,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    SirisortIo(#[from] sirisort_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] sirisort_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Streaming sorter for SiRi/CACTUS list-mode data.
#[derive(Parser)]
#[command(name = "sirisort")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort a data file and print the histogram summary
    Scan {
        /// Input data file (.gz files are decompressed)
        input: PathBuf,

        /// First block to sort
        #[arg(long, default_value = "0")]
        start: u64,

        /// Maximum number of blocks to sort
        #[arg(long)]
        max_blocks: Option<u64>,

        /// Read blocks on the sorting thread instead of prefetching
        #[arg(long)]
        sequential: bool,

        /// Number of blocks to read ahead
        #[arg(long, default_value_t = DEFAULT_POOL_SIZE)]
        pool_size: usize,

        /// Block size in 32-bit words
        #[arg(long, default_value_t = SIRIUS_BLOCK_WORDS)]
        block_words: usize,

        /// Coalesce histogram fills in batches of this size
        #[arg(long, num_args = 0..=1, default_missing_value = "1024")]
        fill_buffer: Option<usize>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show block layout information about a data file
    Info {
        /// Input data file
        input: PathBuf,

        /// Block size in 32-bit words
        #[arg(long, default_value_t = SIRIUS_BLOCK_WORDS)]
        block_words: usize,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Scan {
            input,
            start,
            max_blocks,
            sequential,
            pool_size,
            block_words,
            fill_buffer,
            json,
        } => {
            let strategy = if sequential {
                FetchStrategy::Sequential
            } else {
                FetchStrategy::Prefetch
            };
            let mut config = SortConfig::default()
                .with_start_block(start)
                .with_strategy(strategy)
                .with_prefetch(PrefetchConfig::default().try_with_pool_size(pool_size)?);
            if let Some(max) = max_blocks {
                config = config.with_max_blocks(max);
            }
            scan(&input, &config, block_words, fill_buffer, json)?;
        }

        Commands::Info { input, block_words } => {
            info_command(&input, block_words)?;
        }
    }

    Ok(())
}

fn scan(
    input: &Path,
    config: &SortConfig,
    block_words: usize,
    fill_buffer: Option<usize>,
    json: bool,
) -> Result<()> {
    let template = FixedBlock::new(block_words)?;
    let mut registry = HistogramRegistry::new();
    if let Some(capacity) = fill_buffer {
        registry = registry.with_fill_buffer(capacity);
    }
    let mut sink = MultiplicitySink::new(registry);
    let mut source = config.make_source(&template);

    info!(
        path = %input.display(),
        strategy = ?config.strategy,
        block_bytes = template.byte_len(),
        "sorting"
    );
    let started = Instant::now();
    let summary = sort_file(source.as_mut(), input, config, &mut sink, &CancelToken::new())?;
    let elapsed = started.elapsed();
    let registry = sink.into_registry();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("File: {}", input.display());
    println!("Blocks: {} ({} bad)", summary.blocks, summary.bad_blocks);
    println!("Events: {}", summary.events);
    println!("Average event length: {:.2} words", summary.average_event_length);
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        println!(
            "Time: {:.3}s ({:.1} blocks/s)",
            secs,
            summary.blocks as f64 / secs
        );
    }
    println!();
    println!("{:<12} {:<32} {:>12} {:>14}", "Name", "Title", "Entries", "Integral");
    println!("{:-<73}", "");
    for hist in registry.all_1d() {
        println!(
            "{:<12} {:<32} {:>12} {:>14.0}",
            hist.name(),
            hist.title(),
            hist.entry_count(),
            hist.integral()
        );
    }
    for hist in registry.all_2d() {
        println!(
            "{:<12} {:<32} {:>12} {:>14.0}",
            hist.name(),
            hist.title(),
            hist.entry_count(),
            hist.cells().iter().sum::<f64>()
        );
    }
    Ok(())
}

fn info_command(input: &Path, block_words: usize) -> Result<()> {
    let template = FixedBlock::new(block_words)?;
    let block_bytes = template.byte_len() as u64;
    let file_size = std::fs::metadata(input)?.len();

    println!("File: {}", input.display());
    println!(
        "Size: {} bytes ({:.2} MB)",
        file_size,
        file_size as f64 / 1_000_000.0
    );
    println!("Block size: {} bytes ({} words)", block_bytes, block_words);
    if is_gzip(input) {
        println!("Compressed: yes (block count unknown until decompressed)");
    } else {
        println!("Blocks: {}", file_size / block_bytes);
        let trailing = file_size % block_bytes;
        if trailing > 0 {
            println!("Trailing bytes: {} (partial block)", trailing);
        }
    }
    Ok(())
}
