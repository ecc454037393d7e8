use anyhow::{Context, Result};
use clap::Parser;
use segfreq::{Analyzer, BoundaryPolicy, Report, StoreKind};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Count the most frequent long words in a file using one thread per segment
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input file
    file_name: PathBuf,

    /// Number of worker threads, one per segment
    thread_count: usize,

    /// Number of words to report
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Minimum word length in characters
    #[arg(long, default_value_t = 6)]
    min_len: usize,

    /// Maximum number of distinct words kept
    #[arg(long, default_value_t = 100_000)]
    capacity: usize,

    /// Table storage (linear, hashed)
    #[arg(long, default_value = "linear")]
    store: StoreKind,

    /// Handling of words across segment boundaries (realign, approximate)
    #[arg(long, default_value = "realign")]
    boundary: BoundaryPolicy,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_text(report: &Report) {
    for (rank, entry) in report.top.iter().enumerate() {
        println!("{:2}. {} {}", rank + 1, entry.word, entry.count);
    }
    if report.rejected_words > 0 {
        println!(
            "Table full: dropped {} distinct words ({} occurrences)",
            report.rejected_words, report.rejected_occurrences
        );
    }
    if report.is_partial() {
        println!(
            "Partial result: processed {}/{} bytes, {} worker(s) failed",
            report.bytes_processed,
            report.total_bytes,
            report.failures.len()
        );
    }
    println!(
        "Total Time was {}.{:09} seconds",
        report.elapsed.as_secs(),
        report.elapsed.subsec_nanos()
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let analyzer = Analyzer::builder()
        .workers(cli.thread_count)
        .top_k(cli.top)
        .min_word_len(cli.min_len)
        .capacity(cli.capacity)
        .store(cli.store)
        .boundary(cli.boundary)
        .build()?;

    let report = analyzer
        .run_path(&cli.file_name)
        .with_context(|| format!("Failed to analyze {}", cli.file_name.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }
    tracing::debug!("{}", report.metrics.format());

    Ok(())
}
