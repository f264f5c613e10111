//! # CLI Module
//!
//! Command-line interface for the signer pipeline.
//!
//! ## Usage
//! ```bash
//! # Sign values given on the command line
//! signer sign 0 1 1 2 3 5 8
//!
//! # Sign a JSON array, with a capped worker pool
//! signer sign --input values.json --workers 4
//!
//! # Read one value per line from stdin, JSON output
//! seq 1 100 | signer sign --output json
//!
//! # Model slow primitives
//! signer sign 0 1 --latency-ms 1000 --digest-latency-ms 10 --verbose
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use signer_pipeline::core::input::{values_from_lines, values_from_path};
use signer_pipeline::core::{Concurrency, Latency, SignResult, Signer, StageState, Value};
use signer_pipeline::error::Result;
use signer_pipeline::events::{event_channel, Event, PipelineEvent, StageEvent};
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

/// Signer - deterministic composite hashing over a concurrent pipeline
#[derive(Parser, Debug)]
#[command(name = "signer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the composite digest of a stream of values
    Sign {
        /// Values to sign (whole numbers are treated as numbers)
        values: Vec<String>,

        /// Read values from a file (.json array, or one value per line)
        #[arg(short, long, conflicts_with = "values")]
        input: Option<PathBuf>,

        /// Cap concurrent subtasks per stage (default: one per value)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Capacity of each queue between stages
        #[arg(long, default_value = "100")]
        capacity: usize,

        /// Delay added to every checksum call, in milliseconds
        #[arg(long, default_value = "0")]
        latency_ms: u64,

        /// Delay added to every digest call, in milliseconds
        #[arg(long, default_value = "0")]
        digest_latency_ms: u64,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Show stage lifecycle
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// The digest only
    Minimal,
}

struct SignOptions {
    concurrency: Concurrency,
    capacity: usize,
    latency: Latency,
    output: OutputFormat,
    verbose: bool,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sign {
            values,
            input,
            workers,
            capacity,
            latency_ms,
            digest_latency_ms,
            output,
            verbose,
        } => {
            let values = collect_values(values, input)?;
            let concurrency = match workers {
                Some(workers) => Concurrency::bounded(workers)?,
                None => Concurrency::Unbounded,
            };
            run_sign(
                values,
                SignOptions {
                    concurrency,
                    capacity,
                    latency: Latency {
                        checksum: Duration::from_millis(latency_ms),
                        digest: Duration::from_millis(digest_latency_ms),
                    },
                    output,
                    verbose,
                },
            )
        }
    }
}

fn collect_values(values: Vec<String>, input: Option<PathBuf>) -> Result<Vec<Value>> {
    if let Some(path) = input {
        return Ok(values_from_path(&path)?);
    }
    if values.is_empty() {
        return Ok(values_from_lines(io::stdin().lock())?);
    }
    Ok(values.iter().map(|raw| Value::parse(raw)).collect())
}

fn run_sign(values: Vec<Value>, options: SignOptions) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(options.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Signer").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let signer = Signer::builder()
        .concurrency(options.concurrency)
        .queue_capacity(options.capacity)
        .latency(options.latency)
        .build()?;

    let (sender, receiver) = event_channel();

    let progress = if pretty {
        let pb = ProgressBar::new(progress_length(&values));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = options.verbose;
    let event_term = term.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Stage(StageEvent::ItemForwarded { index: 1 }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.inc(1);
                    }
                }
                Event::Stage(StageEvent::StateChanged { name, state, .. }) => {
                    if let Some(ref pb) = progress_clone {
                        if state == StageState::Joining {
                            pb.set_message(format!("{} joining", name));
                        }
                    }
                    if verbose {
                        let line = format!("  {} {}", style(format!("{:>14}", name)).dim(), state);
                        match progress_clone {
                            Some(ref pb) => pb.println(line),
                            None => {
                                event_term.write_line(&line).ok();
                            }
                        }
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Failed { .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    let result = signer.sign_with_events(values, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = result?;
    match options.output {
        OutputFormat::Pretty => print_pretty_result(&term, &result, options.concurrency),
        OutputFormat::Json => print_json_result(&result),
        OutputFormat::Minimal => println!("{}", result.digest),
    }

    Ok(())
}

/// Number of `ItemForwarded` events the sextuple stage will emit
fn progress_length(values: &[Value]) -> u64 {
    values.iter().filter(|value| value.is_supported()).count() as u64
}

fn print_pretty_result(term: &Term, result: &SignResult, concurrency: Concurrency) {
    term.write_line(&format!("{} Signing Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} values signed in {:.2}s ({})",
        style(result.values_hashed).cyan(),
        result.duration_ms as f64 / 1000.0,
        concurrency
    ))
    .ok();

    let dropped = result.values_in.saturating_sub(result.values_hashed);
    if dropped > 0 {
        term.write_line(&format!(
            "  {} unsupported values dropped",
            style(dropped).yellow()
        ))
        .ok();
    }

    term.write_line(&format!("  run {}", style(result.run_id).dim()))
        .ok();
    term.write_line("").ok();

    // Digest goes to stdout so it can be piped
    println!("{}", result.digest);
}

fn print_json_result(result: &SignResult) {
    match serde_json::to_string_pretty(result) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize result: {}", e),
    }
}
