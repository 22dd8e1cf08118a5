use clap::{Args, Parser, Subcommand};
use kmerplot::config::{parse_entry, PlotOptions};
use kmerplot::histogram::TableSource;
use kmerplot::normalize::Normalization;
use kmerplot::startup::{self, Layout};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Normalize and chart k-mer frequency histograms
#[derive(Parser, Debug)]
#[command(name = "kmerplot")]
#[command(about = "Normalize and compare k-mer frequency histograms", long_about = None)]
struct Cli {
    /// Log debug detail (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Overlay all histograms on one chart
    Overlay(ChartArgs),
    /// Draw exactly four histograms as a 2x2 grid
    Grid(ChartArgs),
    /// Print one normalized table to stdout
    Normalize(NormalizeArgs),
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// Histograms as LABEL=PATH, in plotting order
    #[arg(required = true)]
    entries: Vec<String>,

    /// Output image (.png or .svg)
    #[arg(short, long)]
    output: PathBuf,

    /// Log then min-max normalize each histogram
    #[arg(long)]
    normalize: bool,

    /// Gaussian-smooth each curve
    #[arg(long)]
    smooth: bool,

    /// Standard deviation of the smoothing kernel
    #[arg(long)]
    sigma: Option<f64>,

    /// JSON file with default plot options
    #[arg(long)]
    options: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// Histogram file
    input: PathBuf,

    /// min-max, log, z-score or log-min-max
    #[arg(short, long, default_value = "log-min-max")]
    method: Normalization,

    /// Emit JSON records instead of tab-separated rows
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Command) -> kmerplot::Result<()> {
    match command {
        Command::Overlay(args) => chart(Layout::Overlay, args),
        Command::Grid(args) => chart(Layout::Grid, args),
        Command::Normalize(args) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            startup::normalize_table(&TableSource::Path(args.input), args.method, args.json, &mut out)
        }
    }
}

fn chart(layout: Layout, args: ChartArgs) -> kmerplot::Result<()> {
    let mut options = match &args.options {
        Some(path) => PlotOptions::from_json_file(path)?,
        None => PlotOptions::default(),
    };
    options.normalize |= args.normalize;
    options.smoothing |= args.smooth;
    if let Some(sigma) = args.sigma {
        options.sigma = sigma;
    }
    options.output = Some(args.output);

    let entries = args
        .entries
        .iter()
        .map(|arg| parse_entry(arg))
        .collect::<kmerplot::Result<Vec<_>>>()?;

    let written = startup::render(layout, &entries, &options)?;
    tracing::info!(path = %written.display(), "done");

    Ok(())
}
