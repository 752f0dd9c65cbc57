mod commands;
mod gpxxml;

use clap::{Parser, Subcommand};
use commands::analyze::{AnalyzeOptions, OutputFormat, analyze_command};
use std::io;
use std::path::PathBuf;
use trackpace::DEFAULT_MIN_SPEED_KMH;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "trackpace",
    version,
    about = "Summarize distance, duration, pace and climbing of GPX tracks"
)]
struct Cli {
    /// Log dropped samples and filter statistics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Analyze a GPX track read from FILE or stdin")]
    Analyze {
        /// GPX file to read (`-` or omitted for stdin)
        input: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Slowest speed in km/h that still counts as movement
        #[arg(long, default_value_t = DEFAULT_MIN_SPEED_KMH)]
        min_speed: f64,

        /// Fixes closer together than this many seconds are treated as duplicates
        #[arg(long, default_value_t = 1.0)]
        min_interval: f64,

        /// Include the filtered track points in JSON output
        #[arg(long)]
        points: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze {
            input,
            format,
            min_speed,
            min_interval,
            points,
        } => analyze_command(&AnalyzeOptions {
            input,
            format,
            min_speed,
            min_interval,
            include_points: points,
        }),
    }
}
