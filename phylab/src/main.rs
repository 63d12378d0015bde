use clap::Parser;
use phylab::{run_and_persist, DefaultBackend, Error, ExperimentConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "phylab")]
#[command(version, about = "Link adaptation + PHY abstraction experiment driver", long_about = None)]
struct Cli {
    /// Path to the experiment configuration file
    #[arg(default_value = "configs/baseline.yaml")]
    config: PathBuf,

    /// Enable verbose output (-v info for all crates, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress and summary events from phylab itself are shown by default
    let filter = match cli.verbose {
        0 => "warn,phylab=info",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(&cli.config) {
        Ok(()) => {
            println!();
            println!("Experiment completed!");
            ExitCode::SUCCESS
        }
        Err(e @ Error::ConfigNotFound(_)) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error during experiment: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: &Path) -> phylab::Result<()> {
    tracing::info!("Loading configuration from {:?}", config_path);
    let config = ExperimentConfig::load(config_path)?;

    println!("=== {} experiment ===", config.experiment_id);
    println!("Running {} experiments...", config.num_experiments);

    let device = Default::default();
    let report = run_and_persist::<DefaultBackend>(&config, &device)?;
    let summary = &report.summary;

    println!();
    println!("Experiment results:");
    println!("  TBLER: {:.3} ± {:.3}", summary.tbler_mean, summary.tbler_std);
    println!("  Throughput: {:.1} kbit", summary.throughput_mean / 1024.0);
    println!("  HARQ NACK rate: {:.3}", summary.harq_nack_rate);
    println!();
    println!("Summary saved: {}", config.summary_path().display());
    println!("Graph saved: {}", config.chart_path().display());

    Ok(())
}
