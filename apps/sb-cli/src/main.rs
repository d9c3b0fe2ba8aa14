use clap::{Parser, Subcommand};
use sb_bridge::{BridgeConfig, ElementSet, report_arguments, report_version, validate_input_path};
use sb_core::MethodId;
use std::path::{Path, PathBuf};

#[cfg_attr(not(feature = "swmm"), allow(dead_code))]
mod drive;
mod error;

use error::CliResult;

#[derive(Parser)]
#[command(name = "sb-cli")]
#[command(about = "SWMM bridge CLI - drive and inspect the host adapter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the adapter version and argument counts
    Version,
    /// Validate a bridge configuration and its model path
    Check {
        /// Path to the configuration YAML file
        config_path: PathBuf,
    },
    /// Run one realization against the SWMM engine
    #[cfg(feature = "swmm")]
    Run {
        /// Path to the configuration YAML file
        config_path: PathBuf,
        /// Rainfall series, one value per line
        #[arg(long)]
        rainfall: PathBuf,
        /// Host time step in seconds
        #[arg(long, default_value_t = 300.0)]
        dt: f64,
        /// Emit JSON lines instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> CliResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => cmd_version(),
        Commands::Check { config_path } => cmd_check(&config_path),
        #[cfg(feature = "swmm")]
        Commands::Run {
            config_path,
            rainfall,
            dt,
            json,
        } => cmd_run(&config_path, &rainfall, dt, json),
    }
}

fn cmd_version() -> CliResult<()> {
    let [version] = report_version();
    let [inputs, outputs] = report_arguments();
    println!("SWMM bridge v{version}");
    println!("  {inputs} inputs, {outputs} outputs");
    println!("  methods:");
    for method in MethodId::ALL {
        println!("    {:>3}  {method}", method.code());
    }
    Ok(())
}

fn cmd_check(config_path: &Path) -> CliResult<()> {
    println!("Checking configuration: {}", config_path.display());
    let config = BridgeConfig::load(config_path)?;
    validate_input_path(&config.model.input)?;
    println!("✓ Model: {}", config.model.input.display());
    println!("  report: {}", config.model.report.display());
    println!("  output: {}", config.model.output.display());
    println!("  rain gage: {}", config.rain_gage);
    println!("Elements:");
    for handle in ElementSet::from_names(&config.elements).handles() {
        println!(
            "  {:<14} {:<10} ({})",
            handle.role.kind_label(),
            handle.name,
            handle.role.purpose()
        );
    }
    println!("✓ Configuration is valid");
    Ok(())
}

#[cfg(feature = "swmm")]
fn cmd_run(config_path: &Path, rainfall_path: &Path, dt: f64, json: bool) -> CliResult<()> {
    use sb_bridge::Session;
    use sb_engine::SwmmEngine;

    let config = BridgeConfig::load(config_path)?;
    let rainfall = drive::load_rainfall(rainfall_path)?;
    tracing::info!(steps = rainfall.len(), dt, "starting realization");

    let mut session = Session::new(SwmmEngine::acquire()?, config);
    let mut stdout = std::io::stdout().lock();
    let finish = drive::run_realization(&mut session, &rainfall, dt, json, &mut stdout)?;

    match finish {
        drive::Finish::SeriesExhausted { steps } => {
            eprintln!("✓ Realization complete: {steps} steps")
        }
        drive::Finish::EngineCompleted { steps } => {
            eprintln!("✓ Engine reached end of simulation after {steps} steps")
        }
    }
    Ok(())
}
