use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use quad_rectify::io::{run_jacobian, run_verify, VerifyConfig};

/// Perspective checks for detected document quadrilaterals.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log verbosity.
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Restore, verify and score every quad of a JSON config.
    Verify {
        /// Path to a JSON `VerifyConfig`.
        #[arg(long)]
        config: PathBuf,
        /// Report path; overrides `output_path` from the config.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the (ratio², cos²) Jacobian of every quad as JSON.
    Jacobian {
        /// Path to a JSON `VerifyConfig`.
        #[arg(long)]
        config: PathBuf,
        /// Use central differences instead of the closed form.
        #[arg(long)]
        numerical: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_level: LevelFilter) -> Result<(), Box<dyn Error>> {
    // `QUAD_RECTIFY_LOG` takes an env-filter directive in this mode.
    let _ = tracing_log::LogTracer::init();
    quad_rectify::core::init_tracing(false);
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LevelFilter) -> Result<(), Box<dyn Error>> {
    quad_rectify::core::init_with_level(level)?;
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level.into())?;

    match cli.command {
        Command::Verify { config, output } => {
            let cfg = VerifyConfig::load_json(&config)?;
            let report = run_verify(&cfg);
            let out = output.unwrap_or_else(|| cfg.output_path());
            report.write_json(&out)?;
            println!(
                "{} of {} quads accepted; report written to {}",
                report.accepted(),
                report.quads.len(),
                out.display()
            );
        }
        Command::Jacobian { config, numerical } => {
            let cfg = VerifyConfig::load_json(&config)?;
            let entries = run_jacobian(&cfg, numerical);
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}
