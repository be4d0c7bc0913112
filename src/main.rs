use anyhow::Result;
use clap::{Parser, Subcommand};
use locksweep::{audit, config::Config, ops, output::cli};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const CONFIG_ERROR: u8 = 2;
    pub const RUNTIME: u8 = 3;
}

#[derive(Parser)]
#[command(name = "locksweep")]
#[command(
    author,
    version,
    about = "Audit package-lock.json trees against an authoritative CSV of vulnerable version ranges"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan lockfiles under a target directory for vulnerable versions
    Scan {
        /// Target directory to scan
        #[arg(short, long, env = "SCAN_TARGET", default_value = ".")]
        target: PathBuf,

        /// Authoritative CSV of vulnerable version constraints
        #[arg(short, long, env = "INPUT_CSV")]
        csv: PathBuf,

        /// Output directory for report files (defaults to cwd)
        #[arg(short, long, env = "OUT_DIR")]
        out: Option<PathBuf>,

        /// Extra ignore patterns for lockfile discovery (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ignore: Vec<String>,

        /// Suppress terminal tables; only write output files
        #[arg(long)]
        quiet: bool,
    },

    /// List every (package, version, lockfile) occurrence without matching
    Inventory {
        /// Target directory to scan
        #[arg(short, long, env = "SCAN_TARGET", default_value = ".")]
        target: PathBuf,

        /// Output directory for inventory files (defaults to cwd)
        #[arg(short, long, env = "OUT_DIR")]
        out: Option<PathBuf>,

        /// Extra ignore patterns for lockfile discovery (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ignore: Vec<String>,

        /// Suppress terminal output; only write output files
        #[arg(long)]
        quiet: bool,
    },

    /// Intersect authoritative package names with a prior unique-package list
    Compare {
        /// Authoritative CSV of vulnerable version constraints
        #[arg(short, long, env = "INPUT_CSV")]
        csv: PathBuf,

        /// Directory holding unique-packages.txt from a prior inventory run
        #[arg(short, long, env = "OUT_DIR")]
        out: Option<PathBuf>,

        /// Suppress terminal output; only write output files
        #[arg(long)]
        quiet: bool,
    },

    /// Flag inventory rows whose version misses a required constraint
    NearMiss {
        /// Authoritative CSV of required version constraints
        #[arg(short, long, env = "INPUT_CSV")]
        csv: PathBuf,

        /// Inventory CSV from a prior inventory run
        #[arg(long, default_value = "./output/inventory.csv")]
        inventory: PathBuf,

        /// Output directory for near-miss.csv (defaults to cwd)
        #[arg(short, long, env = "OUT_DIR")]
        out: Option<PathBuf>,

        /// Suppress terminal output; only write output files
        #[arg(long)]
        quiet: bool,
    },

    /// Update every git project under a directory and run npm audit in each
    Audit {
        /// Directory to search for projects containing package.json
        #[arg(short, long, default_value = ".")]
        target: PathBuf,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            let code = match e.downcast_ref::<locksweep::Error>() {
                Some(err) if err.is_config_error() => exit_codes::CONFIG_ERROR,
                _ => exit_codes::RUNTIME,
            };
            ExitCode::from(code)
        }
    }
}

async fn run() -> Result<u8> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            target,
            csv,
            out,
            ignore,
            quiet,
        } => {
            let out_dir = resolve_out_dir(out, &config)?;
            let ignore = merge_ignores(ignore, &config);
            let outcome = ops::run_scan(&target, &csv, &out_dir, &ignore)?;
            if !(quiet || config.quiet) {
                cli::print_scan_result(&outcome.summary, &outcome.hits, &out_dir.display().to_string());
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::Inventory {
            target,
            out,
            ignore,
            quiet,
        } => {
            let out_dir = resolve_out_dir(out, &config)?;
            let ignore = merge_ignores(ignore, &config);
            let inventory = ops::run_inventory(&target, &out_dir, &ignore)?;
            if !(quiet || config.quiet) {
                cli::print_inventory_result(
                    inventory.rows().len(),
                    inventory.unique_names().len(),
                    &out_dir.display().to_string(),
                );
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::Compare { csv, out, quiet } => {
            let out_dir = resolve_out_dir(out, &config)?;
            let outcome = ops::run_compare(&csv, &out_dir)?;
            if !(quiet || config.quiet) {
                cli::print_compare_result(&outcome);
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::NearMiss {
            csv,
            inventory,
            out,
            quiet,
        } => {
            let out_dir = resolve_out_dir(out, &config)?;
            let misses = ops::run_near_miss(&csv, &inventory, &out_dir)?;
            if !(quiet || config.quiet) {
                cli::print_near_miss_result(&misses, &out_dir.display().to_string());
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::Audit { target } => {
            audit::run_audits(&target).await?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn resolve_out_dir(flag: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    let dir = flag
        .or_else(|| config.out_dir.clone())
        .map_or_else(std::env::current_dir, Ok)?;
    Ok(dir)
}

fn merge_ignores(mut flags: Vec<String>, config: &Config) -> Vec<String> {
    flags.extend(config.ignore.iter().cloned());
    flags
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'locksweep config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
