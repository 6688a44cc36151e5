//! VetSync CLI
//!
//! Command-line tools for VetSync local stores and caches.
//!
//! # Commands
//!
//! - `inspect` - Display tenant record counts and watermarks
//! - `queue` - List a tenant's sync queue
//! - `compact` - Rewrite tenant logs to reclaim space
//! - `caches` - List or clear cache namespace files

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// VetSync command-line tools.
#[derive(Parser)]
#[command(name = "vetsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display tenant record counts and watermarks
    Inspect {
        /// Restrict to one tenant (default: all)
        #[arg(short, long)]
        tenant: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List a tenant's sync queue
    Queue {
        /// The tenant to list
        #[arg(short, long)]
        tenant: String,

        /// Show only pending operations
        #[arg(long)]
        pending: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Rewrite tenant logs to reclaim space
    Compact {
        /// Restrict to one tenant (default: all)
        #[arg(short, long)]
        tenant: Option<String>,
    },

    /// List or clear cache namespace files
    Caches {
        /// Path to the cache directory
        #[arg(short, long)]
        dir: PathBuf,

        /// Delete every namespace file
        #[arg(long)]
        clear: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { tenant, format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, tenant.as_deref(), &format)?;
        }
        Commands::Queue {
            tenant,
            pending,
            format,
        } => {
            let path = cli.path.ok_or("Store path required for queue")?;
            commands::queue::run(&path, &tenant, pending, &format)?;
        }
        Commands::Compact { tenant } => {
            let path = cli.path.ok_or("Store path required for compact")?;
            commands::compact::run(&path, tenant.as_deref())?;
        }
        Commands::Caches { dir, clear } => {
            commands::caches::run(&dir, clear)?;
        }
        Commands::Version => {
            println!("VetSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
