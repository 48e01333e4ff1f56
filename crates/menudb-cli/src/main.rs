//! menudb Command-Line Client
//!
//! Runs repository queries and maintenance commands against a menudb
//! SQLite database and prints the results as JSON.

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use commands::Command;
use menudb_core::{MenuRepositories, RepositoryConfig};
use tracing_subscriber::EnvFilter;

/// menudb Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "menudb")]
#[command(version, about = "menudb Command-Line Client")]
pub struct Args {
    /// Path to the SQLite database
    #[arg(long, default_value = "./menudb.sqlite3")]
    pub db: PathBuf,

    /// Use a throwaway in-memory database
    #[arg(long, conflicts_with = "db")]
    pub in_memory: bool,

    /// Deadline for one storage round-trip, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Largest accepted page size
    #[arg(long)]
    pub max_page_size: Option<u32>,

    /// Number of pooled connections
    #[arg(long, default_value_t = 4)]
    pub pool_size: usize,

    /// Print compact instead of pretty JSON
    #[arg(long)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    fn config(&self) -> RepositoryConfig {
        let mut config = if self.in_memory {
            RepositoryConfig::in_memory()
        } else {
            RepositoryConfig::new(&self.db)
        };
        config = config
            .with_pool_size(self.pool_size)
            .with_query_timeout(Duration::from_secs(self.timeout));
        if let Some(max) = self.max_page_size {
            config = config.with_max_page_size(max);
        }
        config
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("menudb_core=info,menudb_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), commands::CliError> {
    let repos = MenuRepositories::open(args.config())?;
    let deadline = Duration::from_secs(args.timeout);
    let output = commands::execute(&repos, args.command, deadline).await?;
    let rendered = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", rendered);
    Ok(())
}
