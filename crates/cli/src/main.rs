mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// Sitelog daily labor sheet draft service.
#[derive(Parser)]
#[command(name = "sitelog", version, about = "Sitelog daily labor sheet draft service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP draft service
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
        /// Path to the SQLite database file (omit for an in-memory store)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Path to a TOML file mapping bearer tokens to owner ids
        #[arg(long)]
        tokens: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, db, tokens } => {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("error: failed to create tokio runtime: {}", e);
                    process::exit(1);
                }
            };
            if let Err(e) = rt.block_on(serve::start_server(port, db, tokens)) {
                eprintln!("Server error: {}", e);
                process::exit(1);
            }
        }
    }
}
