use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use metadata_rag::commands::{ask, hello, ingest, show_status, view};
use metadata_rag::config::{Config, show_config};

#[derive(Parser)]
#[command(name = "metadata-rag")]
#[command(about = "Ask questions about warehouse metadata with retrieval-augmented generation")]
#[command(version)]
struct Cli {
    /// Project directory holding config.toml, the data directory and the vector store
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the corpus, ingest it and start the question prompt (default)
    Ask,
    /// Build the corpus and write it to the vector store
    Ingest,
    /// List the records stored in the vector store
    View,
    /// Send a greeting to the completion provider to check connectivity
    Hello,
    /// Show the state of the corpus, embedder and vector store
    Status,
    /// Show the effective configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.dir)?;

    match cli.command.unwrap_or(Commands::Ask) {
        Commands::Ask => {
            ask(&config).await?;
        }
        Commands::Ingest => {
            ingest(&config).await?;
        }
        Commands::View => {
            view(&config).await?;
        }
        Commands::Hello => {
            hello(&config)?;
        }
        Commands::Status => {
            show_status(&config).await?;
        }
        Commands::Config { show } => {
            if show {
                show_config(&config);
            } else {
                eprintln!(
                    "Edit {} to change settings, or run with --show to print them.",
                    config.config_file_path().display()
                );
            }
        }
    }

    Ok(())
}
