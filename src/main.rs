//! # Orius Scanner CLI (`orius`)
//!
//! The `orius` binary scans documents from the terminal and serves the
//! browser UI.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `orius types` | List known document types |
//! | `orius schema <TYPE>` | Print the response schema for a type (or `identify`) |
//! | `orius classify <FILE>` | Run only the classification call |
//! | `orius scan <FILE>...` | Classify and extract a batch of files |
//! | `orius serve` | Start the browser UI and JSON API |
//!
//! ## Examples
//!
//! ```bash
//! # Scan two documents, human-readable output
//! orius scan rg-frente.jpg conta-luz.pdf
//!
//! # JSON output, skip classification
//! orius scan cnh.jpg --doc-type CNH --json
//!
//! # Browser UI
//! orius serve --config ./config/orius.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use orius_scanner::config::{self, DEFAULT_CONFIG_PATH};
use orius_scanner::models::DocType;
use orius_scanner::progress::ProgressMode;
use orius_scanner::{scan_cmd, server};

/// Orius Scanner — classify and extract Brazilian identity and legal
/// documents with a multimodal model.
#[derive(Parser)]
#[command(
    name = "orius",
    about = "Orius Scanner — classify and extract identity and legal documents",
    version,
    long_about = "Orius Scanner sends each document image to a hosted multimodal model \
    to classify it (RG, CNH, proof of residence, power of attorney, deed, bylaws, minutes), \
    then extracts the type's fields as structured JSON for review."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/orius.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the document types the scanner understands.
    Types,

    /// Print a response schema.
    ///
    /// `identify` prints the classification schema; a document type
    /// (e.g. `RG`, `ATA`) prints its extraction schema.
    Schema {
        /// `identify` or a document type.
        target: String,
    },

    /// Classify a single file without extracting fields.
    Classify {
        /// Image or PDF to classify.
        file: PathBuf,
    },

    /// Classify and extract a batch of files, one at a time.
    ///
    /// A failure on one file is reported and the batch continues. The exit
    /// status is non-zero if any file failed.
    Scan {
        /// Images or PDFs to scan, processed in the order given.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Skip classification and extract every file as this type.
        #[arg(long, value_parser = parse_doc_type)]
        doc_type: Option<DocType>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,

        /// Progress on stderr: `off`, `human` or `json`.
        /// Defaults to `human` when stderr is a terminal.
        #[arg(long, value_parser = ProgressMode::parse)]
        progress: Option<ProgressMode>,
    },

    /// Start the browser UI and JSON API on `[server].bind`.
    Serve,
}

fn parse_doc_type(s: &str) -> Result<DocType, String> {
    s.parse()
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    // Commands that need no configuration.
    match &cli.command {
        Commands::Types => {
            scan_cmd::list_types();
            return Ok(());
        }
        Commands::Schema { target } => {
            return scan_cmd::print_schema(target);
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Classify { file } => {
            scan_cmd::run_classify(&cfg, &file).await?;
        }
        Commands::Scan {
            files,
            doc_type,
            json,
            progress,
        } => {
            let progress = progress.unwrap_or_else(ProgressMode::default_for_tty);
            scan_cmd::run_scan(&cfg, &files, doc_type, json, progress).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Types | Commands::Schema { .. } => unreachable!(),
    }

    Ok(())
}
