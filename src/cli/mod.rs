pub mod init;
pub mod parse;
pub mod sections;

use anyhow::anyhow;
use clap::{Parser, Subcommand, ValueEnum};

use stmtx::config::{StatementType, ALL_STATEMENT_TYPES};
use stmtx::settings::Settings;

#[derive(Parser)]
#[command(
    name = "stmtx",
    version,
    about = "Extract account details and transactions from bank statement spreadsheets."
)]
pub struct Cli {
    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the bundled statement configuration and remember its location.
    Init {
        /// Directory for statement configuration (default: ~/.config/stmtx)
        #[arg(long = "config-dir")]
        config_dir: Option<String>,
        /// Overwrite configuration files that already exist
        #[arg(long)]
        force: bool,
    },
    /// List the configured sections of a statement type.
    Sections {
        /// Statement type key (e.g. icici_search)
        #[arg(long = "statement-type")]
        statement_type: Option<String>,
        #[arg(long = "config-dir")]
        config_dir: Option<String>,
    },
    /// Parse a statement file.
    Parse {
        /// Path to the XLS/XLSX statement
        file: String,
        /// Statement type key (e.g. icici_search)
        #[arg(long = "statement-type")]
        statement_type: Option<String>,
        #[arg(long = "config-dir")]
        config_dir: Option<String>,
        /// Output format (default from settings, else json)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
}

/// Statement type from the flag, falling back to settings. An unknown key
/// fails here, before anything is read from disk.
pub(crate) fn statement_type(flag: Option<&str>, settings: &Settings) -> anyhow::Result<StatementType> {
    let key = flag.unwrap_or(&settings.statement_type);
    let known: Vec<&str> = ALL_STATEMENT_TYPES.iter().map(|t| t.key()).collect();
    key.parse::<StatementType>()
        .map_err(|e| anyhow!("{e} (known types: {})", known.join(", ")))
}
