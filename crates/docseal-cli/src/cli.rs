use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docseal_sdk::DocumentId;

#[derive(Parser)]
#[command(
    name = "docseal",
    about = "DocSeal: tamper-evident document storage",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file (default: ./docseal.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root, overriding the config file and DOCSEAL_ROOT
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a new document and anchor its content
    Create(CreateArgs),
    /// Show a document and its version history
    Show(ShowArgs),
    /// Publish a new version of a document
    Update(UpdateArgs),
    /// Soft-delete a document, keeping its history
    Delete(DeleteArgs),
    /// Search titles and descriptions
    Search(SearchArgs),
    /// List active documents
    List,
    /// Write a document's content to a file or stdout
    Download(DownloadArgs),
    /// Verify a document against the ledger
    Verify(VerifyArgs),
    /// Show recent ledger records
    Log(LogArgs),
    /// Verify every document version and the ledger chain
    Audit,
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(short, long)]
    pub title: String,
    #[arg(short, long, default_value = "")]
    pub description: String,
    /// File holding the document content
    #[arg(short, long)]
    pub file: PathBuf,
    #[arg(long)]
    pub mime: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: DocumentId,
    #[arg(long)]
    pub include_deleted: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: DocumentId,
    /// Version the update is based on
    #[arg(short, long)]
    pub expected: u64,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    #[arg(long)]
    pub mime: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub id: DocumentId,
    #[arg(short, long)]
    pub expected: u64,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Words to match; empty lists everything
    #[arg(default_value = "")]
    pub term: String,
}

#[derive(Args)]
pub struct DownloadArgs {
    pub id: DocumentId,
    /// A specific version instead of the current one
    #[arg(long)]
    pub version: Option<u64>,
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub id: DocumentId,
    #[arg(long)]
    pub version: Option<u64>,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}
