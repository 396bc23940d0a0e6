use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Save(SaveArgs),
    Verify(VerifyArgs),
}

#[derive(Debug, Args)]
pub struct SaveArgs {
    /// Input JSON file with the scraped work info and chapters.
    #[arg(long)]
    pub input: PathBuf,

    /// Target directory or .xlsx path (default: platform downloads dir).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Append a row to the existing worksheet instead of replacing it.
    #[arg(long)]
    pub append: bool,

    /// Treat the work as a novel (word-count columns) instead of a comic.
    #[arg(long)]
    pub novel: bool,

    /// Workbook filename without extension (default: per-type template).
    #[arg(long)]
    pub filename: Option<String>,

    /// Print the full save outcome as JSON instead of just the path.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Workbook file to check.
    #[arg(long)]
    pub file: PathBuf,

    /// Worksheet that must exist and hold at least one row.
    #[arg(long)]
    pub sheet: String,
}
