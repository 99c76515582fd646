use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "sweeper")]
#[command(about = "Desktop maintenance sweeper", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify files and place them into the organized tree
    Organize(OrganizeArgs),
    /// Two-phase duplicate scan: size buckets first, content hashes second
    Dupes(DupesArgs),
    /// Copy code files into the repository tree, preserving relative paths
    Extract(ExtractArgs),
    /// Concatenate code files into one reviewable document
    Consolidate(ConsolidateArgs),
    /// Bootstrap the destination tree and list folders outside the schema
    Schema(SchemaArgs),
    /// Print the effective configuration
    PrintConfig,
    /// Rotate the job log if it exceeds the configured size
    RotateLog,
}

#[derive(Debug, Args)]
pub struct OrganizeArgs {
    /// Root directories to scan; defaults to the configured root_paths
    pub roots: Vec<PathBuf>,
    /// Move files into place instead of copying them
    #[arg(long)]
    pub move_files: bool,
    /// Ignore filename keywords and file purely by category
    #[arg(long)]
    pub no_keyword_routing: bool,
}

#[derive(Debug, Args)]
pub struct DupesArgs {
    /// Root directories to scan; defaults to the configured root_paths
    pub roots: Vec<PathBuf>,
    /// Minimum file size in KB; smaller files are not considered
    #[arg(long)]
    pub min_size_kb: Option<u64>,
    /// Use the faster legacy hash instead of the strong default
    #[arg(long)]
    pub legacy_hash: bool,
    /// After the scan, offer to remove the duplicate side of each pair
    #[arg(long)]
    pub delete: bool,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Root directories to scan; defaults to the configured root_paths
    pub roots: Vec<PathBuf>,
    /// Repository directory receiving the copies
    #[arg(long)]
    pub into: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConsolidateArgs {
    /// Root directories to scan; defaults to the configured root_paths
    pub roots: Vec<PathBuf>,
    /// Directory the consolidated document is written to
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Root holding the destination tree; defaults to the configured
    /// organized_root
    pub root: Option<PathBuf>,
}
