use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stackit")]
#[command(about = "Operator tool for the StackIt forum database.")]
pub struct CommandLine {
    /// Database file; overrides STACKIT_DB_PATH
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print core health and version
    Ping,
    /// Open the database and apply pending schema migrations
    Migrate,
    /// Load the sample forum into an empty database
    Seed,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
