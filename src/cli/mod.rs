//! Command-line interface for Commons
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `build`: Production build with shared-chunk extraction
//! - `init`: Project scaffolding

mod build;
mod init;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

pub use build::{BuildCommand, BuildOptions};
pub use init::InitCommand;

/// Commons - a multi-entry frontend bundler with shared-chunk extraction
#[derive(Parser, Debug)]
#[command(name = "commons")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to commons.toml config file
    #[arg(short, long, global = true, default_value = "commons.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the project for production
    Build(BuildCommand),

    /// Initialize a new project
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Build(cmd) => cmd.execute(&self.config).await,
            Commands::Init(cmd) => cmd.execute().await,
        }
    }
}

/// Print the Commons banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "◆".cyan(),
        "Commons".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
