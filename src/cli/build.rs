//! Build command implementation

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::bundler::Bundler;
use crate::config::Config;
use crate::utils;

/// Build the project for production
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Output directory
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,
}

impl BuildCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        info!("Loading configuration from {}", config_path);
        let config = Config::load(config_path)?;

        eprintln!("{} Building project...", "→".blue());

        let bundler = Bundler::new(config, self.into())?;
        let result = bundler.build().await?;

        eprintln!(
            "\n{} Built {} bundle(s) in {}\n",
            "✓".green().bold(),
            result.bundles.len(),
            utils::format_duration(start.elapsed())
        );

        // Print bundle summary
        for bundle in &result.bundles {
            eprintln!(
                "  {} {} {}",
                "•".dimmed(),
                bundle.output_path.display().to_string().cyan(),
                utils::format_size(bundle.size).dimmed()
            );
        }

        if !result.shared_chunks.is_empty() {
            eprintln!(
                "\n  {} shared: {}",
                "◆".dimmed(),
                result.shared_chunks.join(", ").cyan()
            );
        }
        for rule in &result.skipped_rules {
            eprintln!(
                "  {} rule `{}` matched no modules",
                "–".dimmed(),
                rule.yellow()
            );
        }

        // Per-entry load order, foundational chunks first
        let mut entry_names: Vec<&String> = result.entries.keys().collect();
        entry_names.sort();
        if !entry_names.is_empty() {
            eprintln!();
            for name in entry_names {
                eprintln!(
                    "  {} {} loads {}",
                    "→".dimmed(),
                    name.bold(),
                    result.entries[name].join(" → ").dimmed()
                );
            }
        }

        eprintln!();

        Ok(())
    }
}

/// Build options derived from command arguments
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub outdir: Option<PathBuf>,
}

impl From<&BuildCommand> for BuildOptions {
    fn from(cmd: &BuildCommand) -> Self {
        Self {
            outdir: cmd.outdir.clone(),
        }
    }
}
