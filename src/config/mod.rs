//! Configuration handling for Commons
//!
//! Parses and manages commons.toml configuration files.

mod schema;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use schema::*;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project metadata
    pub project: ProjectConfig,

    /// Entry points for bundling
    #[serde(default)]
    pub entrypoints: HashMap<String, String>,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Shared-chunk extraction settings
    #[serde(default)]
    pub shared: SharedConfig,

    /// Shared-chunk extraction rules, applied in declaration order
    #[serde(default)]
    pub shared_chunks: Vec<SharedChunkConfig>,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse commons.toml")?;

        // Set root directory to the directory containing the config file
        config.root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            project: ProjectConfig {
                name: "my-app".to_string(),
                version: "0.1.0".to_string(),
            },
            entrypoints: {
                let mut map = HashMap::new();
                map.insert("main".to_string(), "src/main.js".to_string());
                map
            },
            output: OutputConfig::default(),
            shared: SharedConfig::default(),
            shared_chunks: Vec::new(),
            root: PathBuf::from("."),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        // Ensure at least one entrypoint exists
        if self.entrypoints.is_empty() {
            anyhow::bail!("At least one entrypoint must be specified in commons.toml");
        }

        // Validate entrypoint paths exist
        for (name, path) in &self.entrypoints {
            let full_path = self.root.join(path);
            if !full_path.exists() {
                anyhow::bail!(
                    "Entrypoint '{}' points to non-existent file: {}",
                    name,
                    full_path.display()
                );
            }
        }

        // Validate shared chunk rules
        let mut seen = std::collections::HashSet::new();
        for rule in &self.shared_chunks {
            if rule.name.is_empty() {
                anyhow::bail!("A [[shared_chunks]] rule has an empty name");
            }
            if !seen.insert(rule.name.as_str()) {
                anyhow::bail!("Duplicate [[shared_chunks]] name: '{}'", rule.name);
            }
            if rule.min_chunks == Some(0) {
                anyhow::bail!(
                    "Shared chunk '{}' has min_chunks = 0; the minimum is 1",
                    rule.name
                );
            }
        }

        Ok(())
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.dir)
    }

    /// Get all entrypoint paths, sorted by name for deterministic builds
    pub fn all_entrypoints(&self) -> Vec<(String, PathBuf)> {
        let mut entries: Vec<(String, PathBuf)> = self
            .entrypoints
            .iter()
            .map(|(name, path)| (name.clone(), self.root.join(path)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
