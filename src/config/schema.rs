//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Project metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Public URL prefix for assets
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Hash assets for cache busting
    #[serde(default = "default_true")]
    pub hash: bool,

    /// Generate asset manifest
    #[serde(default = "default_true")]
    pub manifest: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            public_url: default_public_url(),
            hash: true,
            manifest: true,
        }
    }
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_public_url() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

/// Shared-chunk extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Warn when a module matches a rule but is already claimed by an
    /// earlier rule
    #[serde(default = "default_true")]
    pub warn_overlap: bool,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self { warn_overlap: true }
    }
}

/// One `[[shared_chunks]]` rule.
///
/// Rules run in declaration order; each creates (at most) one shared chunk
/// holding the modules common to the scanned chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedChunkConfig {
    /// Name of the chunk to create; must not collide with an entry name or
    /// another rule's name
    pub name: String,

    /// Names of the chunks to scan; omit to scan all chunks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<String>>,

    /// Minimum number of distinct scanned chunks a module must appear in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_chunks: Option<usize>,

    /// Glob patterns selecting eligible module paths; empty accepts all
    #[serde(default)]
    pub include: Vec<String>,
}
