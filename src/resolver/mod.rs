//! Module resolution
//!
//! Handles resolving import specifiers to actual file paths.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::bundler::{DependencyKind, ModuleType};
use crate::config::Config;

/// Regex patterns for extracting imports
static IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:import|export)\s+(?:(?:\{[^}]*\}|\*\s+as\s+\w+|\w+)\s+from\s+)?["']([^"']+)["']|require\s*\(\s*["']([^"']+)["']\s*\)"#).unwrap()
});

static DYNAMIC_IMPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"import\s*\(\s*["']([^"']+)["']\s*\)"#).unwrap()
});

/// Module resolver
pub struct Resolver {
    /// Project configuration
    #[allow(dead_code)]
    config: Arc<Config>,
}

impl Resolver {
    /// Create a new resolver
    pub fn new(config: Arc<Config>) -> Result<Self> {
        Ok(Self { config })
    }

    /// Extract import/require specifiers from source code, classified as
    /// static or dynamic requests. Static requests come first, each
    /// specifier at most once per kind.
    pub fn extract_dependencies(
        &self,
        source: &str,
        _file_path: &Path,
        module_type: &ModuleType,
    ) -> Result<Vec<(String, DependencyKind)>> {
        // Only JS-like modules carry imports
        if !module_type.is_js_like() {
            return Ok(Vec::new());
        }

        let mut dependencies: Vec<(String, DependencyKind)> = Vec::new();

        // Find static imports/exports
        for cap in IMPORT_REGEX.captures_iter(source) {
            if let Some(specifier) = cap.get(1).or_else(|| cap.get(2)) {
                let spec = specifier.as_str().to_string();
                if !dependencies.iter().any(|(s, k)| *k == DependencyKind::Static && *s == spec) {
                    dependencies.push((spec, DependencyKind::Static));
                }
            }
        }

        // Find dynamic imports
        for cap in DYNAMIC_IMPORT_REGEX.captures_iter(source) {
            if let Some(specifier) = cap.get(1) {
                let spec = specifier.as_str().to_string();
                if !dependencies.iter().any(|(s, k)| *k == DependencyKind::Dynamic && *s == spec) {
                    dependencies.push((spec, DependencyKind::Dynamic));
                }
            }
        }

        debug!("Found {} dependencies", dependencies.len());

        Ok(dependencies)
    }

    /// Resolve an import specifier to an absolute file path.
    ///
    /// Bare specifiers (external packages) resolve to `None`; the bundler
    /// records them as unresolved references.
    pub fn resolve(&self, specifier: &str, from: &Path) -> Result<Option<PathBuf>> {
        debug!("Resolving '{}' from '{}'", specifier, from.display());

        if !specifier.starts_with('.') && !specifier.starts_with('/') {
            debug!("Skipping bare specifier: {}", specifier);
            return Ok(None);
        }

        let base_dir = from.parent().unwrap_or(Path::new("."));
        let resolved = self.resolve_relative(specifier, base_dir)?;

        debug!("Resolved to: {:?}", resolved);

        Ok(resolved)
    }

    /// Resolve a relative import
    fn resolve_relative(&self, specifier: &str, base_dir: &Path) -> Result<Option<PathBuf>> {
        let target = base_dir.join(specifier);

        // Try exact path first
        if target.is_file() {
            return Ok(Some(target));
        }

        // Try adding extensions
        let extensions = ["js", "mjs", "cjs", "json", "css"];
        for ext in &extensions {
            let with_ext = target.with_extension(ext);
            if with_ext.is_file() {
                return Ok(Some(with_ext));
            }
        }

        // Try as directory with index file
        if target.is_dir() {
            for ext in &extensions {
                let index = target.join(format!("index.{}", ext));
                if index.is_file() {
                    return Ok(Some(index));
                }
            }
        }

        Ok(None)
    }
}
