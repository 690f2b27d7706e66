//! Shared-chunk extraction rules

use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::bundler::Module;
use crate::config::SharedChunkConfig;

/// Predicate deciding whether a module is eligible for a rule.
///
/// Modeled as an injectable function value rather than a trait hierarchy;
/// the default accepts every module.
pub type ModuleFilter = Arc<dyn Fn(&Module) -> bool + Send + Sync>;

/// One shared-chunk extraction rule.
///
/// Rules run in declaration order; the target name must not collide with any
/// existing chunk.
#[derive(Clone)]
pub struct SharedChunkSpec {
    /// Name of the chunk to create
    pub name: String,

    /// Names of the chunks to scan. `None` scans all chunks; anonymous
    /// chunks are always scanned either way.
    pub chunks: Option<Vec<String>>,

    /// Minimum number of distinct scanned chunks a module must appear in
    pub min_chunks: usize,

    /// Module eligibility predicate
    pub filter: ModuleFilter,
}

impl std::fmt::Debug for SharedChunkSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedChunkSpec")
            .field("name", &self.name)
            .field("chunks", &self.chunks)
            .field("min_chunks", &self.min_chunks)
            .finish_non_exhaustive()
    }
}

impl SharedChunkSpec {
    /// Rule with default selection: all chunks, threshold 1, accept-all filter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chunks: None,
            min_chunks: 1,
            filter: Arc::new(|_| true),
        }
    }

    /// Restrict the scan to the named chunks
    pub fn chunks(mut self, chunks: Vec<String>) -> Self {
        self.chunks = Some(chunks);
        self
    }

    /// Require a module to appear in at least `n` distinct scanned chunks
    pub fn min_chunks(mut self, n: usize) -> Self {
        self.min_chunks = n.max(1);
        self
    }

    /// Replace the module filter
    pub fn filter(mut self, filter: ModuleFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Build a rule from its `commons.toml` form. `include` glob patterns
    /// become a path filter; an empty pattern list accepts every module.
    pub fn from_config(config: &SharedChunkConfig) -> Result<Self> {
        let mut spec = Self::new(&config.name);

        if let Some(chunks) = &config.chunks {
            spec = spec.chunks(chunks.clone());
        }
        if let Some(min_chunks) = config.min_chunks {
            spec = spec.min_chunks(min_chunks);
        }
        if !config.include.is_empty() {
            let globs = build_globset(&config.include)
                .with_context(|| format!("invalid include pattern in shared chunk `{}`", config.name))?;
            spec = spec.filter(Arc::new(move |module: &Module| {
                globs.is_match(&module.path)
            }));
        }

        Ok(spec)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::bundler::ModuleType;

    fn module(path: &str) -> Module {
        Module {
            path: PathBuf::from(path),
            source: String::new(),
            module_type: ModuleType::JavaScript,
            is_entry: false,
            transformed: None,
        }
    }

    #[test]
    fn test_defaults() {
        let spec = SharedChunkSpec::new("vendor");
        assert_eq!(spec.name, "vendor");
        assert_eq!(spec.chunks, None);
        assert_eq!(spec.min_chunks, 1);
        assert!((spec.filter)(&module("/anything.js")));
    }

    #[test]
    fn test_min_chunks_floor() {
        let spec = SharedChunkSpec::new("vendor").min_chunks(0);
        assert_eq!(spec.min_chunks, 1);
    }

    #[test]
    fn test_from_config_with_globs() {
        let config = SharedChunkConfig {
            name: "vendor".into(),
            chunks: Some(vec!["foo".into(), "bar".into()]),
            min_chunks: Some(2),
            include: vec!["**/vendor/**".into()],
        };

        let spec = SharedChunkSpec::from_config(&config).unwrap();
        assert_eq!(spec.min_chunks, 2);
        assert_eq!(spec.chunks.as_deref(), Some(&["foo".to_string(), "bar".to_string()][..]));
        assert!((spec.filter)(&module("/app/vendor/lib.js")));
        assert!(!(spec.filter)(&module("/app/src/main.js")));
    }

    #[test]
    fn test_from_config_rejects_bad_pattern() {
        let config = SharedChunkConfig {
            name: "vendor".into(),
            chunks: None,
            min_chunks: None,
            include: vec!["[".into()],
        };
        assert!(SharedChunkSpec::from_config(&config).is_err());
    }
}
