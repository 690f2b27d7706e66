//! Core bundler implementation
//!
//! Handles the module graph, chunk assignment, shared-chunk extraction, and
//! bundle generation.

mod chunk;
mod graph;

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::cli::BuildOptions;
use crate::config::Config;
use crate::extract::{
    finalize_parent_order, ExtractOptions, SharedChunkExtractor, SharedChunkSpec,
};
use crate::resolver::Resolver;
use crate::transform::Transformer;
use crate::utils;

pub use chunk::{Chunk, ChunkGraph, ChunkId, ChunkKind, EntryPoint, EntryPointId, NameTaken};
pub use graph::{DependencyKind, DependencyRef, Module, ModuleGraph, ModuleId, ModuleType};

/// Result of a build operation
#[derive(Debug)]
pub struct BuildResult {
    /// Generated bundles
    pub bundles: Vec<BundleInfo>,

    /// Ordered chunk files per entry point, shared chunks first
    pub entries: HashMap<String, Vec<String>>,

    /// Names of shared chunks created by extraction
    pub shared_chunks: Vec<String>,

    /// Names of extraction rules that matched nothing
    pub skipped_rules: Vec<String>,
}

/// Information about a generated bundle
#[derive(Debug)]
pub struct BundleInfo {
    /// Output file path
    pub output_path: PathBuf,

    /// Bundle size in bytes
    pub size: usize,
}

/// The main bundler
pub struct Bundler {
    /// Project configuration
    config: Arc<Config>,

    /// Build options
    options: BuildOptions,

    /// Module resolver
    resolver: Resolver,

    /// Code transformer
    transformer: Transformer,

    /// Module graph
    graph: Arc<RwLock<ModuleGraph>>,
}

impl Bundler {
    /// Create a new bundler instance
    pub fn new(config: Config, options: BuildOptions) -> Result<Self> {
        let config = Arc::new(config);
        let resolver = Resolver::new(config.clone())?;
        let transformer = Transformer::new(config.clone())?;

        Ok(Self {
            config,
            options,
            resolver,
            transformer,
            graph: Arc::new(RwLock::new(ModuleGraph::new())),
        })
    }

    /// Build the project
    pub async fn build(&self) -> Result<BuildResult> {
        let start = Instant::now();

        // 1. Build the module graph from entrypoints
        info!("Building module graph...");
        self.build_module_graph().await?;

        // 2. Transform all modules
        info!("Transforming modules...");
        self.transform_modules().await?;

        // 3. Assign modules to chunks
        info!("Assigning chunks...");
        let mut chunks = self.assign_chunks()?;

        // 4. Extract shared chunks per the configured rules
        let (shared_chunks, skipped_rules) = if self.config.shared_chunks.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            info!("Extracting shared chunks...");
            self.extract_shared_chunks(&mut chunks)?
        };

        // 5. Order each chunk's parents so foundational chunks load first.
        // Must run after every chunk mutation, since it depends on the final
        // parent lists.
        finalize_parent_order(&mut chunks);

        // 6. Write output bundles and the entry manifest
        info!("Writing bundles...");
        let (bundles, entries) = self.write_bundles(&chunks)?;

        debug!("Build completed in {:?}", start.elapsed());

        Ok(BuildResult {
            bundles,
            entries,
            shared_chunks,
            skipped_rules,
        })
    }

    /// Build the module graph by traversing from entrypoints
    async fn build_module_graph(&self) -> Result<()> {
        let entrypoints = self.config.all_entrypoints();

        for (name, path) in entrypoints {
            debug!("Processing entrypoint: {} -> {}", name, path.display());
            self.process_module(&path, true).await?;
        }

        Ok(())
    }

    /// Process a single module and its dependencies
    ///
    /// Uses Box::pin for async recursion to avoid infinite type size issues
    async fn process_module(&self, path: &PathBuf, is_entry: bool) -> Result<ModuleId> {
        let canonical_path = fs::canonicalize(path)
            .with_context(|| format!("Failed to resolve module path: {}", path.display()))?;

        // Check if already processed
        {
            let graph = self.graph.read();
            if let Some(id) = graph.get_module_id(&canonical_path) {
                return Ok(id);
            }
        }

        // Read module source
        let source = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read module: {}", canonical_path.display()))?;

        // Determine module type from extension
        let module_type = Module::detect_type(&canonical_path);

        // Parse and extract dependency specifiers
        let dependencies =
            self.resolver
                .extract_dependencies(&source, &canonical_path, &module_type)?;

        // Create module
        let module = Module {
            path: canonical_path.clone(),
            source,
            module_type,
            is_entry,
            transformed: None,
        };

        // Add to graph before walking dependencies, so import cycles
        // terminate on the already-processed check above
        let module_id = {
            let mut graph = self.graph.write();
            graph.add_module(module)
        };

        // Process dependencies recursively (Box::pin needed for async
        // recursion). Unresolved specifiers are kept as references without a
        // target; chunking ignores them.
        for (specifier, kind) in dependencies {
            let resolved = self.resolver.resolve(&specifier, &canonical_path)?;
            let target = match resolved {
                Some(resolved_path) => {
                    Some(Box::pin(self.process_module(&resolved_path, false)).await?)
                }
                None => None,
            };

            let mut graph = self.graph.write();
            graph.add_dependency(
                module_id,
                DependencyRef {
                    specifier,
                    target,
                    kind,
                },
            );
        }

        Ok(module_id)
    }

    /// Transform all modules in the graph
    async fn transform_modules(&self) -> Result<()> {
        let module_ids: Vec<ModuleId> = {
            let graph = self.graph.read();
            graph.all_module_ids()
        };

        for id in module_ids {
            let Some((source, path, module_type)) = ({
                let graph = self.graph.read();
                graph.get_module(id).map(|module| {
                    (
                        module.source.clone(),
                        module.path.clone(),
                        module.module_type.clone(),
                    )
                })
            }) else {
                continue;
            };

            let transformed = self.transformer.transform(&source, &path, &module_type)?;

            {
                let mut graph = self.graph.write();
                if let Some(module) = graph.get_module_mut(id) {
                    module.transformed = Some(transformed);
                }
            }
        }

        Ok(())
    }

    /// Assign modules to chunks: one named entry chunk per entrypoint, one
    /// anonymous async chunk per distinct dynamic-import target
    fn assign_chunks(&self) -> Result<ChunkGraph> {
        let graph = self.graph.read();
        let mut chunks = ChunkGraph::new();

        // (async chunk root module, chunk that imports it)
        let mut pending_async: VecDeque<(ModuleId, ChunkId)> = VecDeque::new();

        for (name, path) in self.config.all_entrypoints() {
            let canonical_path = fs::canonicalize(&path)?;
            let Some(entry_id) = graph.get_module_id(&canonical_path) else {
                continue;
            };

            let chunk = chunks.create_chunk(Some(name.clone()), ChunkKind::Entry)?;
            let entry_point = chunks.create_entry_point(&name);
            chunks.push_entry_chunk(entry_point, chunk);

            let mut boundaries = Vec::new();
            for module in graph.static_reachable(entry_id, &mut boundaries) {
                chunks.add_module(chunk, module);
            }
            for boundary in boundaries {
                pending_async.push_back((boundary, chunk));
            }
        }

        // Async chunks may themselves contain further dynamic imports
        let mut async_by_root: HashMap<ModuleId, ChunkId> = HashMap::new();
        while let Some((root, importer)) = pending_async.pop_front() {
            if let Some(&existing) = async_by_root.get(&root) {
                chunks.add_parent(existing, importer);
                continue;
            }

            let chunk = chunks.create_chunk(None, ChunkKind::Async)?;
            async_by_root.insert(root, chunk);
            chunks.add_parent(chunk, importer);

            let mut boundaries = Vec::new();
            for module in graph.static_reachable(root, &mut boundaries) {
                chunks.add_module(chunk, module);
            }
            for boundary in boundaries {
                pending_async.push_back((boundary, chunk));
            }
        }

        debug!("Assigned {} chunk(s)", chunks.len());

        Ok(chunks)
    }

    /// Run the shared-chunk extraction rules from the configuration
    fn extract_shared_chunks(&self, chunks: &mut ChunkGraph) -> Result<(Vec<String>, Vec<String>)> {
        let specs: Vec<SharedChunkSpec> = self
            .config
            .shared_chunks
            .iter()
            .map(SharedChunkSpec::from_config)
            .collect::<Result<_>>()?;

        let graph = self.graph.read();
        let summary = SharedChunkExtractor::new(&graph)
            .with_options(ExtractOptions {
                warn_overlap: self.config.shared.warn_overlap,
            })
            .run(chunks, &specs)
            .context("shared chunk extraction failed")?;

        let created: Vec<String> = summary
            .created
            .iter()
            .filter_map(|&id| chunks.chunk(id).name().map(String::from))
            .collect();

        Ok((created, summary.skipped))
    }

    /// Write bundles to disk and assemble the per-entry load order
    fn write_bundles(
        &self,
        chunks: &ChunkGraph,
    ) -> Result<(Vec<BundleInfo>, HashMap<String, Vec<String>>)> {
        let output_dir = self
            .options
            .outdir
            .clone()
            .unwrap_or_else(|| self.config.output_dir());

        fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

        let graph = self.graph.read();
        let mut bundles = Vec::new();
        let mut filenames: HashMap<ChunkId, String> = HashMap::new();

        for chunk_id in chunks.chunk_ids() {
            let chunk = chunks.chunk(chunk_id);

            let mut bundle_code = String::new();
            bundle_code.push_str(&self.runtime_prelude());

            for module_id in chunk.modules() {
                let Some(module) = graph.get_module(module_id) else {
                    continue;
                };
                let registry_id = utils::module_registry_id(&module.path, &self.config.root);
                let code = module.transformed.as_ref().unwrap_or(&module.source);

                bundle_code.push_str(&format!(
                    "\n// Module: {}\n__commons_modules__[\"{}\"] = function(module, exports, require) {{\n{}\n}};\n",
                    registry_id, registry_id, code
                ));
            }

            // Entry chunks execute their entry module; the module itself may
            // live in a shared chunk by now, which loads earlier per the
            // entry sequence
            if chunk.kind() == ChunkKind::Entry {
                if let Some(entry_id) = self.entry_module_for(chunk, &graph)? {
                    if let Some(module) = graph.get_module(entry_id) {
                        bundle_code.push_str(&format!(
                            "\n// Execute entry point\n__commons_require__(\"{}\");\n",
                            utils::module_registry_id(&module.path, &self.config.root)
                        ));
                    }
                }
            }

            let base = match chunk.name() {
                Some(name) => name.to_string(),
                None => format!("chunk-{}", chunk_id),
            };
            let filename = if self.config.output.hash {
                format!("{}.{}.js", base, utils::hash_content(bundle_code.as_bytes()))
            } else {
                format!("{}.js", base)
            };

            let output_path = output_dir.join(&filename);
            fs::write(&output_path, &bundle_code)
                .with_context(|| format!("Failed to write bundle: {}", output_path.display()))?;

            filenames.insert(chunk_id, filename);
            bundles.push(BundleInfo {
                output_path,
                size: bundle_code.len(),
            });
        }

        // Per-entry load order, straight from the entry point sequences
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for entry_id in chunks.entry_point_ids() {
            let entry_point = chunks.entry_point(entry_id);
            let files = entry_point
                .chunks()
                .iter()
                .filter_map(|chunk_id| filenames.get(chunk_id).cloned())
                .collect();
            entries.insert(entry_point.name().to_string(), files);
        }

        if self.config.output.manifest {
            let manifest = serde_json::json!({ "entries": entries });
            let manifest_path = output_dir.join("manifest.json");
            fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
                .context("Failed to write manifest.json")?;
        }

        Ok((bundles, entries))
    }

    /// The entry module of an entry chunk, looked up through the
    /// configuration rather than chunk contents - extraction may have moved
    /// it elsewhere
    fn entry_module_for(&self, chunk: &Chunk, graph: &ModuleGraph) -> Result<Option<ModuleId>> {
        let Some(name) = chunk.name() else {
            return Ok(None);
        };
        let Some(path) = self.config.entrypoints.get(name) else {
            return Ok(None);
        };
        let canonical_path = fs::canonicalize(self.config.root.join(path))?;
        Ok(graph.get_module_id(&canonical_path))
    }

    /// Module registry bootstrap; safe to include in every bundle, only the
    /// first one to run installs the registry
    fn runtime_prelude(&self) -> String {
        r#"// Commons runtime
(function() {
  if (window.__commons_require__) {
    return;
  }

  var modules = {};
  var cache = {};

  function requireModule(id) {
    if (cache[id]) {
      return cache[id].exports;
    }

    var module = { exports: {} };
    cache[id] = module;

    var moduleFn = modules[id];
    if (moduleFn) {
      moduleFn(module, module.exports, requireModule);
    }

    return module.exports;
  }

  window.__commons_modules__ = modules;
  window.__commons_require__ = requireModule;
})();
"#
        .to_string()
    }
}
