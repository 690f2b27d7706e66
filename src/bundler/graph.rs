//! Module graph data structures

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

/// Unique identifier for a module
pub type ModuleId = usize;

/// Types of modules the bundler can handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleType {
    JavaScript,
    Css,
    Json,
    Unknown,
}

impl ModuleType {
    /// Determine module type from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => ModuleType::JavaScript,
            "css" => ModuleType::Css,
            "json" => ModuleType::Json,
            _ => ModuleType::Unknown,
        }
    }

    /// Check if this module type can carry import statements
    pub fn is_js_like(&self) -> bool {
        matches!(self, ModuleType::JavaScript)
    }
}

/// How a dependency is requested at the source level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// Static `import`/`require` - loads with the importing chunk
    Static,
    /// Dynamic `import()` - creates an async code-split boundary
    Dynamic,
}

/// A single dependency reference of a module.
///
/// References to external code (bare specifiers, runtime-provided globals)
/// stay unresolved: `target` is `None` and chunking ignores them.
#[derive(Debug, Clone)]
pub struct DependencyRef {
    /// Import specifier as written in the source
    pub specifier: String,

    /// Resolved target module, if the specifier resolved to a file
    pub target: Option<ModuleId>,

    /// Static or dynamic request
    pub kind: DependencyKind,
}

/// A module in the dependency graph
#[derive(Debug, Clone)]
pub struct Module {
    /// Absolute path to the module
    pub path: PathBuf,

    /// Original source code
    pub source: String,

    /// Module type
    pub module_type: ModuleType,

    /// Whether this is an entry point
    pub is_entry: bool,

    /// Transformed code (after CSS/JSON wrapping)
    pub transformed: Option<String>,
}

impl Module {
    /// Detect module type from path
    pub fn detect_type(path: &PathBuf) -> ModuleType {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(ModuleType::from_extension)
            .unwrap_or(ModuleType::Unknown)
    }
}

/// The module dependency graph.
///
/// Modules live in an arena keyed by [`ModuleId`]; each module carries an
/// ordered list of dependency references. The graph is built once by the
/// bundler and read-only afterwards - chunk membership lives in the chunk
/// graph, not here.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// All modules indexed by their ID
    modules: HashMap<ModuleId, Module>,

    /// Map from path to module ID
    path_to_id: HashMap<PathBuf, ModuleId>,

    /// Ordered dependency references per module
    deps: HashMap<ModuleId, Vec<DependencyRef>>,

    /// Next available module ID
    next_id: ModuleId,
}

impl ModuleGraph {
    /// Create a new empty module graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the graph
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        let path = module.path.clone();

        // Check if already exists
        if let Some(&id) = self.path_to_id.get(&path) {
            return id;
        }

        let id = self.next_id;
        self.next_id += 1;

        self.path_to_id.insert(path, id);
        self.modules.insert(id, module);
        self.deps.insert(id, Vec::new());

        id
    }

    /// Append a dependency reference to a module's ordered list
    pub fn add_dependency(&mut self, from: ModuleId, dep: DependencyRef) {
        if let Some(refs) = self.deps.get_mut(&from) {
            refs.push(dep);
        }
    }

    /// Get module ID from path
    pub fn get_module_id(&self, path: &PathBuf) -> Option<ModuleId> {
        self.path_to_id.get(path).copied()
    }

    /// Get a module by ID
    pub fn get_module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    /// Get a mutable reference to a module
    pub fn get_module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(&id)
    }

    /// Get all module IDs in ascending order
    pub fn all_module_ids(&self) -> Vec<ModuleId> {
        let mut ids: Vec<ModuleId> = self.modules.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Ordered dependency references of a module
    pub fn dependencies(&self, id: ModuleId) -> &[DependencyRef] {
        self.deps.get(&id).map(|refs| refs.as_slice()).unwrap_or(&[])
    }

    /// Resolved dependency targets of a module, in reference order
    pub fn resolved_dependencies(&self, id: ModuleId) -> impl Iterator<Item = ModuleId> + '_ {
        self.dependencies(id).iter().filter_map(|dep| dep.target)
    }

    /// Modules statically reachable from `start` (BFS).
    ///
    /// Dynamic references are boundaries: their targets are collected into
    /// `boundaries` instead of being entered, so callers can turn each one
    /// into an async chunk root.
    pub fn static_reachable(
        &self,
        start: ModuleId,
        boundaries: &mut Vec<ModuleId>,
    ) -> Vec<ModuleId> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();

        queue.push_back(start);
        visited.insert(start);

        while let Some(id) = queue.pop_front() {
            result.push(id);

            for dep in self.dependencies(id) {
                let Some(target) = dep.target else { continue };
                match dep.kind {
                    DependencyKind::Static => {
                        if visited.insert(target) {
                            queue.push_back(target);
                        }
                    }
                    DependencyKind::Dynamic => {
                        if !boundaries.contains(&target) {
                            boundaries.push(target);
                        }
                    }
                }
            }
        }

        result
    }

    /// Total number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str) -> Module {
        Module {
            path: PathBuf::from(path),
            source: String::new(),
            module_type: ModuleType::JavaScript,
            is_entry: false,
            transformed: None,
        }
    }

    fn static_dep(target: ModuleId) -> DependencyRef {
        DependencyRef {
            specifier: format!("./m{}", target),
            target: Some(target),
            kind: DependencyKind::Static,
        }
    }

    #[test]
    fn test_module_type_detection() {
        assert_eq!(ModuleType::from_extension("js"), ModuleType::JavaScript);
        assert_eq!(ModuleType::from_extension("mjs"), ModuleType::JavaScript);
        assert_eq!(ModuleType::from_extension("css"), ModuleType::Css);
        assert_eq!(ModuleType::from_extension("json"), ModuleType::Json);
        assert_eq!(ModuleType::from_extension("xyz"), ModuleType::Unknown);
    }

    #[test]
    fn test_module_graph_basic() {
        let mut graph = ModuleGraph::new();

        let id = graph.add_module(module("/test/main.js"));
        assert_eq!(graph.len(), 1);
        assert!(graph.get_module(id).is_some());
        assert_eq!(graph.get_module_id(&PathBuf::from("/test/main.js")), Some(id));

        // Adding the same path again returns the existing id
        assert_eq!(graph.add_module(module("/test/main.js")), id);
    }

    #[test]
    fn test_unresolved_references_are_skipped() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(module("/a.js"));
        let b = graph.add_module(module("/b.js"));

        graph.add_dependency(a, static_dep(b));
        graph.add_dependency(
            a,
            DependencyRef {
                specifier: "react".into(),
                target: None,
                kind: DependencyKind::Static,
            },
        );

        assert_eq!(graph.dependencies(a).len(), 2);
        let resolved: Vec<_> = graph.resolved_dependencies(a).collect();
        assert_eq!(resolved, vec![b]);
    }

    #[test]
    fn test_static_reachable_stops_at_dynamic_boundary() {
        let mut graph = ModuleGraph::new();
        let entry = graph.add_module(module("/entry.js"));
        let shared = graph.add_module(module("/shared.js"));
        let lazy = graph.add_module(module("/lazy.js"));

        graph.add_dependency(entry, static_dep(shared));
        graph.add_dependency(
            entry,
            DependencyRef {
                specifier: "./lazy".into(),
                target: Some(lazy),
                kind: DependencyKind::Dynamic,
            },
        );

        let mut boundaries = Vec::new();
        let reachable = graph.static_reachable(entry, &mut boundaries);

        assert_eq!(reachable, vec![entry, shared]);
        assert_eq!(boundaries, vec![lazy]);
    }

    #[test]
    fn test_static_reachable_survives_cycles() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(module("/a.js"));
        let b = graph.add_module(module("/b.js"));

        graph.add_dependency(a, static_dep(b));
        graph.add_dependency(b, static_dep(a));

        let mut boundaries = Vec::new();
        let reachable = graph.static_reachable(a, &mut boundaries);
        assert_eq!(reachable, vec![a, b]);
        assert!(boundaries.is_empty());
    }
}
