//! Dependency closure: what must travel with the seed modules

use std::collections::HashSet;

use crate::bundler::{ChunkGraph, ChunkId, ModuleGraph, ModuleId};

use super::ExtractionState;

/// Result of expanding a seed set over the module dependency graph
#[derive(Debug, Default)]
pub(crate) struct Closure {
    /// Transitively required modules not yet claimed by any rule,
    /// in discovery order
    pub extra: Vec<ModuleId>,

    /// Previously created shared chunks that must become parents because
    /// they already own a transitively reached module
    pub chunk_deps: Vec<ChunkId>,
}

/// Walk the resolved dependency references of every seed module, depth-first.
///
/// Unclaimed modules are recorded once in `extra` and walked further.
/// Claimed modules are a closure boundary: whichever created chunk owns them
/// already satisfies everything they transitively need, so the walk stops
/// there and that chunk becomes a dependency instead. The recorded-once check
/// also terminates the walk on cyclic module graphs.
pub(crate) fn resolve_closure(
    modules: &ModuleGraph,
    graph: &ChunkGraph,
    seeds: &[ModuleId],
    state: &ExtractionState,
) -> Closure {
    let mut closure = Closure::default();

    let mut walked: HashSet<ModuleId> = seeds.iter().copied().collect();
    let mut chunk_dep_set: HashSet<ChunkId> = HashSet::new();
    let mut owned_seen: HashSet<ModuleId> = HashSet::new();

    // Explicit stack; the module graph is user input and recursion depth
    // must not depend on it
    let mut stack: Vec<ModuleId> = seeds.iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        for target in modules.resolved_dependencies(id) {
            if state.owned.contains(&target) {
                if !owned_seen.insert(target) {
                    continue;
                }
                // Seeds of the current rule are owned too but sit in no
                // created chunk yet, so they add no dependency here
                for &created in &state.created {
                    if graph.chunk(created).contains(target) && chunk_dep_set.insert(created) {
                        closure.chunk_deps.push(created);
                    }
                }
            } else if walked.insert(target) {
                closure.extra.push(target);
                stack.push(target);
            }
        }
    }

    closure
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::bundler::{ChunkKind, DependencyKind, DependencyRef, Module, ModuleType};

    fn add_module(graph: &mut ModuleGraph, path: &str) -> ModuleId {
        graph.add_module(Module {
            path: PathBuf::from(path),
            source: String::new(),
            module_type: ModuleType::JavaScript,
            is_entry: false,
            transformed: None,
        })
    }

    fn link(graph: &mut ModuleGraph, from: ModuleId, to: ModuleId) {
        graph.add_dependency(
            from,
            DependencyRef {
                specifier: format!("./m{}", to),
                target: Some(to),
                kind: DependencyKind::Static,
            },
        );
    }

    #[test]
    fn test_unowned_dependencies_become_extra_modules() {
        let mut modules = ModuleGraph::new();
        let seed = add_module(&mut modules, "/seed.js");
        let dep = add_module(&mut modules, "/dep.js");
        let transitive = add_module(&mut modules, "/transitive.js");
        link(&mut modules, seed, dep);
        link(&mut modules, dep, transitive);

        let graph = ChunkGraph::new();
        let mut state = ExtractionState::default();
        state.owned.insert(seed);

        let closure = resolve_closure(&modules, &graph, &[seed], &state);
        assert_eq!(closure.extra, vec![dep, transitive]);
        assert!(closure.chunk_deps.is_empty());
    }

    #[test]
    fn test_owned_dependency_becomes_chunk_dep_and_stops_walk() {
        let mut modules = ModuleGraph::new();
        let seed = add_module(&mut modules, "/seed.js");
        let owned = add_module(&mut modules, "/owned.js");
        let behind = add_module(&mut modules, "/behind-owned.js");
        link(&mut modules, seed, owned);
        link(&mut modules, owned, behind);

        let mut graph = ChunkGraph::new();
        let vendor = graph
            .create_chunk(Some("vendor".into()), ChunkKind::Shared)
            .unwrap();
        graph.add_module(vendor, owned);

        let mut state = ExtractionState::default();
        state.owned.insert(seed);
        state.owned.insert(owned);
        state.created.push(vendor);

        let closure = resolve_closure(&modules, &graph, &[seed], &state);

        // The walk must not continue past the owned module
        assert!(closure.extra.is_empty());
        assert_eq!(closure.chunk_deps, vec![vendor]);
    }

    #[test]
    fn test_seed_reaching_another_seed_adds_nothing() {
        let mut modules = ModuleGraph::new();
        let a = add_module(&mut modules, "/a.js");
        let b = add_module(&mut modules, "/b.js");
        link(&mut modules, a, b);

        let graph = ChunkGraph::new();
        let mut state = ExtractionState::default();
        state.owned.insert(a);
        state.owned.insert(b);

        let closure = resolve_closure(&modules, &graph, &[a, b], &state);
        assert!(closure.extra.is_empty());
        assert!(closure.chunk_deps.is_empty());
    }

    #[test]
    fn test_terminates_on_dependency_cycles() {
        let mut modules = ModuleGraph::new();
        let seed = add_module(&mut modules, "/seed.js");
        let x = add_module(&mut modules, "/x.js");
        let y = add_module(&mut modules, "/y.js");
        link(&mut modules, seed, x);
        link(&mut modules, x, y);
        link(&mut modules, y, x);
        link(&mut modules, y, seed);

        let graph = ChunkGraph::new();
        let mut state = ExtractionState::default();
        state.owned.insert(seed);

        let closure = resolve_closure(&modules, &graph, &[seed], &state);
        assert_eq!(closure.extra, vec![x, y]);
    }

    #[test]
    fn test_diamond_records_each_module_once() {
        let mut modules = ModuleGraph::new();
        let a = add_module(&mut modules, "/a.js");
        let b = add_module(&mut modules, "/b.js");
        let left = add_module(&mut modules, "/left.js");
        let right = add_module(&mut modules, "/right.js");
        let bottom = add_module(&mut modules, "/bottom.js");
        link(&mut modules, a, left);
        link(&mut modules, b, right);
        link(&mut modules, left, bottom);
        link(&mut modules, right, bottom);

        let graph = ChunkGraph::new();
        let mut state = ExtractionState::default();
        state.owned.insert(a);
        state.owned.insert(b);

        let closure = resolve_closure(&modules, &graph, &[a, b], &state);
        assert_eq!(
            closure.extra.iter().filter(|&&m| m == bottom).count(),
            1
        );
        assert_eq!(closure.extra.len(), 3);
    }
}
