//! Candidate selection: which chunks to scan, which modules qualify

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::bundler::{ChunkGraph, ChunkId, ModuleGraph, ModuleId};

use super::spec::SharedChunkSpec;
use super::{ExtractOptions, ExtractionState};

/// Scan set and qualifying seed modules for one rule
#[derive(Debug)]
pub(crate) struct Candidates {
    /// Chunks scanned, in ascending id order
    pub scan: Vec<ChunkId>,

    /// Modules that passed the filter and met the occurrence threshold
    pub seeds: Vec<ModuleId>,
}

/// Compute the scan set and seed modules for `spec`.
///
/// Qualifying modules are claimed into the global ownership set immediately.
/// Modules already claimed by an earlier rule are skipped; when they would
/// have passed this rule's filter too, an overlap warning is emitted if
/// enabled.
pub(crate) fn select_candidates(
    modules: &ModuleGraph,
    graph: &ChunkGraph,
    spec: &SharedChunkSpec,
    state: &mut ExtractionState,
    options: &ExtractOptions,
) -> Candidates {
    let scan: Vec<ChunkId> = match &spec.chunks {
        // Anonymous chunks are always scanned, listed or not
        Some(names) => graph
            .chunk_ids()
            .filter(|&id| match graph.chunk(id).name() {
                Some(name) => names.iter().any(|n| n == name),
                None => true,
            })
            .collect(),
        None => graph.chunk_ids().collect(),
    };

    // Count the distinct scanned chunks each accepted module appears in.
    // Chunk module sets are real sets, so each chunk contributes at most one
    // occurrence per module.
    let mut occurrences: HashMap<ModuleId, usize> = HashMap::new();
    for &chunk_id in &scan {
        for module_id in graph.chunk(chunk_id).modules() {
            let Some(module) = modules.get_module(module_id) else {
                continue;
            };
            if !(spec.filter)(module) {
                continue;
            }
            if state.owned.contains(&module_id) {
                if options.warn_overlap {
                    warn!(
                        "module {} matches shared chunk `{}` but is already \
                         claimed by an earlier rule",
                        module.path.display(),
                        spec.name
                    );
                }
                continue;
            }
            *occurrences.entry(module_id).or_insert(0) += 1;
        }
    }

    let mut seeds: Vec<ModuleId> = occurrences
        .into_iter()
        .filter(|&(_, count)| count >= spec.min_chunks)
        .map(|(id, _)| id)
        .collect();
    seeds.sort_unstable();

    for &seed in &seeds {
        state.owned.insert(seed);
    }

    debug!(
        "shared chunk `{}`: scanned {} chunk(s), {} qualifying module(s)",
        spec.name,
        scan.len(),
        seeds.len()
    );

    Candidates { scan, seeds }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::bundler::{ChunkKind, Module, ModuleType};

    fn add_module(graph: &mut ModuleGraph, path: &str) -> ModuleId {
        graph.add_module(Module {
            path: PathBuf::from(path),
            source: String::new(),
            module_type: ModuleType::JavaScript,
            is_entry: false,
            transformed: None,
        })
    }

    fn fixture() -> (ModuleGraph, ChunkGraph, Vec<ModuleId>, Vec<ChunkId>) {
        let mut modules = ModuleGraph::new();
        let shared = add_module(&mut modules, "/src/vendor/shared.js");
        let only_a = add_module(&mut modules, "/src/a.js");
        let only_b = add_module(&mut modules, "/src/b.js");

        let mut chunks = ChunkGraph::new();
        let a = chunks.create_chunk(Some("a".into()), ChunkKind::Entry).unwrap();
        let b = chunks.create_chunk(Some("b".into()), ChunkKind::Entry).unwrap();
        chunks.add_module(a, shared);
        chunks.add_module(a, only_a);
        chunks.add_module(b, shared);
        chunks.add_module(b, only_b);

        (modules, chunks, vec![shared, only_a, only_b], vec![a, b])
    }

    #[test]
    fn test_min_chunks_threshold() {
        let (modules, chunks, ids, chunk_ids) = fixture();
        let mut state = ExtractionState::default();

        let spec = SharedChunkSpec::new("common").min_chunks(2);
        let candidates =
            select_candidates(&modules, &chunks, &spec, &mut state, &ExtractOptions::default());

        assert_eq!(candidates.scan, chunk_ids);
        assert_eq!(candidates.seeds, vec![ids[0]]);
        assert!(state.owned.contains(&ids[0]));
        assert!(!state.owned.contains(&ids[1]));
    }

    #[test]
    fn test_default_threshold_takes_everything_matching() {
        let (modules, chunks, ids, _) = fixture();
        let mut state = ExtractionState::default();

        let spec = SharedChunkSpec::new("all");
        let candidates =
            select_candidates(&modules, &chunks, &spec, &mut state, &ExtractOptions::default());

        assert_eq!(candidates.seeds, ids);
    }

    #[test]
    fn test_selected_chunks_restrict_scan_but_not_anonymous() {
        let (modules, mut chunks, ids, chunk_ids) = fixture();
        let anon = chunks.create_chunk(None, ChunkKind::Async).unwrap();
        chunks.add_module(anon, ids[2]);

        let mut state = ExtractionState::default();
        let spec = SharedChunkSpec::new("common").chunks(vec!["a".into()]);
        let candidates =
            select_candidates(&modules, &chunks, &spec, &mut state, &ExtractOptions::default());

        // Chunk `b` is excluded, the anonymous chunk is implicitly included
        assert_eq!(candidates.scan, vec![chunk_ids[0], anon]);
        assert_eq!(candidates.seeds, vec![ids[0], ids[1], ids[2]]);
    }

    #[test]
    fn test_owned_modules_are_never_reconsidered() {
        let (modules, chunks, ids, _) = fixture();
        let mut state = ExtractionState::default();
        state.owned.insert(ids[0]);

        let spec = SharedChunkSpec::new("common").min_chunks(2);
        let candidates =
            select_candidates(&modules, &chunks, &spec, &mut state, &ExtractOptions::default());

        assert!(candidates.seeds.is_empty());
    }

    #[test]
    fn test_filter_limits_candidates() {
        let (modules, chunks, ids, _) = fixture();
        let mut state = ExtractionState::default();

        let spec = SharedChunkSpec::new("vendor").filter(Arc::new(|m: &Module| {
            m.path.components().any(|c| c.as_os_str() == "vendor")
        }));
        let candidates =
            select_candidates(&modules, &chunks, &spec, &mut state, &ExtractOptions::default());

        assert_eq!(candidates.seeds, vec![ids[0]]);
    }
}
