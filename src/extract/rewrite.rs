//! Chunk rewriting: materialize a shared chunk and rewire the graph

use tracing::{debug, info};

use crate::bundler::{ChunkGraph, ChunkId, ChunkKind, ModuleId};

use super::closure::Closure;
use super::spec::SharedChunkSpec;
use super::{ExtractError, ExtractionState};

/// Create the shared chunk for one rule and update the graph around it.
///
/// Returns `Ok(None)` when the rule matched nothing (no chunk is created and
/// later rules proceed normally). Fails when the rule's target name is
/// already taken by an existing chunk.
pub(crate) fn rewrite_chunks(
    graph: &mut ChunkGraph,
    spec: &SharedChunkSpec,
    scan: &[ChunkId],
    seeds: &[ModuleId],
    closure: &Closure,
    state: &mut ExtractionState,
) -> Result<Option<ChunkId>, ExtractError> {
    if seeds.is_empty() && closure.extra.is_empty() {
        info!(
            "shared chunk `{}` matched no modules for this build, skipping",
            spec.name
        );
        return Ok(None);
    }

    let new_chunk = graph
        .create_chunk(Some(spec.name.clone()), ChunkKind::Shared)
        .map_err(|taken| ExtractError::NameCollision(taken.0))?;

    // The chunk takes the seeds plus everything the closure pulled in;
    // pulled-in modules are claimed now
    for &module in seeds.iter().chain(closure.extra.iter()) {
        graph.add_module(new_chunk, module);
    }
    for &module in &closure.extra {
        state.owned.insert(module);
    }

    // Chunks that already own part of the closure load before this one
    for &dep in &closure.chunk_deps {
        graph.add_parent(new_chunk, dep);
    }

    // Detach the moved modules from every scanned chunk that still holds them
    let moved: Vec<ModuleId> = graph.chunk(new_chunk).modules().collect();
    let mut affected: Vec<ChunkId> = Vec::new();
    for &chunk_id in scan {
        let mut any_removed = false;
        for &module in &moved {
            if graph.remove_module(chunk_id, module) {
                any_removed = true;
            }
        }
        if any_removed {
            affected.push(chunk_id);
        }
    }

    // Every chunk that lost modules now depends on the shared chunk, and the
    // shared chunk slots in ahead of it in each entry point's load sequence
    for &chunk_id in &affected {
        graph.add_parent(chunk_id, new_chunk);

        let entry_points = graph.chunk(chunk_id).entry_points().to_vec();
        for entry in entry_points {
            graph.insert_entry_chunk_before(entry, new_chunk, chunk_id);
        }
    }

    state.created.push(new_chunk);

    debug!(
        "created shared chunk `{}` with {} module(s), {} parent(s), {} affected chunk(s)",
        spec.name,
        moved.len(),
        closure.chunk_deps.len(),
        affected.len()
    );

    Ok(Some(new_chunk))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rule_is_a_skip() {
        let mut graph = ChunkGraph::new();
        let mut state = ExtractionState::default();
        let spec = SharedChunkSpec::new("nothing");

        let result =
            rewrite_chunks(&mut graph, &spec, &[], &[], &Closure::default(), &mut state).unwrap();

        assert_eq!(result, None);
        assert!(graph.chunk_by_name("nothing").is_none());
        assert!(state.created.is_empty());
    }

    #[test]
    fn test_name_collision_is_fatal() {
        let mut graph = ChunkGraph::new();
        graph
            .create_chunk(Some("main".into()), ChunkKind::Entry)
            .unwrap();
        let mut state = ExtractionState::default();
        let spec = SharedChunkSpec::new("main");

        let closure = Closure {
            extra: vec![1],
            chunk_deps: vec![],
        };
        let err = rewrite_chunks(&mut graph, &spec, &[], &[0], &closure, &mut state).unwrap_err();
        assert!(matches!(err, ExtractError::NameCollision(name) if name == "main"));
    }

    #[test]
    fn test_detach_and_rewire() {
        let mut graph = ChunkGraph::new();
        let a = graph.create_chunk(Some("a".into()), ChunkKind::Entry).unwrap();
        let b = graph.create_chunk(Some("b".into()), ChunkKind::Entry).unwrap();
        let ep_a = graph.create_entry_point("a");
        let ep_b = graph.create_entry_point("b");
        graph.push_entry_chunk(ep_a, a);
        graph.push_entry_chunk(ep_b, b);

        // Module 10 is shared; 11 and 12 are chunk-local
        graph.add_module(a, 10);
        graph.add_module(a, 11);
        graph.add_module(b, 10);
        graph.add_module(b, 12);

        let mut state = ExtractionState::default();
        state.owned.insert(10);

        let spec = SharedChunkSpec::new("shared");
        let shared = rewrite_chunks(
            &mut graph,
            &spec,
            &[a, b],
            &[10],
            &Closure::default(),
            &mut state,
        )
        .unwrap()
        .unwrap();

        // Moved module lives only in the shared chunk now
        assert_eq!(graph.chunks_of(10), vec![shared]);
        assert!(graph.chunk(a).contains(11));
        assert!(graph.chunk(b).contains(12));

        // Affected chunks parent on the new chunk, which lists them as children
        assert_eq!(graph.chunk(a).parents(), &[shared]);
        assert_eq!(graph.chunk(b).parents(), &[shared]);
        assert_eq!(graph.chunk(shared).children(), &[a, b]);

        // Load order: shared chunk first in both entry sequences
        assert_eq!(graph.entry_point(ep_a).chunks(), &[shared, a]);
        assert_eq!(graph.entry_point(ep_b).chunks(), &[shared, b]);

        assert_eq!(state.created, vec![shared]);
    }

    #[test]
    fn test_extra_modules_are_claimed_and_chunk_deps_become_parents() {
        let mut graph = ChunkGraph::new();
        let a = graph.create_chunk(Some("a".into()), ChunkKind::Entry).unwrap();
        let vendor = graph
            .create_chunk(Some("vendor".into()), ChunkKind::Shared)
            .unwrap();
        graph.add_module(a, 20);

        let mut state = ExtractionState::default();
        state.owned.insert(20);
        state.created.push(vendor);

        let spec = SharedChunkSpec::new("common");
        let closure = Closure {
            extra: vec![21],
            chunk_deps: vec![vendor],
        };
        let common = rewrite_chunks(&mut graph, &spec, &[a], &[20], &closure, &mut state)
            .unwrap()
            .unwrap();

        assert!(state.owned.contains(&21));
        assert_eq!(graph.chunk(common).parents(), &[vendor]);
        assert_eq!(graph.chunk(vendor).children(), &[common]);
        let members: Vec<_> = graph.chunk(common).modules().collect();
        assert_eq!(members, vec![20, 21]);
        assert_eq!(state.created, vec![vendor, common]);
    }
}
