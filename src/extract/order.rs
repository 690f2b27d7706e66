//! Final ordering of each chunk's parents list

use tracing::warn;

use crate::bundler::{ChunkGraph, ChunkId};

/// Reorder every chunk's parents so foundational chunks come first.
///
/// Runs once, after all extraction rules, over all chunks - detachment can
/// have touched pre-existing chunks' parent lists too. The rule is pairwise:
/// when parent A appears in parent B's own parents list, A sorts before B.
/// This is not a total order, so parents are placed by insertion instead of
/// `sort_by`. It assumes the parents relation is acyclic, which holds because
/// parents are only appended as chunks are created after their dependencies;
/// a direct two-cycle is still checked and reported.
pub fn finalize_parent_order(graph: &mut ChunkGraph) {
    let chunk_ids: Vec<ChunkId> = graph.chunk_ids().collect();

    for chunk_id in chunk_ids {
        let parents = graph.chunk(chunk_id).parents().to_vec();
        if parents.len() < 2 {
            continue;
        }

        detect_parent_cycles(graph, chunk_id, &parents);

        let mut ordered: Vec<ChunkId> = Vec::with_capacity(parents.len());
        for &parent in &parents {
            // Place before the first already-placed parent that depends on it
            let position = ordered
                .iter()
                .position(|&placed| graph.chunk(placed).parents().contains(&parent))
                .unwrap_or(ordered.len());
            ordered.insert(position, parent);
        }

        graph.set_parents(chunk_id, ordered);
    }
}

fn detect_parent_cycles(graph: &ChunkGraph, chunk_id: ChunkId, parents: &[ChunkId]) {
    for (i, &a) in parents.iter().enumerate() {
        for &b in &parents[i + 1..] {
            let a_before_b = graph.chunk(b).parents().contains(&a);
            let b_before_a = graph.chunk(a).parents().contains(&b);
            if a_before_b && b_before_a {
                warn!(
                    "parents {:?} and {:?} of chunk {:?} depend on each other; \
                     load order between them is unspecified",
                    graph.chunk(a).name(),
                    graph.chunk(b).name(),
                    graph.chunk(chunk_id).name()
                );
                debug_assert!(
                    false,
                    "cycle in chunk parents relation: {} <-> {}",
                    a, b
                );
            }
        }
    }
}
