//! Shared-chunk extraction engine
//!
//! De-duplicates modules that several chunks have in common into separately
//! loadable shared chunks, following user-declared rules. Each rule selects
//! candidate modules (filter + occurrence threshold), expands them over the
//! module dependency graph, materializes a new chunk, and rewires chunk
//! membership, chunk parents and entry-point load order. After all rules ran,
//! [`finalize_parent_order`] makes every chunk's parents list load
//! foundational chunks first.
//!
//! The engine is synchronous and single-pass: rules run in declaration order,
//! and a module claimed by one rule is never reclaimed by a later one - a
//! later rule's closure resolves into the earlier rule's chunk instead.

mod closure;
mod order;
mod rewrite;
mod select;
mod spec;

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::bundler::{ChunkGraph, ChunkId, ModuleGraph, ModuleId};

pub use order::finalize_parent_order;
pub use spec::{ModuleFilter, SharedChunkSpec};

/// Fatal extraction failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// A rule's target name is already taken by an existing chunk.
    /// Extracting into pre-existing chunks is disallowed - ownership of
    /// their current content would be ambiguous.
    #[error("shared chunk name `{0}` collides with an existing chunk")]
    NameCollision(String),
}

/// Knobs for one extraction run
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Warn when a module matches a rule's filter but was already claimed
    /// by an earlier rule
    pub warn_overlap: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { warn_overlap: true }
    }
}

/// State threaded through a full extraction run, across all rules
#[derive(Debug, Default)]
pub(crate) struct ExtractionState {
    /// Modules claimed by some shared chunk created in this run.
    /// Grows monotonically; a claimed module is never reconsidered.
    pub owned: HashSet<ModuleId>,

    /// Shared chunks created so far, in creation order
    pub created: Vec<ChunkId>,
}

/// What an extraction run did
#[derive(Debug, Default)]
pub struct ExtractionSummary {
    /// Shared chunks created, in rule order
    pub created: Vec<ChunkId>,

    /// Names of rules that matched nothing and were skipped
    pub skipped: Vec<String>,
}

/// Runs shared-chunk extraction rules against a chunk graph
pub struct SharedChunkExtractor<'a> {
    modules: &'a ModuleGraph,
    options: ExtractOptions,
}

impl<'a> SharedChunkExtractor<'a> {
    pub fn new(modules: &'a ModuleGraph) -> Self {
        Self {
            modules,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Run all rules in declaration order.
    ///
    /// Order matters: ownership is rule-order dependent, and a later rule's
    /// dependency closure resolves into chunks created by earlier rules,
    /// never the other way around.
    pub fn run(
        &self,
        graph: &mut ChunkGraph,
        specs: &[SharedChunkSpec],
    ) -> Result<ExtractionSummary, ExtractError> {
        let mut state = ExtractionState::default();
        let mut summary = ExtractionSummary::default();

        for spec in specs {
            debug!("running shared chunk rule `{}`", spec.name);

            let candidates =
                select::select_candidates(self.modules, graph, spec, &mut state, &self.options);
            let closure =
                closure::resolve_closure(self.modules, graph, &candidates.seeds, &state);

            match rewrite::rewrite_chunks(
                graph,
                spec,
                &candidates.scan,
                &candidates.seeds,
                &closure,
                &mut state,
            )? {
                Some(chunk) => summary.created.push(chunk),
                None => summary.skipped.push(spec.name.clone()),
            }
        }

        Ok(summary)
    }
}
