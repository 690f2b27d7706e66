//! Chunk graph: output units, load-order parents, entry point sequences
//!
//! Chunks and entry points live in arenas keyed by plain ids. Membership is
//! kept as index sets with a module-to-chunks back-reference map, so the
//! graph can be rewritten (modules moved between chunks, parents rewired)
//! without ownership cycles.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use super::ModuleId;

/// Unique identifier for a chunk
pub type ChunkId = usize;

/// Unique identifier for an entry point
pub type EntryPointId = usize;

/// Type of chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Entry point chunk - loaded immediately
    Entry,
    /// Async chunk - loaded on demand via dynamic import
    Async,
    /// Shared chunk - contains modules extracted from multiple chunks
    Shared,
}

/// Returned by [`ChunkGraph::create_chunk`] when a named chunk already exists
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("chunk name `{0}` already exists")]
pub struct NameTaken(pub String);

/// A chunk is a group of modules that will be bundled together.
///
/// Invariant: the module set and the parents list stay consistent with the
/// global membership relations - every module reachable from this chunk is
/// either in it or in one of its transitive parents. All mutation goes
/// through [`ChunkGraph`] so the back-reference maps never drift.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk name (used for output filename); async chunks are anonymous
    name: Option<String>,

    /// Type of chunk
    kind: ChunkKind,

    /// Modules included in this chunk
    modules: BTreeSet<ModuleId>,

    /// Chunks that must be loaded before this one, in load order
    parents: Vec<ChunkId>,

    /// Chunks that depend on this one
    children: Vec<ChunkId>,

    /// Entry points whose load sequence includes this chunk
    entry_points: Vec<EntryPointId>,
}

impl Chunk {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> ChunkKind {
        self.kind
    }

    /// Modules in ascending id order
    pub fn modules(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.modules.iter().copied()
    }

    pub fn contains(&self, module: ModuleId) -> bool {
        self.modules.contains(&module)
    }

    pub fn parents(&self) -> &[ChunkId] {
        &self.parents
    }

    pub fn children(&self) -> &[ChunkId] {
        &self.children
    }

    pub fn entry_points(&self) -> &[EntryPointId] {
        &self.entry_points
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

/// An ordered sequence of chunks representing one build target's load order
#[derive(Debug, Clone)]
pub struct EntryPoint {
    name: String,
    chunks: Vec<ChunkId>,
}

impl EntryPoint {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chunks in load order
    pub fn chunks(&self) -> &[ChunkId] {
        &self.chunks
    }
}

/// Arena of chunks and entry points with membership back-references
#[derive(Debug, Default)]
pub struct ChunkGraph {
    chunks: Vec<Chunk>,
    entry_points: Vec<EntryPoint>,

    /// Named chunk lookup; anonymous chunks never collide
    by_name: HashMap<String, ChunkId>,

    /// Which chunks each module currently belongs to
    module_index: HashMap<ModuleId, BTreeSet<ChunkId>>,
}

impl ChunkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chunk. Fails when `name` is already taken by another chunk.
    pub fn create_chunk(
        &mut self,
        name: Option<String>,
        kind: ChunkKind,
    ) -> Result<ChunkId, NameTaken> {
        if let Some(name) = &name {
            if self.by_name.contains_key(name) {
                return Err(NameTaken(name.clone()));
            }
        }

        let id = self.chunks.len();
        if let Some(name) = &name {
            self.by_name.insert(name.clone(), id);
        }
        self.chunks.push(Chunk {
            name,
            kind,
            modules: BTreeSet::new(),
            parents: Vec::new(),
            children: Vec::new(),
            entry_points: Vec::new(),
        });

        Ok(id)
    }

    pub fn chunk(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id]
    }

    pub fn chunk_by_name(&self, name: &str) -> Option<ChunkId> {
        self.by_name.get(name).copied()
    }

    /// All chunk ids in creation order
    pub fn chunk_ids(&self) -> impl Iterator<Item = ChunkId> {
        0..self.chunks.len()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Add a module to a chunk, updating the membership back-reference
    pub fn add_module(&mut self, chunk: ChunkId, module: ModuleId) {
        if self.chunks[chunk].modules.insert(module) {
            self.module_index.entry(module).or_default().insert(chunk);
        }
    }

    /// Remove a module from a chunk. Returns whether it was present.
    pub fn remove_module(&mut self, chunk: ChunkId, module: ModuleId) -> bool {
        let removed = self.chunks[chunk].modules.remove(&module);
        if removed {
            if let Some(owners) = self.module_index.get_mut(&module) {
                owners.remove(&chunk);
            }
        }
        removed
    }

    /// Chunks the module currently belongs to, in ascending id order
    pub fn chunks_of(&self, module: ModuleId) -> Vec<ChunkId> {
        self.module_index
            .get(&module)
            .map(|owners| owners.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Record `parent` as a load-order dependency of `child`.
    ///
    /// Appends to `child.parents` and to `parent.children`, skipping
    /// duplicates and self-edges.
    pub fn add_parent(&mut self, child: ChunkId, parent: ChunkId) {
        if child == parent {
            return;
        }
        if !self.chunks[child].parents.contains(&parent) {
            self.chunks[child].parents.push(parent);
        }
        if !self.chunks[parent].children.contains(&child) {
            self.chunks[parent].children.push(child);
        }
    }

    /// Replace a chunk's parents list (used by order finalization)
    pub fn set_parents(&mut self, chunk: ChunkId, parents: Vec<ChunkId>) {
        self.chunks[chunk].parents = parents;
    }

    /// Create a new entry point with an empty chunk sequence
    pub fn create_entry_point(&mut self, name: impl Into<String>) -> EntryPointId {
        let id = self.entry_points.len();
        self.entry_points.push(EntryPoint {
            name: name.into(),
            chunks: Vec::new(),
        });
        id
    }

    pub fn entry_point(&self, id: EntryPointId) -> &EntryPoint {
        &self.entry_points[id]
    }

    pub fn entry_point_ids(&self) -> impl Iterator<Item = EntryPointId> {
        0..self.entry_points.len()
    }

    /// Append a chunk to an entry point's load sequence
    pub fn push_entry_chunk(&mut self, entry: EntryPointId, chunk: ChunkId) {
        if !self.entry_points[entry].chunks.contains(&chunk) {
            self.entry_points[entry].chunks.push(chunk);
        }
        if !self.chunks[chunk].entry_points.contains(&entry) {
            self.chunks[chunk].entry_points.push(entry);
        }
    }

    /// Insert `chunk` into an entry point's sequence immediately before
    /// `before`, preserving the relative order of all other chunks.
    ///
    /// If `chunk` already sits before `before` it is left in place; if it
    /// sits after, it is moved. The sequence never holds duplicates.
    pub fn insert_entry_chunk_before(
        &mut self,
        entry: EntryPointId,
        chunk: ChunkId,
        before: ChunkId,
    ) {
        let seq = &mut self.entry_points[entry].chunks;
        let Some(target) = seq.iter().position(|&c| c == before) else {
            return;
        };

        match seq.iter().position(|&c| c == chunk) {
            Some(existing) if existing < target => {}
            Some(existing) => {
                seq.remove(existing);
                // target shifts left after removing a later element only if
                // existing < target, which the arm above already handled
                seq.insert(target, chunk);
            }
            None => {
                seq.insert(target, chunk);
            }
        }

        if !self.chunks[chunk].entry_points.contains(&entry) {
            self.chunks[chunk].entry_points.push(entry);
        }
    }
}
