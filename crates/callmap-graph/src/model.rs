//! The graph model.
//!
//! `CallGraph` is the single consistent snapshot handed to serialization:
//! an ordered file list (each file carrying its symbol arena) plus a
//! petgraph edge store with side indexes for identity lookup. Edges are an
//! adjacency structure keyed by endpoint identities, never owned links, so
//! cyclic call chains are structurally unproblematic.

use callmap_core::Range;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::registry::{FileEntry, FileId, SymbolId};

/// An addressable endpoint in the graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeRef {
    /// A registered symbol.
    Symbol(SymbolId),
    /// The synthetic per-file target for positions inside a tracked file
    /// but outside every symbol (top-level statements and the like).
    FileRoot(FileId),
    /// The single placeholder for any position in a file that was never
    /// registered, keyed by normalized path.
    External(String),
}

/// Kind of a relationship, used for styling and edge ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Call,
    Implements,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Call => write!(f, "call"),
            RelationKind::Implements => write!(f, "implements"),
        }
    }
}

/// Payload of an edge.
///
/// A call edge carries the set of call-site ranges that were merged into
/// it; repeated reports between the same endpoints grow the set instead of
/// duplicating the edge. Implements edges carry nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationData {
    Call { sites: BTreeSet<Range> },
    Implements,
}

impl RelationData {
    pub fn kind(&self) -> RelationKind {
        match self {
            RelationData::Call { .. } => RelationKind::Call,
            RelationData::Implements => RelationKind::Implements,
        }
    }
}

/// Counts for the stats surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub files: usize,
    pub symbols: usize,
    pub call_edges: usize,
    pub call_sites: usize,
    pub implements_edges: usize,
    pub file_roots: usize,
    pub external_files: usize,
}

/// The aggregated, deduplicated graph for one generation request.
///
/// Built through `GraphBuilder`, read-only afterwards. Files keep their
/// registration order; that order is the only cluster-ordering guarantee
/// the serializer gets.
#[derive(Debug, Default)]
pub struct CallGraph {
    files: Vec<FileEntry>,
    by_path: HashMap<String, FileId>,
    relations: DiGraph<NodeRef, RelationData>,
    nodes: HashMap<NodeRef, NodeIndex>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.relations.edge_count() == 0
    }

    /// Files in registration order.
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter()
    }

    pub fn file(&self, id: FileId) -> &FileEntry {
        &self.files[id.index()]
    }

    /// Looks up a file by its normalized path.
    pub fn file_id(&self, path: &str) -> Option<FileId> {
        self.by_path.get(path).copied()
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Registers a validated entry and one graph node per symbol.
    pub(crate) fn register_file(&mut self, entry: FileEntry) -> FileId {
        let id = entry.id();
        self.by_path.insert(entry.path().to_owned(), id);
        tracing::debug!(
            "registered {} ({} symbols)",
            entry.path(),
            entry.symbol_count()
        );

        let symbol_ids: Vec<_> = (0..entry.symbol_count())
            .map(|slot| entry.symbol_id(slot))
            .collect();
        self.files.push(entry);
        for sid in symbol_ids {
            self.ensure_node(NodeRef::Symbol(sid));
        }
        id
    }

    /// Returns the store index for `node`, realizing it on first use.
    /// This is what makes file roots and external placeholders lazy and
    /// deduplicated.
    pub(crate) fn ensure_node(&mut self, node: NodeRef) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&node) {
            return idx;
        }
        let idx = self.relations.add_node(node.clone());
        self.nodes.insert(node, idx);
        idx
    }

    pub fn has_node(&self, node: &NodeRef) -> bool {
        self.nodes.contains_key(node)
    }

    /// Whether any edge ever targeted the file's root.
    pub fn file_root_realized(&self, id: FileId) -> bool {
        self.nodes.contains_key(&NodeRef::FileRoot(id))
    }

    /// Realized external placeholders, sorted by path for deterministic
    /// emission.
    pub fn external_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .nodes
            .keys()
            .filter_map(|node| match node {
                NodeRef::External(path) => Some(path.as_str()),
                _ => None,
            })
            .collect();
        paths.sort_unstable();
        paths
    }

    /// Inserts or merges a call edge; repeated (from, to) pairs grow the
    /// site set.
    pub(crate) fn merge_call(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        sites: impl IntoIterator<Item = Range>,
    ) {
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);

        let existing = self
            .relations
            .edges_connecting(a, b)
            .find(|e| e.weight().kind() == RelationKind::Call)
            .map(|e| e.id());

        match existing {
            Some(edge) => {
                if let Some(RelationData::Call { sites: set }) =
                    self.relations.edge_weight_mut(edge)
                {
                    set.extend(sites);
                }
            }
            None => {
                self.relations.add_edge(
                    a,
                    b,
                    RelationData::Call {
                        sites: sites.into_iter().collect(),
                    },
                );
            }
        }
    }

    /// Inserts an implements edge; duplicates collapse.
    pub(crate) fn add_implements(&mut self, from: NodeRef, to: NodeRef) {
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);

        let exists = self
            .relations
            .edges_connecting(a, b)
            .any(|e| e.weight().kind() == RelationKind::Implements);
        if !exists {
            self.relations.add_edge(a, b, RelationData::Implements);
        }
    }

    /// All relationships as (source, target, payload) triples, in store
    /// order. The serializer sorts; queries filter.
    pub fn relations(&self) -> impl Iterator<Item = (&NodeRef, &NodeRef, &RelationData)> {
        self.relations.edge_references().filter_map(|e| {
            let from = self.relations.node_weight(e.source())?;
            let to = self.relations.node_weight(e.target())?;
            Some((from, to, e.weight()))
        })
    }

    /// Nodes with a call edge into `node`.
    pub fn callers_of(&self, node: &NodeRef) -> Vec<&NodeRef> {
        self.neighbors(node, Direction::Incoming)
    }

    /// Nodes `node` has a call edge to.
    pub fn callees_of(&self, node: &NodeRef) -> Vec<&NodeRef> {
        self.neighbors(node, Direction::Outgoing)
    }

    fn neighbors(&self, node: &NodeRef, direction: Direction) -> Vec<&NodeRef> {
        let Some(&idx) = self.nodes.get(node) else {
            return Vec::new();
        };
        self.relations
            .edges_directed(idx, direction)
            .filter(|e| e.weight().kind() == RelationKind::Call)
            .filter_map(|e| {
                let other = match direction {
                    Direction::Incoming => e.source(),
                    Direction::Outgoing => e.target(),
                };
                self.relations.node_weight(other)
            })
            .collect()
    }

    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        let mut call_edges = 0;
        let mut call_sites = 0;
        let mut implements_edges = 0;
        for weight in self.relations.edge_weights() {
            match weight {
                RelationData::Call { sites } => {
                    call_edges += 1;
                    call_sites += sites.len();
                }
                RelationData::Implements => implements_edges += 1,
            }
        }

        GraphStats {
            files: self.files.len(),
            symbols: self.files.iter().map(|f| f.symbol_count()).sum(),
            call_edges,
            call_sites,
            implements_edges,
            file_roots: self
                .nodes
                .keys()
                .filter(|n| matches!(n, NodeRef::FileRoot(_)))
                .count(),
            external_files: self
                .nodes
                .keys()
                .filter(|n| matches!(n, NodeRef::External(_)))
                .count(),
        }
    }
}
