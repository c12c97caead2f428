//! Relationship target resolution.
//!
//! A reported target is just a (file, position) pair. Resolution is total
//! over (tracked, untracked) x (inside-symbol, outside-symbol):
//!
//! 1. tracked file, position inside a symbol -> that symbol's identity;
//! 2. tracked file, position outside every symbol -> the file's root node;
//! 3. untracked file -> the external placeholder for that path.
//!
//! Case 3 collapses every reference into a foreign file to one node. The
//! alternatives are worse in both directions: dropping the edge loses a
//! genuine cross-module relationship, and minting a node per foreign symbol
//! floods the graph with files the user never asked to see.

use callmap_core::{normalize_path, CoreError, Position, Result};

use crate::index::Enclosing;
use crate::model::{CallGraph, NodeRef};

/// Resolves an edge target. Never fails; placeholders are realized later,
/// when the edge is actually inserted.
pub(crate) fn resolve_target(graph: &CallGraph, file: &str, position: Position) -> NodeRef {
    let path = normalize_path(file);

    let Some(file_id) = graph.file_id(&path) else {
        tracing::debug!("collapsing target {path}:{position} into external node");
        return NodeRef::External(path);
    };

    let entry = graph.file(file_id);
    match entry.locate(position) {
        Enclosing::Symbol(slot) => NodeRef::Symbol(entry.symbol_id(slot)),
        Enclosing::Root => NodeRef::FileRoot(file_id),
    }
}

/// Resolves an edge source, which must lie in a registered file. Sources
/// may be symbols of any kind or the file root - container-level code can
/// call things too.
pub(crate) fn resolve_source(graph: &CallGraph, file: &str, position: Position) -> Result<NodeRef> {
    let path = normalize_path(file);
    let file_id = graph
        .file_id(&path)
        .ok_or(CoreError::UnknownFile(path))?;

    let entry = graph.file(file_id);
    Ok(match entry.locate(position) {
        Enclosing::Symbol(slot) => NodeRef::Symbol(entry.symbol_id(slot)),
        Enclosing::Root => NodeRef::FileRoot(file_id),
    })
}
