//! Graph construction facade.
//!
//! `GraphBuilder` is the engine's mutable surface: register files, report
//! relationships, then `build()` to freeze the model for serialization.
//! All calls are synchronous and must be delivered one at a time; data
//! collection may well be concurrent, but its results are fed in
//! sequentially.

use callmap_core::{
    normalize_path, CoreError, Location, OutgoingCall, Position, Range, Result, Symbol,
};

use crate::model::{CallGraph, NodeRef};
use crate::registry::{FileEntry, FileId, SymbolId, ValidationMode};
use crate::resolver;

/// Builds one `CallGraph`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: CallGraph,
    mode: ValidationMode,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects how malformed symbol forests are handled.
    pub fn with_validation(mode: ValidationMode) -> Self {
        Self {
            graph: CallGraph::new(),
            mode,
        }
    }

    /// Registers a file and its symbol forest.
    ///
    /// Re-adding a path that is already present is rejected with
    /// `DuplicateFile` and leaves the graph untouched; each file is added
    /// at most once per graph.
    pub fn add_file(&mut self, path: &str, symbols: Vec<Symbol>) -> Result<FileId> {
        let path = normalize_path(path);
        if self.graph.contains_file(&path) {
            return Err(CoreError::DuplicateFile(path));
        }

        let id = FileId::new(self.graph.file_count());
        let entry = FileEntry::build(id, path, symbols, self.mode)?;
        Ok(self.graph.register_file(entry))
    }

    /// Identity of the symbol anchored at `selection_start`, if registered.
    pub fn symbol_id(&self, file: &str, selection_start: Position) -> Option<SymbolId> {
        let path = normalize_path(file);
        let entry = self.graph.file(self.graph.file_id(&path)?);
        entry.slot_at(selection_start).map(|slot| entry.symbol_id(slot))
    }

    /// Reports one call from a registered symbol.
    ///
    /// The target may land anywhere: a symbol in a tracked file, outside
    /// every symbol of a tracked file, or in a file never added. A repeated
    /// (caller, callee) pair merges into the existing edge, growing its
    /// call-site set.
    pub fn add_call(
        &mut self,
        from: SymbolId,
        site: Range,
        target_file: &str,
        target_position: Position,
    ) -> Result<()> {
        let from = self.known_symbol(from)?;
        let to = resolver::resolve_target(&self.graph, target_file, target_position);
        self.graph.merge_call(from, to, std::iter::once(site));
        Ok(())
    }

    /// Reports that the interface `from` is implemented at the target.
    /// Duplicate reports collapse into one edge.
    pub fn add_implementation(
        &mut self,
        from: SymbolId,
        target_file: &str,
        target_position: Position,
    ) -> Result<()> {
        let from = self.known_symbol(from)?;
        let to = resolver::resolve_target(&self.graph, target_file, target_position);
        self.graph.add_implements(from, to);
        Ok(())
    }

    /// Reports a batch of outgoing calls for whatever encloses `position`
    /// in a registered file (a symbol or the file root).
    pub fn add_outgoing_calls(
        &mut self,
        file: &str,
        position: Position,
        calls: &[OutgoingCall],
    ) -> Result<()> {
        let from = resolver::resolve_source(&self.graph, file, position)?;
        for call in calls {
            let to =
                resolver::resolve_target(&self.graph, &call.target_file, call.target_position);
            self.graph
                .merge_call(from.clone(), to, call.site_ranges.iter().copied());
        }
        Ok(())
    }

    /// Reports implementation locations for the interface enclosing
    /// `position` in a registered file.
    pub fn add_implementations(
        &mut self,
        file: &str,
        position: Position,
        locations: &[Location],
    ) -> Result<()> {
        let from = resolver::resolve_source(&self.graph, file, position)?;
        for location in locations {
            let to = resolver::resolve_target(&self.graph, &location.file, location.position);
            self.graph.add_implements(from.clone(), to);
        }
        Ok(())
    }

    /// Read access to the graph under construction.
    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }

    /// Finishes building and returns the graph.
    pub fn build(self) -> CallGraph {
        self.graph
    }

    fn known_symbol(&self, id: SymbolId) -> Result<NodeRef> {
        let node = NodeRef::Symbol(id);
        if !self.graph.has_node(&node) {
            let file = if id.file.index() < self.graph.file_count() {
                self.graph.file(id.file).path().to_owned()
            } else {
                "<unregistered>".to_owned()
            };
            return Err(CoreError::UnknownSymbol {
                file,
                anchor: id.anchor.to_string(),
            });
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RelationData, RelationKind};
    use callmap_core::SymbolKind;

    fn func(name: &str, line: u32) -> Symbol {
        Symbol::new(
            name,
            SymbolKind::Function,
            Range::of(line, 0, line + 3, 0),
            Range::of(line, 3, line, 3 + name.len() as u32),
        )
    }

    fn two_file_builder() -> GraphBuilder {
        let mut builder = GraphBuilder::new();
        builder
            .add_file("src/a.rs", vec![func("alpha", 0), func("beta", 5)])
            .unwrap();
        builder
            .add_file("src/b.rs", vec![func("gamma", 0)])
            .unwrap();
        builder
    }

    #[test]
    fn test_duplicate_file_rejected() {
        let mut builder = two_file_builder();
        let err = builder.add_file("src/a.rs", vec![]).unwrap_err();
        assert_eq!(err, CoreError::DuplicateFile("src/a.rs".into()));
        assert_eq!(builder.graph().file_count(), 2);
    }

    #[test]
    fn test_cross_file_call_resolves_to_symbol() {
        let mut builder = two_file_builder();
        let alpha = builder.symbol_id("src/a.rs", Position::new(0, 3)).unwrap();

        // lands inside gamma's body in the other file
        builder
            .add_call(alpha, Range::of(1, 4, 1, 9), "src/b.rs", Position::new(1, 0))
            .unwrap();

        let gamma = builder.symbol_id("src/b.rs", Position::new(0, 3)).unwrap();
        let callees = builder.graph().callees_of(&NodeRef::Symbol(alpha));
        assert_eq!(callees, vec![&NodeRef::Symbol(gamma)]);
    }

    #[test]
    fn test_repeated_calls_merge_into_one_edge() {
        let mut builder = two_file_builder();
        let alpha = builder.symbol_id("src/a.rs", Position::new(0, 3)).unwrap();

        builder
            .add_call(alpha, Range::of(1, 4, 1, 9), "src/b.rs", Position::new(1, 0))
            .unwrap();
        builder
            .add_call(alpha, Range::of(2, 4, 2, 9), "src/b.rs", Position::new(2, 0))
            .unwrap();
        // exact duplicate site must not grow the set
        builder
            .add_call(alpha, Range::of(2, 4, 2, 9), "src/b.rs", Position::new(2, 0))
            .unwrap();

        let edges: Vec<_> = builder
            .graph()
            .relations()
            .filter(|(_, _, data)| data.kind() == RelationKind::Call)
            .collect();
        assert_eq!(edges.len(), 1);
        match edges[0].2 {
            RelationData::Call { sites } => assert_eq!(sites.len(), 2),
            RelationData::Implements => panic!("expected a call edge"),
        }
    }

    #[test]
    fn test_untracked_targets_collapse_per_file() {
        let mut builder = two_file_builder();
        let alpha = builder.symbol_id("src/a.rs", Position::new(0, 3)).unwrap();
        let beta = builder.symbol_id("src/a.rs", Position::new(5, 3)).unwrap();

        // two distinct positions in the same never-added file
        builder
            .add_call(alpha, Range::of(1, 0, 1, 5), "vendor/lib.rs", Position::new(10, 0))
            .unwrap();
        builder
            .add_call(alpha, Range::of(2, 0, 2, 5), "vendor/lib.rs", Position::new(90, 0))
            .unwrap();
        builder
            .add_call(beta, Range::of(6, 0, 6, 5), "vendor/lib.rs", Position::new(50, 0))
            .unwrap();

        let graph = builder.graph();
        assert_eq!(graph.external_paths(), vec!["vendor/lib.rs"]);

        let external = NodeRef::External("vendor/lib.rs".into());
        let callers = graph.callers_of(&external);
        assert_eq!(callers.len(), 2, "one merged edge per distinct caller");
        assert_eq!(graph.stats().call_edges, 2);
    }

    #[test]
    fn test_target_outside_symbols_is_file_root() {
        let mut builder = two_file_builder();
        let alpha = builder.symbol_id("src/a.rs", Position::new(0, 3)).unwrap();

        builder
            .add_call(alpha, Range::of(1, 0, 1, 5), "src/b.rs", Position::new(40, 0))
            .unwrap();

        let b = builder.graph().file_id("src/b.rs").unwrap();
        assert!(builder.graph().file_root_realized(b));
        assert!(!builder.graph().file_root_realized(
            builder.graph().file_id("src/a.rs").unwrap()
        ));
    }

    #[test]
    fn test_call_and_implements_stay_distinct() {
        let mut builder = GraphBuilder::new();
        let iface = Symbol::new(
            "Store",
            SymbolKind::Interface,
            Range::of(0, 0, 3, 0),
            Range::of(0, 6, 0, 11),
        );
        builder.add_file("src/store.rs", vec![iface]).unwrap();
        builder
            .add_file("src/disk.rs", vec![func("open", 0)])
            .unwrap();

        let store = builder.symbol_id("src/store.rs", Position::new(0, 6)).unwrap();
        builder
            .add_implementation(store, "src/disk.rs", Position::new(0, 3))
            .unwrap();
        builder
            .add_implementation(store, "src/disk.rs", Position::new(0, 3))
            .unwrap();
        builder
            .add_call(store, Range::of(1, 0, 1, 4), "src/disk.rs", Position::new(0, 3))
            .unwrap();

        let graph = builder.graph();
        assert_eq!(graph.stats().implements_edges, 1, "duplicates collapse");
        assert_eq!(graph.stats().call_edges, 1);
    }

    #[test]
    fn test_outgoing_calls_from_file_root() {
        let mut builder = two_file_builder();

        // a position in a.rs outside both functions: top-level code
        let calls = vec![OutgoingCall {
            target_file: "src/b.rs".into(),
            target_position: Position::new(1, 0),
            site_ranges: vec![Range::of(30, 0, 30, 8)],
        }];
        builder
            .add_outgoing_calls("src/a.rs", Position::new(30, 0), &calls)
            .unwrap();

        let a = builder.graph().file_id("src/a.rs").unwrap();
        assert!(builder.graph().file_root_realized(a));
    }

    #[test]
    fn test_outgoing_calls_for_unregistered_file_rejected() {
        let mut builder = two_file_builder();
        let err = builder
            .add_outgoing_calls("src/ghost.rs", Position::new(0, 0), &[])
            .unwrap_err();
        assert_eq!(err, CoreError::UnknownFile("src/ghost.rs".into()));
    }

    #[test]
    fn test_self_call_is_kept() {
        let mut builder = two_file_builder();
        let alpha = builder.symbol_id("src/a.rs", Position::new(0, 3)).unwrap();

        builder
            .add_call(alpha, Range::of(2, 4, 2, 9), "src/a.rs", Position::new(1, 0))
            .unwrap();

        assert_eq!(
            builder.graph().callees_of(&NodeRef::Symbol(alpha)),
            vec![&NodeRef::Symbol(alpha)]
        );
    }
}
