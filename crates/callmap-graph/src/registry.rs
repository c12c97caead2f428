//! File registration and symbol identity.
//!
//! Each registered file flattens its symbol forest into a pre-order arena.
//! The arena preserves structural order for serialization, keeps
//! parent/child links as plain indices (ownership flows strictly from file
//! to symbols, so no owned back-references), and doubles as the backing
//! store for the position index.

use callmap_core::{CoreError, Position, Range, Result, Symbol, SymbolKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::index::{self, Enclosing};

/// Identifier of a registered file, assigned in registration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FileId(u32);

impl FileId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Index into the graph's file list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable identity of a registered symbol.
///
/// The anchor is the start of the symbol's selection range, which is unique
/// within a file (name tokens cannot overlap). Registering identical file
/// content yields identical identities, in this graph or the next.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SymbolId {
    pub file: FileId,
    pub anchor: Position,
}

/// A symbol in a file's arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolData {
    pub name: String,
    pub kind: SymbolKind,
    /// Full extent, used for containment queries.
    pub range: Range,
    /// The name token; its start is the symbol's anchor.
    pub selection: Range,
    /// Arena slot of the parent, if any. Non-owning.
    pub parent: Option<usize>,
    /// Arena slots of the children, ascending by range start.
    pub children: Vec<usize>,
}

/// How malformed symbol forests are handled at registration.
///
/// Overlapping siblings are rejected in both modes - repairing an overlap
/// would have to guess at containment semantics the input does not define.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Reject any invariant violation with a descriptive error.
    #[default]
    Strict,
    /// Re-sort out-of-order siblings and clip child/selection ranges into
    /// their enclosing range.
    Clip,
}

/// A registered file: its path, its symbol arena in pre-order, and the
/// top-level slots. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    id: FileId,
    path: String,
    symbols: Vec<SymbolData>,
    roots: Vec<usize>,
    #[serde(skip)]
    anchors: HashMap<Position, usize>,
}

impl FileEntry {
    /// Validates `roots` and flattens it into an arena.
    ///
    /// On error the partially built entry is dropped, so the caller's graph
    /// is untouched. `path` must already be normalized.
    pub(crate) fn build(
        id: FileId,
        path: String,
        roots: Vec<Symbol>,
        mode: ValidationMode,
    ) -> Result<Self> {
        let mut entry = FileEntry {
            id,
            path,
            symbols: Vec::new(),
            roots: Vec::new(),
            anchors: HashMap::new(),
        };
        entry.roots = entry.ingest_level(roots, None, mode)?;
        Ok(entry)
    }

    fn ingest_level(
        &mut self,
        mut level: Vec<Symbol>,
        parent: Option<usize>,
        mode: ValidationMode,
    ) -> Result<Vec<usize>> {
        if matches!(mode, ValidationMode::Clip) {
            level.sort_by_key(|s| s.range.start);
        }

        for pair in level.windows(2) {
            if pair[1].range.start < pair[0].range.start {
                return Err(CoreError::UnorderedSiblings {
                    file: self.path.clone(),
                    symbol: pair[1].name.clone(),
                });
            }
            if pair[0].range.overlaps(&pair[1].range) {
                return Err(CoreError::OverlappingSiblings {
                    file: self.path.clone(),
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }

        let mut slots = Vec::with_capacity(level.len());
        for symbol in level {
            slots.push(self.ingest_symbol(symbol, parent, mode)?);
        }
        Ok(slots)
    }

    fn ingest_symbol(
        &mut self,
        symbol: Symbol,
        parent: Option<usize>,
        mode: ValidationMode,
    ) -> Result<usize> {
        let Symbol {
            name,
            kind,
            mut range,
            mut selection_range,
            children,
        } = symbol;

        if let Some(parent_slot) = parent {
            let parent_range = self.symbols[parent_slot].range;
            if !parent_range.contains_range(&range) {
                match mode {
                    ValidationMode::Strict => {
                        return Err(CoreError::ChildOutsideParent {
                            file: self.path.clone(),
                            parent: self.symbols[parent_slot].name.clone(),
                            child: name,
                        });
                    }
                    ValidationMode::Clip => range = clip_into(range, parent_range),
                }
            }
        }

        if !range.contains_range(&selection_range) {
            match mode {
                ValidationMode::Strict => {
                    return Err(CoreError::SelectionOutsideRange {
                        file: self.path.clone(),
                        symbol: name,
                    });
                }
                ValidationMode::Clip => selection_range = clip_into(selection_range, range),
            }
        }

        let slot = self.symbols.len();
        self.symbols.push(SymbolData {
            name,
            kind,
            range,
            selection: selection_range,
            parent,
            children: Vec::new(),
        });
        self.anchors.insert(selection_range.start, slot);

        let child_slots = self.ingest_level(children, Some(slot), mode)?;
        self.symbols[slot].children = child_slots;

        Ok(slot)
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    /// The normalized file path; also the cluster label.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Arena slots of the top-level symbols, ascending by range start.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn symbol(&self, slot: usize) -> &SymbolData {
        &self.symbols[slot]
    }

    /// Symbols in pre-order, the order rows are serialized in.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &SymbolData)> {
        self.symbols.iter().enumerate()
    }

    /// Identity of the symbol in `slot`.
    pub fn symbol_id(&self, slot: usize) -> SymbolId {
        SymbolId {
            file: self.id,
            anchor: self.symbols[slot].selection.start,
        }
    }

    /// Looks up a symbol by its selection anchor.
    pub fn slot_at(&self, anchor: Position) -> Option<usize> {
        self.anchors.get(&anchor).copied()
    }

    /// Deepest symbol enclosing `position`, or the file root.
    pub fn locate(&self, position: Position) -> Enclosing {
        index::locate(self, position)
    }
}

fn clip_into(range: Range, bounds: Range) -> Range {
    Range::new(
        range.start.max(bounds.start).min(bounds.end),
        range.end.min(bounds.end).max(bounds.start),
    )
}
