//! The symbol data model.
//!
//! These types mirror the shape of document symbols as language servers
//! report them: every symbol has a full `range` used for containment queries
//! and a `selection_range` covering just the name token. The selection range
//! is the symbol's stable anchor - together with the owning file path it
//! forms the symbol's identity in the graph.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A zero-based (line, column) location in a file.
///
/// Ordering is by line, then column, which makes ranges comparable and
/// lets sibling lists be binary-searched.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// Creates a position.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A closed interval of positions, `start <= end`.
///
/// Containment is inclusive on both ends: a position exactly on a boundary
/// belongs to the range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Creates a range from start and end positions.
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Convenience constructor from raw line/column pairs.
    pub fn of(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self::new(
            Position::new(start_line, start_col),
            Position::new(end_line, end_col),
        )
    }

    /// Whether `pos` lies inside the closed interval `[start, end]`.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Whether `other` is fully contained in this range.
    pub fn contains_range(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two ranges share at least one position.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// The kind of a symbol.
///
/// `Container` stands for classes, modules, namespaces and any other
/// structural symbol that is not itself a call-hierarchy target but still
/// appears as a row in the rendered file table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Constructor,
    Interface,
    Container,
}

impl SymbolKind {
    /// Whether symbols of this kind participate in call-hierarchy queries.
    pub fn is_callable(&self) -> bool {
        !matches!(self, SymbolKind::Container)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Interface => "interface",
            SymbolKind::Container => "container",
        };
        write!(f, "{}", s)
    }
}

/// A named, range-bounded code element from one file's symbol tree.
///
/// Children are in source order. A well-formed symbol satisfies:
/// - every child's range is contained in this symbol's range,
/// - sibling ranges are sorted ascending by start and do not overlap,
/// - the selection range lies inside the full range.
///
/// These invariants are validated when the file is registered, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub range: Range,
    pub selection_range: Range,
    #[serde(default)]
    pub children: Vec<Symbol>,
}

impl Symbol {
    /// Creates a leaf symbol.
    pub fn new(name: impl Into<String>, kind: SymbolKind, range: Range, selection: Range) -> Self {
        Self {
            name: name.into(),
            kind,
            range,
            selection_range: selection,
            children: Vec::new(),
        }
    }

    /// Attaches children, consuming self.
    pub fn with_children(mut self, children: Vec<Symbol>) -> Self {
        self.children = children;
        self
    }
}
