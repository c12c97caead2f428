//! Error taxonomy for the engine.
//!
//! Precondition violations surface as descriptive variants so the caller can
//! decide whether to abort the run or skip the offending file; the engine
//! never repairs input silently in strict mode and never leaves the graph
//! half-mutated on error.

use thiserror::Error;

/// Errors reported by the graph engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A path was added twice within one graph generation.
    #[error("file already registered: {0}")]
    DuplicateFile(String),

    /// An operation referenced a path that was never registered.
    #[error("file not registered: {0}")]
    UnknownFile(String),

    /// An operation referenced a symbol anchor that does not exist.
    #[error("no symbol anchored at {anchor} in {file}")]
    UnknownSymbol { file: String, anchor: String },

    /// Sibling symbols were not in ascending source order.
    #[error("siblings out of source order at `{symbol}` in {file}")]
    UnorderedSiblings { file: String, symbol: String },

    /// Two sibling symbols share positions, violating disjointness.
    #[error("symbol `{first}` overlaps sibling `{second}` in {file}")]
    OverlappingSiblings {
        file: String,
        first: String,
        second: String,
    },

    /// A child symbol's range extends outside its parent.
    #[error("symbol `{child}` extends outside its parent `{parent}` in {file}")]
    ChildOutsideParent {
        file: String,
        parent: String,
        child: String,
    },

    /// A symbol's selection range lies outside its own full range.
    #[error("selection range of `{symbol}` lies outside its range in {file}")]
    SelectionOutsideRange { file: String, symbol: String },
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, CoreError>;
