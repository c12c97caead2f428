//! Position index: "which symbol contains point P".
//!
//! Works directly on a file's arena. At every level the sibling slots are
//! sorted by range start and disjoint (validated at registration), so one
//! binary search per level finds the only candidate, and descent repeats
//! until no deeper child matches. Cost is O(depth * log branching) per
//! query, which matters because every call-site and implementation report
//! costs one lookup and real codebases report thousands.

use callmap_core::Position;

use crate::registry::FileEntry;

/// Result of an enclosing-symbol lookup in a tracked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enclosing {
    /// Arena slot of the deepest symbol containing the position.
    Symbol(usize),
    /// The position is in the file but outside every symbol.
    Root,
}

/// Finds the deepest symbol in `entry` whose range contains `position`.
pub(crate) fn locate(entry: &FileEntry, position: Position) -> Enclosing {
    let mut found = None;
    let mut level = entry.roots();

    while let Some(slot) = containing_sibling(entry, level, position) {
        found = Some(slot);
        level = entry.symbol(slot).children.as_slice();
    }

    match found {
        Some(slot) => Enclosing::Symbol(slot),
        None => Enclosing::Root,
    }
}

/// Binary-searches one level of disjoint, sorted sibling ranges.
fn containing_sibling(entry: &FileEntry, level: &[usize], position: Position) -> Option<usize> {
    // last sibling starting at or before the position is the only one that
    // can contain it
    let upper = level.partition_point(|&slot| entry.symbol(slot).range.start <= position);
    let candidate = *level.get(upper.checked_sub(1)?)?;

    entry
        .symbol(candidate)
        .range
        .contains(position)
        .then_some(candidate)
}
