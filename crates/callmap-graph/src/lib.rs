//! Callmap Graph - The graph construction engine
//!
//! This crate turns per-file symbol trees and call/implementation reports
//! into a deterministic, clustered graph description.
//!
//! # Architecture
//!
//! ```text
//! Symbol forests (per file)
//!     │
//!     ├──> File Registry
//!     │      ├─ Validate forest invariants
//!     │      ├─ Assign stable symbol identities (pre-order)
//!     │      └─ Build the per-file position index
//!     │
//! Call / implementation reports
//!     │
//!     ├──> Relationship Resolver
//!     │      ├─ Position → enclosing symbol (possibly cross-file)
//!     │      ├─ File root / external placeholders (lazy, deduped)
//!     │      └─ Idempotent edge merge
//!     │
//!     ├──> Call Graph (petgraph)
//!     │      ├─ Nodes: symbols, file roots, external files
//!     │      └─ Edges: calls (with site ranges), implementations
//!     │
//!     └──> DOT serializer
//!            └─ One cluster per file, table rows as ports, sorted edges
//! ```
//!
//! The engine is synchronous and single-threaded by contract; concurrency
//! and retries belong to whatever collaborator feeds it.

mod builder;
mod dot;
mod generator;
mod index;
mod model;
mod registry;
mod resolver;

pub use builder::GraphBuilder;
pub use dot::to_dot;
pub use generator::Generator;
pub use index::Enclosing;
pub use model::{CallGraph, GraphStats, NodeRef, RelationData, RelationKind};
pub use registry::{FileEntry, FileId, SymbolData, SymbolId, ValidationMode};
