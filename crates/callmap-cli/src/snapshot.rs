//! Snapshot input format.
//!
//! A snapshot is the decoded output of a symbol provider, recorded as JSON:
//! per-file symbol forests plus the call-hierarchy and implementation
//! answers for each queried position. `JsonProvider` replays it through
//! the `SymbolProvider` interface, so the engine cannot tell it apart from
//! a live host.

use callmap_core::{
    normalize_path, Location, OutgoingCall, Position, ProviderError, Symbol, SymbolProvider,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// The on-disk snapshot schema.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: String,
    pub files: Vec<FileSymbols>,
    #[serde(default)]
    pub calls: Vec<CallRecord>,
    #[serde(default)]
    pub implementations: Vec<ImplementationRecord>,
}

fn default_version() -> String {
    "1.0".to_owned()
}

/// One file's symbol forest.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileSymbols {
    pub path: String,
    pub symbols: Vec<Symbol>,
}

/// Recorded outgoing-calls answer for one (file, position) query.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallRecord {
    pub file: String,
    pub position: Position,
    pub outgoing: Vec<OutgoingCall>,
}

/// Recorded implementations answer for one (file, position) query.
#[derive(Debug, Serialize, Deserialize)]
pub struct ImplementationRecord {
    pub file: String,
    pub position: Position,
    pub locations: Vec<Location>,
}

/// Replays a snapshot through the provider interface.
pub struct JsonProvider {
    symbols: HashMap<String, Vec<Symbol>>,
    calls: HashMap<(String, Position), Vec<OutgoingCall>>,
    implementations: HashMap<(String, Position), Vec<Location>>,
}

impl JsonProvider {
    /// Loads a snapshot file. Returns the provider and the file list in
    /// snapshot order, which becomes the registration (and so cluster)
    /// order.
    pub fn load(path: &Path) -> Result<(Self, Vec<String>), Box<dyn std::error::Error>> {
        let text = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&text)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Builds a provider from a decoded snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> (Self, Vec<String>) {
        let order: Vec<String> = snapshot.files.iter().map(|f| f.path.clone()).collect();

        let symbols = snapshot
            .files
            .into_iter()
            .map(|f| (normalize_path(&f.path), f.symbols))
            .collect();
        let calls = snapshot
            .calls
            .into_iter()
            .map(|c| ((normalize_path(&c.file), c.position), c.outgoing))
            .collect();
        let implementations = snapshot
            .implementations
            .into_iter()
            .map(|i| ((normalize_path(&i.file), i.position), i.locations))
            .collect();

        (
            Self {
                symbols,
                calls,
                implementations,
            },
            order,
        )
    }
}

impl SymbolProvider for JsonProvider {
    fn document_symbols(&self, file: &str) -> Result<Option<Vec<Symbol>>, ProviderError> {
        Ok(self.symbols.get(&normalize_path(file)).cloned())
    }

    fn outgoing_calls(
        &self,
        file: &str,
        position: Position,
    ) -> Result<Vec<OutgoingCall>, ProviderError> {
        Ok(self
            .calls
            .get(&(normalize_path(file), position))
            .cloned()
            .unwrap_or_default())
    }

    fn implementations(
        &self,
        file: &str,
        position: Position,
    ) -> Result<Vec<Location>, ProviderError> {
        Ok(self
            .implementations
            .get(&(normalize_path(file), position))
            .cloned()
            .unwrap_or_default())
    }
}
