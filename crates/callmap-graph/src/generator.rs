//! Generation driver.
//!
//! Walks a `SymbolProvider` over a list of candidate files and feeds the
//! `GraphBuilder` in two passes: first every file's symbol forest is
//! registered, then every registered callable symbol is queried for its
//! outgoing calls (and interfaces for their implementations). Registering
//! everything before resolving anything is what lets targets in
//! later-listed files resolve to real symbols instead of placeholders.
//!
//! Unavailable data never aborts a run. A file whose symbols cannot be
//! fetched, or a query that exhausts its retries, is logged and skipped;
//! the engine produces a well-formed graph from whatever subset remains.

use callmap_core::{Position, RetryPolicy, Symbol, SymbolKind, SymbolProvider};

use crate::builder::GraphBuilder;
use crate::model::CallGraph;
use crate::registry::ValidationMode;

/// Drives one graph generation against a provider.
pub struct Generator<'a, P: SymbolProvider> {
    provider: &'a P,
    retry: RetryPolicy,
    mode: ValidationMode,
}

impl<'a, P: SymbolProvider> Generator<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            mode: ValidationMode::default(),
        }
    }

    /// Overrides the retry policy applied around every provider query.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Overrides how malformed symbol forests are handled.
    pub fn with_validation(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builds a graph over `files`, skipping whatever the provider cannot
    /// supply.
    pub fn generate(&self, files: &[String]) -> CallGraph {
        let mut builder = GraphBuilder::with_validation(self.mode);

        let mut registered: Vec<&str> = Vec::with_capacity(files.len());
        for path in files {
            if let Some(symbols) = self.fetch_symbols(path) {
                match builder.add_file(path, symbols) {
                    Ok(_) => registered.push(path),
                    Err(err) => tracing::warn!("skipping {path}: {err}"),
                }
            }
        }

        for path in registered {
            self.resolve_file(&mut builder, path);
        }

        builder.build()
    }

    fn fetch_symbols(&self, path: &str) -> Option<Vec<Symbol>> {
        match self.retry.run(|| self.provider.document_symbols(path)) {
            Ok(Some(symbols)) if !symbols.is_empty() => Some(symbols),
            Ok(_) => {
                tracing::warn!("no symbol information for {path}, skipping");
                None
            }
            Err(err) => {
                tracing::warn!("symbols unavailable for {path}: {err}, skipping");
                None
            }
        }
    }

    fn resolve_file(&self, builder: &mut GraphBuilder, path: &str) {
        let Some(file_id) = builder
            .graph()
            .file_id(&callmap_core::normalize_path(path))
        else {
            return;
        };

        let anchors: Vec<(Position, SymbolKind)> = builder
            .graph()
            .file(file_id)
            .iter()
            .filter(|(_, data)| data.kind.is_callable())
            .map(|(_, data)| (data.selection.start, data.kind))
            .collect();

        for (anchor, kind) in anchors {
            match self.retry.run(|| self.provider.outgoing_calls(path, anchor)) {
                Ok(calls) => {
                    if let Err(err) = builder.add_outgoing_calls(path, anchor, &calls) {
                        tracing::warn!("dropping calls from {path}:{anchor}: {err}");
                    }
                }
                Err(err) => {
                    tracing::warn!("outgoing calls unavailable for {path}:{anchor}: {err}")
                }
            }

            if kind == SymbolKind::Interface {
                match self.retry.run(|| self.provider.implementations(path, anchor)) {
                    Ok(locations) => {
                        if let Err(err) = builder.add_implementations(path, anchor, &locations) {
                            tracing::warn!(
                                "dropping implementations of {path}:{anchor}: {err}"
                            );
                        }
                    }
                    Err(err) => tracing::warn!(
                        "implementations unavailable for {path}:{anchor}: {err}"
                    ),
                }
            }
        }
    }
}
