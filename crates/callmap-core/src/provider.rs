//! The symbol provider boundary.
//!
//! The engine never talks to a language server. It consumes already-decoded
//! data through `SymbolProvider`, a fixed-shape supplier interface, so the
//! same engine runs against a live editor host, a recorded snapshot, or a
//! test stub. Retry-while-initializing lives here too: it is a collaborator
//! concern, bounded and synchronous, and the engine itself never waits.

use crate::types::{Position, Range, Symbol};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// One outgoing call reported for a symbol.
///
/// `site_ranges` are the positions of the call expressions inside the
/// calling symbol's body; the target is identified by file and position
/// only, and it is the engine's job to resolve that position to a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingCall {
    pub target_file: String,
    pub target_position: Position,
    #[serde(default)]
    pub site_ranges: Vec<Range>,
}

/// A (file, position) pair, as returned by implementation queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub position: Position,
}

/// Errors a provider query can report.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The data source exists but has not finished initializing.
    /// Queries may be retried after a delay.
    #[error("provider not ready")]
    NotReady,

    /// The query failed for good; retrying will not help.
    #[error("provider query failed: {0}")]
    Query(String),
}

/// The data-supplier interface the engine is driven from.
///
/// All three queries are synchronous; hosts that collect data concurrently
/// deliver results through this interface one call at a time.
pub trait SymbolProvider {
    /// The symbol forest of a file, in source order.
    ///
    /// `Ok(None)` means the provider has no symbol information for this
    /// file; the caller skips the file rather than registering it.
    fn document_symbols(&self, file: &str) -> Result<Option<Vec<Symbol>>, ProviderError>;

    /// Outgoing calls for the symbol anchored at `position` in `file`.
    fn outgoing_calls(
        &self,
        file: &str,
        position: Position,
    ) -> Result<Vec<OutgoingCall>, ProviderError>;

    /// Implementations of the interface anchored at `position` in `file`.
    fn implementations(
        &self,
        file: &str,
        position: Position,
    ) -> Result<Vec<Location>, ProviderError>;
}

/// Bounded retry with a fixed delay between attempts.
///
/// Exhaustion means "data unavailable for this query" - callers are expected
/// to skip and continue with partial data, not abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(600),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with an attempt count and inter-attempt delay.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Runs `query`, retrying while it reports `NotReady`.
    ///
    /// Other errors pass through immediately. With `attempts == 0` the
    /// query is never run and `NotReady` is returned.
    pub fn run<T>(
        &self,
        mut query: impl FnMut() -> Result<T, ProviderError>,
    ) -> Result<T, ProviderError> {
        for attempt in 1..=self.attempts {
            match query() {
                Ok(value) => return Ok(value),
                Err(ProviderError::NotReady) => {
                    tracing::debug!("provider not ready, attempt {}/{}", attempt, self.attempts);
                    if attempt < self.attempts {
                        std::thread::sleep(self.delay);
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Err(ProviderError::NotReady)
    }
}
