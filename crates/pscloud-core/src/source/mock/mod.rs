//! In-memory source adapter for tests and dry runs.
//!
//! Serves canned documents or errors per [`SourceKind`] and records every call.
//! Pre-built account states live in [`scenarios`].

mod scenarios;

pub use scenarios::typical_document;

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;

use super::{SourceAdapter, SourceError, SourceKind, SourceResult};

/// Canned-response adapter.
///
/// Sources without a configured response answer [`SourceError::Unsupported`].
#[derive(Default)]
pub struct MockSource {
    responses: HashMap<SourceKind, SourceResult>,
    delays: HashMap<SourceKind, Duration>,
    calls: Mutex<Vec<SourceKind>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `document` for `kind`.
    pub fn with_document(mut self, kind: SourceKind, document: Value) -> Self {
        self.responses.insert(kind, Ok(document));
        self
    }

    /// Fails `kind` with `error`.
    pub fn with_failure(mut self, kind: SourceKind, error: SourceError) -> Self {
        self.responses.insert(kind, Err(error));
        self
    }

    /// Sleeps before answering `kind`. A delay longer than the deadline yields a
    /// transport error, like the HTTP adapter.
    pub fn with_delay(mut self, kind: SourceKind, delay: Duration) -> Self {
        self.delays.insert(kind, delay);
        self
    }

    /// Sources fetched so far, in call order.
    pub fn calls(&self) -> Vec<SourceKind> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Highest number of fetches observed running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl SourceAdapter for MockSource {
    fn fetch(&self, kind: SourceKind, deadline: Duration) -> SourceResult {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(kind);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = match self.delays.get(&kind) {
            Some(delay) if *delay > deadline => {
                std::thread::sleep(deadline);
                Err(SourceError::Transport(format!(
                    "deadline of {deadline:?} exceeded"
                )))
            }
            Some(delay) => {
                std::thread::sleep(*delay);
                self.respond(kind)
            }
            None => self.respond(kind),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl MockSource {
    fn respond(&self, kind: SourceKind) -> SourceResult {
        self.responses
            .get(&kind)
            .cloned()
            .unwrap_or(Err(SourceError::Unsupported))
    }
}
