//! Fetch phase of a scrape cycle: sequential, or on a bounded pool of scoped
//! worker threads. Results always come back in the order of `kinds`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::source::{SourceAdapter, SourceError, SourceKind, SourceResult};

/// One adapter call and how long it took.
pub(super) struct Fetched {
    pub kind: SourceKind,
    pub result: SourceResult,
    pub elapsed: Duration,
}

fn fetch_one<S: SourceAdapter>(source: &S, kind: SourceKind, deadline: Duration) -> Fetched {
    let start = Instant::now();
    let result = source.fetch(kind, deadline);
    let elapsed = start.elapsed();
    debug!(source = %kind, elapsed_ms = elapsed.as_millis() as u64, ok = result.is_ok(), "fetched");
    Fetched {
        kind,
        result,
        elapsed,
    }
}

pub(super) fn fetch_all<S: SourceAdapter>(
    source: &S,
    kinds: &[SourceKind],
    deadline: Duration,
    max_parallel: usize,
) -> Vec<Fetched> {
    let workers = max_parallel.min(kinds.len());
    if workers <= 1 {
        return kinds
            .iter()
            .map(|&kind| fetch_one(source, kind, deadline))
            .collect();
    }

    let next = AtomicUsize::new(0);
    let slots: Vec<Mutex<Option<Fetched>>> = kinds.iter().map(|_| Mutex::new(None)).collect();

    std::thread::scope(|scope| {
        let (next, slots) = (&next, &slots);
        let handles: Vec<_> = (0..workers)
            .map(move |_| {
                scope.spawn(move || {
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(&kind) = kinds.get(i) else {
                            break;
                        };
                        let fetched = fetch_one(source, kind, deadline);
                        if let Ok(mut slot) = slots[i].lock() {
                            *slot = Some(fetched);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            if handle.join().is_err() {
                error!("fetch worker panicked");
            }
        }
    });

    slots
        .into_iter()
        .zip(kinds)
        .map(|(slot, &kind)| {
            slot.into_inner().ok().flatten().unwrap_or(Fetched {
                kind,
                result: Err(SourceError::Transport("fetch worker panicked".to_string())),
                elapsed: Duration::ZERO,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSource;

    fn slow_account() -> MockSource {
        SourceKind::ALL
            .into_iter()
            .fold(MockSource::typical_account(), |mock, kind| {
                mock.with_delay(kind, Duration::from_millis(30))
            })
    }

    #[test]
    fn sequential_preserves_order() {
        let mock = MockSource::typical_account();
        let fetched = fetch_all(&mock, &SourceKind::ALL, Duration::from_secs(1), 1);
        let kinds: Vec<SourceKind> = fetched.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, SourceKind::ALL.to_vec());
        assert_eq!(mock.calls(), SourceKind::ALL.to_vec());
        assert_eq!(mock.max_concurrency(), 1);
    }

    #[test]
    fn parallel_is_bounded_and_keeps_order() {
        let mock = slow_account();
        let fetched = fetch_all(&mock, &SourceKind::ALL, Duration::from_secs(1), 4);

        let kinds: Vec<SourceKind> = fetched.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, SourceKind::ALL.to_vec());
        assert!(fetched.iter().all(|f| f.result.is_ok()));
        assert!(mock.max_concurrency() > 1);
        assert!(mock.max_concurrency() <= 4);
        assert_eq!(mock.calls().len(), SourceKind::ALL.len());
    }

    #[test]
    fn deadline_is_passed_to_every_call() {
        let mock = MockSource::typical_account()
            .with_delay(SourceKind::Invoices, Duration::from_secs(10));
        let fetched = fetch_all(&mock, &SourceKind::ALL, Duration::from_millis(20), 3);
        let invoices = fetched
            .iter()
            .find(|f| f.kind == SourceKind::Invoices)
            .unwrap();
        assert_eq!(invoices.result.as_ref().unwrap_err().kind(), "transport");
        assert!(invoices.elapsed < Duration::from_secs(5));
    }
}
