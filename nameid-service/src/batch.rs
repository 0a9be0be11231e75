//! Accumulation of alias requests for batched backend dispatch.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::alias::AliasRequest;

/// Accumulates the alias requests produced while transforming one ingress
/// request. Sized up front for `batch_size` entities times the plan's spec
/// count; doubles when a request overruns it.
#[derive(Debug)]
pub struct Batch {
    capacity: usize,
    requests: Vec<AliasRequest>,
}

impl Batch {
    pub fn new(spec_count: usize, batch_size: usize) -> Self {
        let capacity = batch_size.max(1) * spec_count.max(1);
        Self {
            capacity,
            requests: Vec::with_capacity(capacity),
        }
    }

    /// Append one alias request, growing the reserved space when full.
    pub fn push(&mut self, request: AliasRequest) {
        if self.requests.len() == self.capacity {
            self.capacity *= 2;
            self.requests.reserve(self.capacity - self.requests.len());
        }
        self.requests.push(request);
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn requests(&self) -> &[AliasRequest] {
        &self.requests
    }
}

/// Process-wide advisory batch size.
///
/// Grows monotonically when a request carries more items than the current
/// size; concurrent growth races are benign since `fetch_max` keeps the
/// largest observation.
#[derive(Debug)]
pub struct BatchSize(AtomicUsize);

impl BatchSize {
    pub fn new(initial: usize) -> Self {
        Self(AtomicUsize::new(initial))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    /// Record an observed batch length. Returns `Some((old, new))` when the
    /// observation grew the size, for the caller to log.
    pub fn observe(&self, seen: usize) -> Option<(usize, usize)> {
        let old = self.0.fetch_max(seen, Ordering::Relaxed);
        (seen > old).then_some((old, seen))
    }
}
