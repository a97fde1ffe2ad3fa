//! Optional progress reporting for long enumerations and searches.
//!
//! A sink only observes: generation and search produce identical results with or
//! without one. Closures `FnMut(u64)` are sinks that only see `advance`.

pub trait ProgressSink {
    /// A new phase begins; `total` is the number of steps expected.
    fn start(&mut self, _label: &str, _total: u64) {}
    fn advance(&mut self, delta: u64);
    fn finish(&mut self) {}
}

/// Sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn advance(&mut self, _delta: u64) {}
}

impl<F: FnMut(u64)> ProgressSink for F {
    fn advance(&mut self, delta: u64) {
        self(delta)
    }
}
