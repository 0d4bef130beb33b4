//! Diagnostic trace sinks
//!
//! An [`Observer`] receives one human-readable line per encode/decode step.
//! It is write-only: nothing it does can change what the codec returns.

use tracing::debug;

/// Sink for codec trace lines
pub trait Observer: Send + Sync {
    fn trace(&self, line: &str);
}

/// Forwards trace lines to `tracing` at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn trace(&self, line: &str) {
        debug!(target: "v96_remote::trace", "{}", line);
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn trace(&self, _line: &str) {}
}

impl<F> Observer for F
where
    F: Fn(&str) + Send + Sync,
{
    fn trace(&self, line: &str) {
        self(line)
    }
}
