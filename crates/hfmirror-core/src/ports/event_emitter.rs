//! Progress-bus sink port (§4.9, §9 "Progress fan-out").
//!
//! The engine delivers every [`ProgressEvent`] to a single callback; fan-out
//! to multiple consumers (terminal, WebSocket, JSON-lines) is the
//! implementation's responsibility. A slow consumer must drop events rather
//! than block the engine.

use crate::job::ProgressEvent;

/// Sink for engine progress events.
///
/// Implementations are called from many workers concurrently and must
/// tolerate reentrant calls; `emit` must not block for long, since the
/// engine applies no back-pressure.
pub trait ProgressEmitter: Send + Sync {
    /// Deliver one progress event.
    fn emit(&self, event: ProgressEvent);
}

/// An emitter that discards every event, for callers that do not need
/// progress reporting (tests, dry-run tooling).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventEmitter;

impl ProgressEmitter for NoopEventEmitter {
    fn emit(&self, _event: ProgressEvent) {}
}
