//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `reqwest` types in any signature.
//! - Traits are minimal and intent-based, not implementation-leaking.

mod event_emitter;
mod hub_client;

pub use event_emitter::{NoopEventEmitter, ProgressEmitter};
pub use hub_client::{HttpBackend, HttpResponse, HubClientPort, TreeVisitor};
