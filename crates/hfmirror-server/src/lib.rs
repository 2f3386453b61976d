//! Axum HTTP/WebSocket adapter: wraps [`hfmirror_engine::JobManager`] with a
//! REST surface and a WebSocket fan-out for job status (§6).

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;
#[cfg(test)]
use tower as _;

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod ws;

pub use bootstrap::{bootstrap, start_server, AppContext, CorsConfig, ServerConfig};
pub use error::HttpError;
pub use routes::create_router;
pub use state::AppState;
