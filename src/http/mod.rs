//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, request ID, tracing, timeout layers)
//!     → AppServer::dispatch
//!         → buffer body (413 over limit)
//!         → routing (404 on miss)
//!         → context pool acquire
//!         → admission gates (418 / 429 via response.rs)
//!         → chain run
//!     → ResponseWriter converted to an axum Response
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use server::AppServer;

/// Default request-ID header.
pub const X_REQUEST_ID: &str = "x-request-id";
