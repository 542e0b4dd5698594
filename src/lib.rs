//! Request-handling core of an HTTP application server.
//!
//! A request is buffered, routed, bound to a pooled [`Context`], passed
//! through the admission gates and then through an onion-ordered chain of
//! middlewares ending in a handler. Responses are negotiated as JSON, XML or
//! plain text.

pub mod admission;
pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod render;
pub mod routing;

pub use chain::{handler_fn, Handler, Middleware};
pub use config::AppConfig;
pub use context::Context;
pub use error::{Error, Result};
pub use http::AppServer;
pub use lifecycle::Shutdown;
