//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (before serving):
//!     AppServer / RouteGroup
//!     → group.rs (prefix + group middlewares prepended)
//!     → router.rs (RouteTable, ordered)
//!
//! Incoming Request (method, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (segment match, parameter extraction)
//!     → Return: chain + path params, or a miss
//! ```
//!
//! # Design Decisions
//! - Routes are registered up front and immutable while serving
//! - No regex in hot path
//! - First match wins (registration order)

pub mod group;
pub mod matcher;
pub mod router;

use axum::http::Method;

pub use group::RouteGroup;
pub use matcher::{decode_path, PathPattern};
pub use router::{RouteMatch, RouteTable};

/// Resolves a request to the chain that serves it.
///
/// [`RouteTable`] is the built-in implementation; other lookups can be
/// mounted on the server with [`AppServer::mount`](crate::http::AppServer::mount).
pub trait Router: Send + Sync + 'static {
    fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch>;
}

impl Router for RouteTable {
    fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        RouteTable::resolve(self, method, path)
    }
}
