//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes with their handler chains
//! - Resolve method + path to a chain and path parameters
//! - Return an explicit miss rather than a silent default

use std::sync::Arc;

use axum::http::Method;

use crate::chain::Handler;
use crate::routing::matcher::PathPattern;

#[derive(Clone)]
struct Route {
    /// `None` matches any method.
    method: Option<Method>,
    pattern: PathPattern,
    chain: Arc<[Handler]>,
}

/// A resolved route.
#[derive(Clone)]
pub struct RouteMatch {
    pub pattern: String,
    pub chain: Arc<[Handler]>,
    pub params: Vec<(String, String)>,
}

impl std::fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("chain", &self.chain.len())
            .field("params", &self.params)
            .finish()
    }
}

/// Ordered route table; first registered match wins.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `chain` (middlewares then handler) for `method` and `path`.
    pub fn add(&mut self, method: Option<Method>, path: &str, chain: Vec<Handler>) {
        tracing::debug!(
            method = %method.as_ref().map_or("ANY", Method::as_str),
            path = %path,
            chain = chain.len(),
            "Route registered"
        );

        self.routes.push(Route {
            method,
            pattern: PathPattern::parse(path),
            chain: chain.into(),
        });
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|route| route.method.as_ref().map_or(true, |m| m == method))
            .find_map(|route| {
                route.pattern.matches(path).map(|params| RouteMatch {
                    pattern: route.pattern.as_str().to_string(),
                    chain: Arc::clone(&route.chain),
                    params,
                })
            })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
