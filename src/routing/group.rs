//! Route groups.

use axum::http::Method;
use futures_util::future::BoxFuture;

use crate::chain::{handler_fn, Handler};
use crate::context::Context;
use crate::error::Result;
use crate::routing::matcher::join_paths;
use crate::routing::router::RouteTable;

/// Generates one registration method per HTTP verb.
macro_rules! verb_routes {
    ($($name:ident => $method:expr),* $(,)?) => {
        $(
            pub fn $name<F>(&mut self, path: &str, handler: F) -> &mut Self
            where
                F: for<'a> Fn(
                        &'a mut $crate::context::Context,
                    ) -> ::futures_util::future::BoxFuture<'a, $crate::error::Result<()>>
                    + Send
                    + Sync
                    + 'static,
            {
                self.handle($method, path, vec![$crate::chain::handler_fn(handler)])
            }
        )*
    };
}

pub(crate) use verb_routes;

/// Routes sharing a path prefix and a list of middlewares.
///
/// Group middlewares run after the server's global ones and before the
/// route's own handlers. A middleware added to a group applies to routes
/// registered after it.
pub struct RouteGroup<'t> {
    table: &'t mut RouteTable,
    prefix: String,
    middlewares: Vec<Handler>,
}

impl<'t> RouteGroup<'t> {
    pub(crate) fn new(table: &'t mut RouteTable, prefix: String, middlewares: Vec<Handler>) -> Self {
        Self {
            table,
            prefix,
            middlewares,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        self.use_handler(handler_fn(middleware))
    }

    pub fn use_handler(&mut self, middleware: Handler) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Nested group inheriting this group's prefix and middlewares.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup::new(
            &mut *self.table,
            join_paths(&self.prefix, prefix),
            self.middlewares.clone(),
        )
    }

    /// Register `handlers` under the group prefix; `None` matches any method.
    pub fn handle(&mut self, method: Option<Method>, path: &str, handlers: Vec<Handler>) -> &mut Self {
        let chain = self
            .middlewares
            .iter()
            .cloned()
            .chain(handlers)
            .collect();
        self.table.add(method, &join_paths(&self.prefix, path), chain);
        self
    }

    verb_routes! {
        get => Some(Method::GET),
        post => Some(Method::POST),
        put => Some(Method::PUT),
        patch => Some(Method::PATCH),
        delete => Some(Method::DELETE),
        head => Some(Method::HEAD),
        options => Some(Method::OPTIONS),
        any => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_prefixes_and_middlewares() {
        let mut table = RouteTable::new();
        {
            let mut api = RouteGroup::new(&mut table, "/api".into(), Vec::new());
            api.use_middleware(|ctx| Box::pin(async move { ctx.next().await }));
            api.get("/users/{id}", |_ctx| Box::pin(async move { Ok(()) }));

            let mut admin = api.group("/admin");
            admin.use_middleware(|ctx| Box::pin(async move { ctx.next().await }));
            admin.delete("/users/{id}", |_ctx| Box::pin(async move { Ok(()) }));
        }

        let users = table.resolve(&Method::GET, "/api/users/3").unwrap();
        assert_eq!(users.chain.len(), 2);

        let removal = table.resolve(&Method::DELETE, "/api/admin/users/3").unwrap();
        assert_eq!(removal.pattern, "/api/admin/users/{id}");
        assert_eq!(removal.chain.len(), 3);

        assert!(table.resolve(&Method::GET, "/users/3").is_none());
    }
}
