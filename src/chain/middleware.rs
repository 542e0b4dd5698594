//! Middleware abstraction.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::Result;

/// A step of a request chain.
///
/// A middleware may call [`Context::next`] to run the rest of the chain and
/// resume afterwards, call [`Context::abort`] to stop it, or do neither, in
/// which case it is the last step to run.
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>>;
}

impl<F> Middleware for F
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<()>> {
        (self)(ctx)
    }
}

/// Shared, type-erased middleware.
pub type Handler = Arc<dyn Middleware>;

/// Wrap a closure as a [`Handler`].
///
/// ```
/// use app_server::chain::handler_fn;
///
/// let hello = handler_fn(|ctx| Box::pin(async move {
///     ctx.send("hello")?;
///     Ok(())
/// }));
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> Handler
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    Arc::new(f)
}
