//! Cursor-driven chain execution.
//!
//! `next()` enters the middleware after the cursor and awaits it, so code a
//! middleware runs after `next().await` resumes in reverse registration order.
//! Errors and panics from any depth stop at `run()`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::future::{BoxFuture, FutureExt};

use crate::chain::Handler;
use crate::context::request_context::INTERNAL_ERROR;
use crate::context::{Context, Cursor};
use crate::error::Result;
use crate::observability::metrics;

impl Context {
    /// Run the rest of the chain.
    ///
    /// Enters the middleware after the cursor; a no-op once the chain is
    /// exhausted or aborted.
    pub fn next(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.cursor = self.cursor.advance(self.middlewares.len());
            let Cursor::Running(index) = self.cursor else {
                return Ok(());
            };

            let middleware = Arc::clone(&self.middlewares[index]);
            middleware.call(self).await
        })
    }

    /// Stop the chain: no middleware after the current one will be entered.
    pub fn abort(&mut self) {
        self.cursor = Cursor::Done;
    }

    /// Bind `chain` and run it from the first middleware.
    ///
    /// A middleware error or panic is logged and replaces the response with
    /// a 500; the context stays usable and is left in the `Done` state.
    pub async fn run<I>(&mut self, chain: I)
    where
        I: IntoIterator<Item = Handler>,
    {
        self.middlewares.clear();
        self.middlewares.extend(chain);
        self.cursor = Cursor::NotStarted;

        let outcome = AssertUnwindSafe(self.next()).catch_unwind().await;

        let fault = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };

        tracing::error!(
            request_id = %self.request_id(),
            method = %self.method(),
            path = %self.path(),
            error = %fault,
            "Middleware chain failed"
        );
        metrics::record_fault();

        self.cursor = Cursor::Done;
        self.response_mut()
            .fail(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic".to_string()
    }
}
