//! Reusable context pool.
//!
//! # Design Decisions
//! - The pool owns idle contexts; a request borrows one exclusively through [`PooledContext`]
//! - Contexts are reset on both acquire and release
//! - Release happens in `Drop`, so it runs on every exit path including unwinding
//! - Bounded: contexts beyond `capacity` are dropped instead of kept

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::http::{HeaderName, Request};
use bytes::Bytes;

use crate::context::params::Params;
use crate::context::request_context::Context;
use crate::observability::metrics;

#[derive(Debug)]
pub struct ContextPool {
    idle: Mutex<Vec<Box<Context>>>,
    capacity: usize,
    created: AtomicUsize,
}

impl ContextPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(capacity.min(64))),
            capacity,
            created: AtomicUsize::new(0),
        }
    }

    /// Borrow a context bound to `request`.
    pub fn acquire(
        self: &Arc<Self>,
        request: Request<Bytes>,
        params: Params,
        id_header: &HeaderName,
    ) -> PooledContext {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();

        let mut context = reused.unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            Box::new(Context::new())
        });

        context.reset();
        context.bind(request, params, id_header);

        PooledContext {
            pool: Arc::clone(self),
            context: Some(context),
        }
    }

    fn release(&self, mut context: Box<Context>) {
        context.reset();

        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.capacity {
            idle.push(context);
        }
        metrics::record_pool_idle(idle.len());
    }

    /// Contexts currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Contexts allocated over the pool's lifetime.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Exclusive access to a pooled context; returns it to the pool on drop.
pub struct PooledContext {
    pool: Arc<ContextPool>,
    context: Option<Box<Context>>,
}

impl Deref for PooledContext {
    type Target = Context;

    fn deref(&self) -> &Context {
        // Only `Drop` takes the context out.
        self.context.as_deref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledContext {
    fn deref_mut(&mut self) -> &mut Context {
        self.context.as_deref_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledContext {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            self.pool.release(context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Cursor;

    fn request() -> Request<Bytes> {
        Request::builder()
            .uri("https://www.example.com/resource?key=url_value&test=url_true")
            .header("x-request-id", "req-1")
            .body(Bytes::new())
            .unwrap()
    }

    fn id_header() -> HeaderName {
        HeaderName::from_static("x-request-id")
    }

    #[test]
    fn test_fresh_context_state() {
        let pool = Arc::new(ContextPool::new(4));
        let ctx = pool.acquire(request(), Params::new(), &id_header());

        assert_eq!(ctx.cursor(), Cursor::NotStarted);
        assert!(ctx.middlewares().is_empty());
        assert!(ctx.settings().is_none());
        assert!(ctx.frozen_settings().is_none());
        assert_eq!(ctx.path(), "/resource");
    }

    #[test]
    fn test_released_settings_do_not_leak() {
        let pool = Arc::new(ContextPool::new(4));

        let mut first = pool.acquire(request(), Params::new(), &id_header());
        first.set("marker", "first request");
        let first_addr: *const Context = &*first;
        drop(first);
        assert_eq!(pool.idle(), 1);

        let second = pool.acquire(request(), Params::new(), &id_header());
        let second_addr: *const Context = &*second;

        // same allocation, clean state
        assert_eq!(first_addr, second_addr);
        assert!(!second.has("marker"));
        assert!(second.settings().is_none());
        drop(second);

        let third = pool.acquire(request(), Params::new(), &id_header());
        assert!(third.get::<&str>("marker").is_none());
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_concurrent_acquisitions_are_distinct() {
        let pool = Arc::new(ContextPool::new(4));

        let a = pool.acquire(request(), Params::new(), &id_header());
        let b = pool.acquire(request(), Params::new(), &id_header());

        assert!(!std::ptr::eq(&*a, &*b));
        assert_eq!(
            a.response().header("x-request-id"),
            b.response().header("x-request-id")
        );
        assert_eq!(pool.created(), 2);
    }

    #[test]
    fn test_pool_is_bounded() {
        let pool = Arc::new(ContextPool::new(1));

        let a = pool.acquire(request(), Params::new(), &id_header());
        let b = pool.acquire(request(), Params::new(), &id_header());
        drop(a);
        drop(b);

        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_shared_across_threads() {
        let pool = Arc::new(ContextPool::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let mut ctx = pool.acquire(request(), Params::new(), &id_header());
                        assert!(!ctx.has("owner"));
                        ctx.set("owner", i);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert!(pool.created() <= 8);
    }
}
