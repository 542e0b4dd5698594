//! Middleware chain subsystem.
//!
//! # Data Flow
//! ```text
//! Context::run(chain)
//!     → next() enters middleware 0
//!         → middleware 0 awaits next() → middleware 1 → ... → handler
//!         ← post-next code resumes in reverse order
//!     ← errors/panics caught here, converted to 500
//! ```
//!
//! # Design Decisions
//! - Explicit cursor state instead of a sentinel index
//! - A middleware that never calls `next()` ends the chain
//! - `abort()` only prevents further entries; entered middlewares still unwind

pub mod executor;
pub mod middleware;

pub use middleware::{handler_fn, Handler, Middleware};
