//! Per-request execution context subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch
//!     → pool.rs (acquire: reuse or allocate, reset, bind request)
//!     → request_context.rs (params, settings, response writer)
//!     → chain executor drives the cursor (cursor.rs)
//!     → response.rs (buffered status/headers/body, taken by dispatch)
//!     → pool.rs (release on drop: reset, keep if below capacity)
//! ```
//!
//! # Design Decisions
//! - One context serves one request at a time (exclusive `&mut` access)
//! - No state survives a release: cursor, chain, settings, params and response are cleared
//! - Settings are allocated lazily; a fresh context has none

pub mod cursor;
pub mod params;
pub mod pool;
pub mod request_context;
pub mod response;
pub mod settings;

pub use cursor::Cursor;
pub use params::Params;
pub use pool::{ContextPool, PooledContext};
pub use request_context::Context;
pub use response::ResponseWriter;
pub use settings::Settings;
