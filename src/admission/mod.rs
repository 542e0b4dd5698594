//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch (context acquired)
//!     → throttle.rs (window has capacity? else 418 "I'm a teapot")
//!     → slowdown.rs (slot within wait allowance? else 429 "Too Many Requests")
//!     → chain runs while the slot permit is held
//! ```
//!
//! # Design Decisions
//! - Rejections are answered immediately; the server never queues or retries them
//! - Both gates are optional and independent
//! - Slot release is tied to a permit's `Drop`, so every exit path frees it

pub mod slowdown;
pub mod throttle;

use std::time::Duration;

use axum::http::StatusCode;

pub use slowdown::{AdmissionPermit, Slowdown};
pub use throttle::Throttle;

/// Why a request was refused admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The throttle window is exhausted.
    RateExceeded { retry_after: Duration },
    /// No concurrency slot became free within the wait allowance.
    TooManyConcurrent,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::RateExceeded { .. } => StatusCode::IM_A_TEAPOT,
            Rejection::TooManyConcurrent => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Literal body text identifying the rejection.
    pub fn marker(&self) -> &'static str {
        match self {
            Rejection::RateExceeded { .. } => "I'm a teapot",
            Rejection::TooManyConcurrent => "Too Many Requests",
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::RateExceeded { .. } => "throttle",
            Rejection::TooManyConcurrent => "slowdown",
        }
    }

    /// Whole seconds a client should wait, when known.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Rejection::RateExceeded { retry_after } => {
                let secs = retry_after.as_secs();
                Some(if retry_after.subsec_nanos() > 0 { secs + 1 } else { secs })
            }
            Rejection::TooManyConcurrent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        let throttled = Rejection::RateExceeded {
            retry_after: Duration::from_millis(1500),
        };
        assert_eq!(throttled.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(throttled.marker(), "I'm a teapot");
        assert_eq!(throttled.retry_after_secs(), Some(2));

        let busy = Rejection::TooManyConcurrent;
        assert_eq!(busy.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(busy.marker(), "Too Many Requests");
        assert_eq!(busy.retry_after_secs(), None);
    }
}
