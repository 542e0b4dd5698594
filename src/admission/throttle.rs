//! Throughput limiter.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::admission::Rejection;

const REMAINING_MASK: u64 = u32::MAX as u64;

/// Window tag in the high half, admissions left in the low half.
fn pack(tag: u32, remaining: u32) -> u64 {
    (u64::from(tag) << 32) | u64::from(remaining)
}

fn unpack(state: u64) -> (u32, u32) {
    ((state >> 32) as u32, (state & REMAINING_MASK) as u32)
}

/// Fixed-window admission counter shared by all requests.
///
/// Windows are aligned to the limiter's creation instant, so an idle period
/// never shifts later windows. The window tag and the remaining count live in
/// one atomic word: restoring capacity for a new window and taking an
/// admission happen in the same update.
#[derive(Debug)]
pub struct Throttle {
    capacity: u32,
    window: u64,
    state: AtomicU64,
    anchor: Instant,
}

impl Throttle {
    /// Capacities above `u32::MAX` are clamped.
    pub fn new(capacity: NonZeroUsize, window: Duration) -> Self {
        let capacity = u32::try_from(capacity.get()).unwrap_or(u32::MAX);

        Self {
            capacity,
            window: u64::try_from(window.as_nanos()).unwrap_or(u64::MAX).max(1),
            state: AtomicU64::new(pack(0, capacity)),
            anchor: Instant::now(),
        }
    }

    /// `capacity` admissions per second.
    pub fn per_second(capacity: NonZeroUsize) -> Self {
        Self::new(capacity, Duration::from_secs(1))
    }

    /// Take one admission from the current window, or reject immediately.
    pub fn try_admit(&self) -> Result<(), Rejection> {
        let elapsed = u64::try_from(self.anchor.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.admit_at(elapsed)
    }

    fn admit_at(&self, elapsed: u64) -> Result<(), Rejection> {
        let window = elapsed / self.window;
        // tags wrap; only their ordering within half the range matters
        let tag = window as u32;

        let taken = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                let (stored, remaining) = unpack(state);
                let newer = (tag.wrapping_sub(stored) as i32) > 0;

                let (tag, remaining) = if newer {
                    (tag, self.capacity)
                } else {
                    // a caller that read the clock late spends from the stored window
                    (stored, remaining)
                };

                remaining.checked_sub(1).map(|left| pack(tag, left))
            });

        match taken {
            Ok(_) => Ok(()),
            Err(_) => Err(Rejection::RateExceeded {
                retry_after: Duration::from_nanos(
                    (window + 1)
                        .saturating_mul(self.window)
                        .saturating_sub(elapsed)
                        .max(1),
                ),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    pub fn window(&self) -> Duration {
        Duration::from_nanos(self.window)
    }

    /// Admissions left in the window last observed.
    pub fn remaining(&self) -> usize {
        unpack(self.state.load(Ordering::Acquire)).1 as usize
    }
}
