//! Process-wide monotonic clock used to stamp events.

use once_cell::sync::Lazy;
use std::time::Instant;

static ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// Milliseconds elapsed since the first call into the clock.
///
/// Every constructor that does not receive an explicit timestamp uses this
/// value, so timestamps from different devices are comparable.
#[must_use]
pub fn now_ms() -> u64 {
    ORIGIN.elapsed().as_millis() as u64
}
