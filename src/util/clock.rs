//! Wall-clock and tick helpers used by the poll cycle.
//!
//! Poll bookkeeping works in *ticks*: milliseconds since the process first
//! asked for one, truncated to 32 bits. Ticks wrap after roughly 49.7 days, so
//! elapsed time must always be measured with [`tick_delta`].

use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A wrapping millisecond tick count.
pub type Tick = u32;

static TICK_ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Milliseconds since the unix epoch.
#[must_use]
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Current tick count. Wraps to zero after `u32::MAX` milliseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn tick_count() -> Tick {
    let origin = TICK_ORIGIN.get_or_init(Instant::now);
    // truncation is the wraparound
    origin.elapsed().as_millis() as Tick
}

/// Elapsed ticks between `earlier` and `now`, correct across a single wrap.
#[must_use]
pub const fn tick_delta(now: Tick, earlier: Tick) -> Tick {
    now.wrapping_sub(earlier)
}

/// Elapsed time between two ticks as a [`Duration`].
#[must_use]
pub fn tick_elapsed(now: Tick, earlier: Tick) -> Duration {
    Duration::from_millis(u64::from(tick_delta(now, earlier)))
}
