//! Monotonic millisecond time.
//!
//! All deadlines in this crate are compared against a wrapping 32-bit
//! millisecond tick supplied by the caller; nothing here sleeps or awaits.

/// A point on the monotonic millisecond tick.
pub type Instant = fugit::TimerInstantU32<1_000>;

/// A span of milliseconds.
pub type Duration = fugit::MillisDurationU32;

/// Time elapsed from `since` to `now`, tolerant of tick wraparound.
///
/// Returns zero if `now` is (in wrapping order) before `since`.
#[inline]
#[must_use]
pub fn elapsed(since: Instant, now: Instant) -> Duration {
    now.checked_duration_since(since)
        .unwrap_or(Duration::from_ticks(0))
}

/// Build an [`Instant`] from a raw millisecond count.
#[inline]
#[must_use]
pub const fn millis(ms: u32) -> Instant {
    Instant::from_ticks(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_forward() {
        assert_eq!(elapsed(millis(10), millis(60)), Duration::from_ticks(50));
    }

    #[test]
    fn test_elapsed_across_wrap() {
        let since = millis(u32::MAX - 9);
        let now = millis(40);
        assert_eq!(elapsed(since, now), Duration::from_ticks(50));
    }

    #[test]
    fn test_elapsed_backwards_is_zero() {
        assert_eq!(elapsed(millis(60), millis(10)), Duration::from_ticks(0));
    }
}
