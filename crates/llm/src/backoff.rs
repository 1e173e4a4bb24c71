//! Retry schedule and server-supplied delay parsing.

use std::time::Duration;

/// Retries allowed after the first attempt.
pub const MAX_RETRIES: u32 = 3;

/// First back-off delay; doubles on every retry.
pub const BASE_DELAY: Duration = Duration::from_millis(2000);

/// Bounded exponential back-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    /// Delay before the first retry.
    pub base: Duration,
    /// Retry ceiling; a request is attempted at most `max_retries + 1` times.
    pub max_retries: u32,
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self {
            base: BASE_DELAY,
            max_retries: MAX_RETRIES,
        }
    }
}

impl RetrySchedule {
    /// Delay before retry number `attempt` (zero-based).
    ///
    /// `base × 2^attempt`, raised to `server` when the server asked for longer.
    pub fn delay(&self, attempt: u32, server: Option<Duration>) -> Duration {
        let backoff = self.base.saturating_mul(2u32.saturating_pow(attempt));
        match server {
            Some(requested) => backoff.max(requested),
            None => backoff,
        }
    }
}

/// Parses a `Retry-After` header given in delta-seconds.
///
/// HTTP-date values are not supported and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Parses a protobuf-JSON duration such as `"12s"` or `"1.25s"`, rounding up
/// to whole milliseconds.
pub fn parse_proto_duration(value: &str) -> Option<Duration> {
    let number = value.trim().strip_suffix('s')?;
    let (whole, frac) = match number.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (number, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let secs: u64 = whole.parse().ok()?;
    let frac_ms = if frac.is_empty() {
        0
    } else {
        let digits: u64 = frac.parse().ok()?;
        let scale = 10u64.pow(frac.len() as u32);
        (digits * 1000).div_ceil(scale)
    };
    Some(Duration::from_millis(secs.checked_mul(1000)?.checked_add(frac_ms)?))
}
