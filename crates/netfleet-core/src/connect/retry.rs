use rand::Rng;
use std::time::Duration;

/// Exponential backoff delay for the given attempt (0-based) with full
/// jitter, capped.
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let exp = base.saturating_mul(2u32.saturating_pow(attempt));
    let ceiling = exp.min(cap);
    if ceiling.is_zero() {
        return Duration::ZERO;
    }
    let jittered = rand::thread_rng().gen_range(ceiling.as_millis() / 2..=ceiling.as_millis());
    Duration::from_millis(jittered as u64)
}
