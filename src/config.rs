use once_cell::sync::Lazy;

use crate::billing::MAX_FAILURES;

/// Consecutive failed charges tolerated before a monthly subscription is
/// cancelled. Override via `BILLING_MAX_CHARGE_FAILURES`; non-positive or
/// unparseable values fall back to the default.
pub static BILLING_MAX_CHARGE_FAILURES: Lazy<u32> = Lazy::new(|| {
    std::env::var("BILLING_MAX_CHARGE_FAILURES")
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(MAX_FAILURES)
});
