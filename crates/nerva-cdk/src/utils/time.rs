//!
//! Time helpers abstracting over host/IC execution so call sites can request
//! UNIX epoch timestamps at various precisions.
//!

use std::time::SystemTime;

// time_nanos
#[allow(unreachable_code)]
fn time_nanos() -> u128 {
    #[cfg(target_arch = "wasm32")]
    {
        return crate::api::time() as u128;
    }

    match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => d.as_nanos(),
        Err(_) => 0,
    }
}

/// Returns the current UNIX epoch time in seconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn now_secs() -> u64 {
    (time_nanos() / 1_000_000_000) as u64
}

/// Returns the current UNIX epoch time in nanoseconds.
///
/// Ledger `created_at_time` fields are expressed at this precision.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn now_nanos() -> u64 {
    time_nanos() as u64
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_secs_and_nanos_agree() {
        let secs = now_secs();
        let nanos = now_nanos();

        assert!(secs > 1_700_000_000);
        assert!(nanos / 1_000_000_000 >= secs);
    }
}
