//! Per-email sliding-window throttle for recovery-code issuance.
//!
//! Unlimited reissuance is an enumeration and mailbox-flooding vector, so
//! issuance is capped per address within a rolling window. State is
//! in-process only; a restart clears it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::ResetThrottleConfig;

pub struct ResetThrottle {
    window: Duration,
    max_requests: u32,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl ResetThrottle {
    #[must_use]
    pub fn new(config: &ResetThrottleConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_seconds),
            max_requests: config.max_requests.max(1),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record one issuance attempt for `email`; returns false when the
    /// address has exhausted its window.
    pub fn allow(&self, email: &str) -> bool {
        let now = Instant::now();
        let mut attempts = match self.attempts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let entry = attempts.entry(email.to_lowercase()).or_default();
        entry.retain(|t| now.duration_since(*t) < self.window);

        if entry.len() >= self.max_requests as usize {
            return false;
        }

        entry.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(max_requests: u32) -> ResetThrottle {
        ResetThrottle::new(&ResetThrottleConfig {
            max_requests,
            window_seconds: 60,
        })
    }

    #[test]
    fn allows_up_to_limit() {
        let t = throttle(3);
        assert!(t.allow("a@example.com"));
        assert!(t.allow("a@example.com"));
        assert!(t.allow("a@example.com"));
        assert!(!t.allow("a@example.com"));
    }

    #[test]
    fn addresses_are_independent() {
        let t = throttle(1);
        assert!(t.allow("a@example.com"));
        assert!(!t.allow("a@example.com"));
        assert!(t.allow("b@example.com"));
    }

    #[test]
    fn address_is_case_insensitive() {
        let t = throttle(1);
        assert!(t.allow("A@Example.com"));
        assert!(!t.allow("a@example.com"));
    }
}
