// SPDX-FileCopyrightText: 2026 Anketa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user rate limiting for inbound messages.
//!
//! A user whose messages arrive faster than the configured minimum interval
//! has the extra messages dropped before any handler runs. Timestamps are
//! process-local; a restart forgets them, which only errs on the permissive
//! side.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Minimum-interval throttle keyed by user id.
pub struct Throttle {
    min_interval: Duration,
    last_seen: Mutex<HashMap<i64, Instant>>,
}

impl Throttle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval: Duration::from_millis(min_interval_ms),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true if the user's message should be handled, updating the
    /// user's timestamp; false if it arrived inside the throttle window.
    pub fn allow(&self, user_id: i64) -> bool {
        if self.min_interval.is_zero() {
            return true;
        }

        let now = Instant::now();
        let mut last_seen = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        match last_seen.get(&user_id) {
            Some(&last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                last_seen.insert(user_id, now);
                true
            }
        }
    }
}
