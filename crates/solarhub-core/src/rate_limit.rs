// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SolarHub.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior};

/// Spaces outbound requests at a fixed interval.
///
/// Shared by all concurrent calls of one adapter. The interval is created on
/// first use so the limiter can be built outside a runtime.
#[derive(Debug)]
pub struct RateLimiter {
    period: Duration,
    interval: Mutex<Option<Interval>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            interval: Mutex::new(None),
        }
    }

    /// Limiter allowing `rps` requests per second; non-positive values fall back to 1 rps
    #[must_use]
    pub fn per_second(rps: f64) -> Self {
        let rps = if rps.is_finite() && rps > 0.0 { rps } else { 1.0 };
        Self::new(Duration::from_secs_f64(1.0 / rps))
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for the next slot. Cancelled with the caller's future.
    pub async fn acquire(&self) {
        let mut guard = self.interval.lock().await;
        let interval = guard.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }
}
