// ABOUTME: Sliding-window rate limiter guarding calls to upstream APIs
// ABOUTME: Suspends callers until a slot frees up; never rejects a request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Sliding Window Rate Limiter
//!
//! Keeps the timestamps of admitted requests inside a window of fixed width.
//! A caller is admitted when fewer than `max_requests` timestamps remain in the
//! window; otherwise it sleeps until the oldest one expires.
//!
//! The limiter is constructed once at startup and shared by `Arc`, so every
//! model call in the process draws from the same window.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::constants::limits::MIN_LIMITER_SLEEP_MS;
use crate::errors::{AppError, AppResult};

/// Admission control over a sliding time window
#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowRateLimiter {
    /// Create a limiter admitting `max_requests` per `window`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `max_requests` is zero or the window is empty.
    pub fn new(max_requests: u32, window: Duration) -> AppResult<Self> {
        if max_requests == 0 {
            return Err(AppError::config(
                "rate limiter max_requests must be at least 1",
            ));
        }
        if window.is_zero() {
            return Err(AppError::config("rate limiter window must be non-zero"));
        }
        Ok(Self {
            max_requests: max_requests as usize,
            window,
            timestamps: Mutex::new(VecDeque::with_capacity(max_requests as usize)),
        })
    }

    /// Convenience constructor for a per-minute budget
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `requests_per_minute` is zero.
    pub fn per_minute(requests_per_minute: u32) -> AppResult<Self> {
        Self::new(requests_per_minute, Duration::from_secs(60))
    }

    /// Wait until a slot is free, then record the admission
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut timestamps = self.timestamps.lock().await;
                let now = Instant::now();
                self.prune(&mut timestamps, now);

                if timestamps.len() < self.max_requests {
                    timestamps.push_back(now);
                    return;
                }

                // Full window: the front entry is the next to expire
                timestamps.front().map_or(self.window, |oldest| {
                    self.window.saturating_sub(now.duration_since(*oldest))
                })
            };

            let wait = wait.max(Duration::from_millis(MIN_LIMITER_SLEEP_MS));
            debug!(
                wait_ms = wait.as_millis() as u64,
                max_requests = self.max_requests,
                "Rate window full, delaying request"
            );
            sleep(wait).await;
        }
    }

    /// Number of admissions still inside the window
    pub async fn current_load(&self) -> usize {
        let mut timestamps = self.timestamps.lock().await;
        self.prune(&mut timestamps, Instant::now());
        timestamps.len()
    }

    /// Configured admissions per window
    #[must_use]
    pub const fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Configured window width
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    fn prune(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while timestamps
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
        {
            timestamps.pop_front();
        }
    }
}
