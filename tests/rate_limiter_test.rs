// ABOUTME: Integration tests for the sliding window rate limiter
// ABOUTME: Runs on paused tokio time to verify delays without dropping requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use nutribot::errors::ErrorCode;
use nutribot::rate_limiting::SlidingWindowRateLimiter;
use tokio::time::Instant;

#[test]
fn test_zero_limit_or_window_is_a_configuration_error() {
    let err = SlidingWindowRateLimiter::new(0, Duration::from_secs(60)).unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigInvalid);

    let err = SlidingWindowRateLimiter::new(5, Duration::ZERO).unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigInvalid);
}

#[tokio::test(start_paused = true)]
async fn test_admits_up_to_limit_without_waiting() {
    let limiter = SlidingWindowRateLimiter::new(3, Duration::from_secs(60)).unwrap();
    let start = Instant::now();

    for _ in 0..3 {
        limiter.acquire().await;
    }

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(limiter.current_load().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_full_window_delays_until_oldest_expires() {
    let limiter = SlidingWindowRateLimiter::new(2, Duration::from_secs(10)).unwrap();
    let start = Instant::now();

    limiter.acquire().await;
    limiter.acquire().await;
    limiter.acquire().await;

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(10), "waited {elapsed:?}");
    assert!(elapsed < Duration::from_secs(11), "waited {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_are_delayed_never_dropped() {
    let limiter = Arc::new(SlidingWindowRateLimiter::new(2, Duration::from_secs(1)).unwrap());
    let start = Instant::now();

    let handles = (0..5).map(|_| {
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move {
            limiter.acquire().await;
            Instant::now()
        })
    });
    let admitted: Vec<Instant> = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(admitted.len(), 5);
    assert!(start.elapsed() >= Duration::from_secs(2));

    // No window of one second ever admits more than two requests
    for t in &admitted {
        let in_window = admitted
            .iter()
            .filter(|other| **other >= *t && other.duration_since(*t) < Duration::from_secs(1))
            .count();
        assert!(in_window <= 2, "{in_window} admissions inside one window");
    }
}

#[tokio::test(start_paused = true)]
async fn test_load_drains_as_window_slides() {
    let limiter = SlidingWindowRateLimiter::new(5, Duration::from_secs(30)).unwrap();
    limiter.acquire().await;
    tokio::time::advance(Duration::from_secs(20)).await;
    limiter.acquire().await;
    assert_eq!(limiter.current_load().await, 2);

    tokio::time::advance(Duration::from_secs(10)).await;
    assert_eq!(limiter.current_load().await, 1);

    tokio::time::advance(Duration::from_secs(20)).await;
    assert_eq!(limiter.current_load().await, 0);
}
