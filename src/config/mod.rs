// ABOUTME: Configuration module for process-wide settings
// ABOUTME: Re-exports the environment-driven configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for Nutribot
//!
//! All settings come from environment variables; see
//! [`crate::constants::env_config`] for the names.

/// Environment-based configuration
pub mod environment;

pub use environment::{
    LlmConfig, OrchestrationConfig, RateLimitConfig, RetryConfig, ServerConfig, UsdaConfig,
};
