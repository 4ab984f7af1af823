// ABOUTME: Environment configuration for the model provider, rate limiting, retries and orchestration
// ABOUTME: Parses NUTRIBOT_* variables with defaults and rejects out-of-range values at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::{env_config, limits, llm, orchestration, usda};
use crate::errors::{AppError, AppResult};
use crate::external::UsdaClientConfig;
use crate::llm::{GenerationConfig, OpenAiCompatibleConfig, RetryPolicy};
use crate::rate_limiting::SlidingWindowRateLimiter;

/// Model provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    pub base_url: String,
    /// API key, absent for keyless local servers
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
    /// Nucleus sampling (0.0 exclusive - 1.0)
    pub top_p: f32,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Per-attempt deadline in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: llm::DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            model: llm::DEFAULT_MODEL.to_owned(),
            temperature: llm::DEFAULT_TEMPERATURE,
            top_p: llm::DEFAULT_TOP_P,
            max_output_tokens: llm::DEFAULT_MAX_OUTPUT_TOKENS,
            timeout_secs: llm::DEFAULT_MODEL_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    /// Provider configuration for the HTTP client
    #[must_use]
    pub fn provider_config(&self) -> OpenAiCompatibleConfig {
        OpenAiCompatibleConfig::new(&self.base_url, self.api_key.clone(), &self.model)
    }

    /// Sampling parameters
    #[must_use]
    pub const fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_output_tokens,
        }
    }

    /// Per-attempt deadline
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Sliding window limit on model requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub requests_per_window: u32,
    /// Window width in seconds
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: limits::DEFAULT_REQUESTS_PER_MINUTE,
            window_secs: limits::DEFAULT_RATE_WINDOW_SECS,
        }
    }
}

impl RateLimitConfig {
    /// Build the process-wide limiter
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` for a zero limit or window.
    pub fn build_limiter(&self) -> AppResult<SlidingWindowRateLimiter> {
        SlidingWindowRateLimiter::new(
            self.requests_per_window,
            Duration::from_secs(self.window_secs),
        )
    }
}

/// Retry policy for model calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per call, first included
    pub max_attempts: u32,
    /// Initial backoff in milliseconds
    pub base_delay_ms: u64,
    /// Backoff ceiling in milliseconds
    pub max_delay_ms: u64,
    /// Randomize delays
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: limits::DEFAULT_MODEL_MAX_ATTEMPTS,
            base_delay_ms: limits::DEFAULT_RETRY_BASE_DELAY_MS,
            max_delay_ms: limits::DEFAULT_RETRY_MAX_DELAY_MS,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Policy used by the model client
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: self.jitter,
        }
    }
}

/// Orchestration loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Tool rounds before the plan is forced
    pub max_tool_rounds: u32,
    /// Prior user/assistant turns sent to the model
    pub history_limit: usize,
    /// Execute the calls of one round concurrently
    pub parallel_tool_calls: bool,
    /// Per-call tool deadline in seconds
    pub tool_timeout_secs: u64,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: orchestration::DEFAULT_MAX_TOOL_ROUNDS,
            history_limit: orchestration::DEFAULT_HISTORY_LIMIT,
            parallel_tool_calls: true,
            tool_timeout_secs: orchestration::DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }
}

impl OrchestrationConfig {
    /// Per-call tool deadline
    #[must_use]
    pub const fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

/// USDA `FoodData` Central settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsdaConfig {
    /// API key; without one the live client is not usable
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: usda::DEFAULT_BASE_URL.to_owned(),
        }
    }
}

impl UsdaConfig {
    /// Client configuration, if an API key is present
    #[must_use]
    pub fn client_config(&self) -> Option<UsdaClientConfig> {
        self.api_key.as_ref().map(|api_key| UsdaClientConfig {
            api_key: api_key.clone(),
            base_url: self.base_url.clone(),
            ..UsdaClientConfig::default()
        })
    }
}

/// Complete process configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Model provider
    pub llm: LlmConfig,
    /// Model request rate limit
    pub rate_limit: RateLimitConfig,
    /// Model retries
    pub retry: RetryConfig,
    /// Orchestration loop
    pub orchestration: OrchestrationConfig,
    /// Nutrient lookups
    pub usda: UsdaConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` if a variable cannot be parsed or a value is out of range.
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let api_key =
            optional_env(env_config::LLM_API_KEY).or_else(|| optional_env(env_config::OPENAI_API_KEY));

        let config = Self {
            llm: LlmConfig {
                base_url: env_var_or(env_config::LLM_BASE_URL, llm::DEFAULT_BASE_URL),
                api_key,
                model: env_var_or(env_config::LLM_MODEL, llm::DEFAULT_MODEL),
                temperature: env_parse(env_config::TEMPERATURE, llm::DEFAULT_TEMPERATURE)?,
                top_p: env_parse(env_config::TOP_P, llm::DEFAULT_TOP_P)?,
                max_output_tokens: env_parse(
                    env_config::MAX_OUTPUT_TOKENS,
                    llm::DEFAULT_MAX_OUTPUT_TOKENS,
                )?,
                timeout_secs: env_parse(
                    env_config::MODEL_TIMEOUT_SECS,
                    llm::DEFAULT_MODEL_TIMEOUT_SECS,
                )?,
            },
            rate_limit: RateLimitConfig {
                requests_per_window: env_parse(
                    env_config::REQUESTS_PER_MINUTE,
                    limits::DEFAULT_REQUESTS_PER_MINUTE,
                )?,
                window_secs: env_parse(
                    env_config::RATE_WINDOW_SECS,
                    limits::DEFAULT_RATE_WINDOW_SECS,
                )?,
            },
            retry: RetryConfig {
                max_attempts: env_parse(
                    env_config::MODEL_MAX_ATTEMPTS,
                    limits::DEFAULT_MODEL_MAX_ATTEMPTS,
                )?,
                base_delay_ms: env_parse(
                    env_config::RETRY_BASE_DELAY_MS,
                    limits::DEFAULT_RETRY_BASE_DELAY_MS,
                )?,
                max_delay_ms: env_parse(
                    env_config::RETRY_MAX_DELAY_MS,
                    limits::DEFAULT_RETRY_MAX_DELAY_MS,
                )?,
                jitter: env_bool(env_config::RETRY_JITTER, false)?,
            },
            orchestration: OrchestrationConfig {
                max_tool_rounds: env_parse(
                    env_config::MAX_TOOL_ROUNDS,
                    orchestration::DEFAULT_MAX_TOOL_ROUNDS,
                )?,
                history_limit: env_parse(
                    env_config::HISTORY_LIMIT,
                    orchestration::DEFAULT_HISTORY_LIMIT,
                )?,
                parallel_tool_calls: env_bool(env_config::PARALLEL_TOOLS, true)?,
                tool_timeout_secs: env_parse(
                    env_config::TOOL_TIMEOUT_SECS,
                    orchestration::DEFAULT_TOOL_TIMEOUT_SECS,
                )?,
            },
            usda: UsdaConfig {
                api_key: optional_env(env_config::USDA_API_KEY),
                base_url: env_var_or(env_config::USDA_BASE_URL, usda::DEFAULT_BASE_URL),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate ranges and cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` describing the first violation.
    pub fn validate(&self) -> AppResult<()> {
        let llm_config = &self.llm;
        if llm_config.base_url.trim().is_empty() {
            return Err(AppError::config("LLM base URL must not be empty"));
        }
        if llm_config.model.trim().is_empty() {
            return Err(AppError::config("LLM model must not be empty"));
        }
        if !(0.0..=2.0).contains(&llm_config.temperature) {
            return Err(AppError::config(format!(
                "temperature {} outside 0.0-2.0",
                llm_config.temperature
            )));
        }
        if !(llm_config.top_p > 0.0 && llm_config.top_p <= 1.0) {
            return Err(AppError::config(format!(
                "top_p {} outside (0.0, 1.0]",
                llm_config.top_p
            )));
        }
        check_range(
            "max_output_tokens",
            llm_config.max_output_tokens,
            llm::MIN_OUTPUT_TOKENS,
            llm::MAX_OUTPUT_TOKENS,
        )?;
        check_at_least("model timeout", llm_config.timeout_secs, 1)?;

        check_at_least("requests per window", self.rate_limit.requests_per_window, 1)?;
        check_at_least("rate window", self.rate_limit.window_secs, 1)?;

        check_range(
            "model max attempts",
            self.retry.max_attempts,
            1,
            limits::MAX_MODEL_ATTEMPTS,
        )?;
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(AppError::config(format!(
                "retry base delay {}ms exceeds max delay {}ms",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }

        check_range(
            "max tool rounds",
            self.orchestration.max_tool_rounds,
            orchestration::MIN_TOOL_ROUNDS,
            orchestration::MAX_TOOL_ROUNDS,
        )?;
        check_at_least("tool timeout", self.orchestration.tool_timeout_secs, 1)?;
        check_at_least("history limit", self.orchestration.history_limit, 1)?;

        if llm_config.api_key.is_none() && llm_config.base_url.contains("api.openai.com") {
            warn!("No model API key configured; every model call will fall back");
        }
        if self.usda.api_key.is_none() {
            warn!("USDA_API_KEY not set; live nutrient lookups are unavailable");
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Nutribot Configuration:\n\
             - LLM Endpoint: {}\n\
             - Model: {}\n\
             - API Key: {}\n\
             - Rate Limit: {} requests / {}s\n\
             - Retries: {} attempts, {}-{}ms backoff{}\n\
             - Tool Rounds: {}\n\
             - Parallel Tools: {}\n\
             - USDA Lookups: {}",
            self.llm.base_url,
            self.llm.model,
            if self.llm.api_key.is_some() {
                "Configured"
            } else {
                "Missing"
            },
            self.rate_limit.requests_per_window,
            self.rate_limit.window_secs,
            self.retry.max_attempts,
            self.retry.base_delay_ms,
            self.retry.max_delay_ms,
            if self.retry.jitter { " with jitter" } else { "" },
            self.orchestration.max_tool_rounds,
            if self.orchestration.parallel_tool_calls {
                "Enabled"
            } else {
                "Disabled"
            },
            if self.usda.api_key.is_some() {
                "Enabled"
            } else {
                "Disabled"
            },
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_owned())
}

/// Non-blank environment variable
fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Parse an environment variable, using `default` when unset
fn env_parse<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    optional_env(key).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}")))
    })
}

/// Parse a boolean flag (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`)
fn env_bool(key: &str, default: bool) -> AppResult<bool> {
    let Some(raw) = optional_env(key) else {
        return Ok(default);
    };
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AppError::config(format!(
            "Invalid {key} value '{raw}': expected true or false"
        ))),
    }
}

fn check_range<T: PartialOrd + Display>(name: &str, value: T, min: T, max: T) -> AppResult<()> {
    if value < min || value > max {
        return Err(AppError::config(format!(
            "{name} {value} outside {min}-{max}"
        )));
    }
    Ok(())
}

fn check_at_least<T: PartialOrd + Display>(name: &str, value: T, min: T) -> AppResult<()> {
    if value < min {
        return Err(AppError::config(format!("{name} must be at least {min}, got {value}")));
    }
    Ok(())
}
