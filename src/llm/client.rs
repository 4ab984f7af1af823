// ABOUTME: Rate-limited, retrying model client that turns provider responses into ModelResult values
// ABOUTME: Classifies failures as transient or permanent and enforces structured plan output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Model Client
//!
//! Wraps an [`LlmProvider`] with the policies every model call shares:
//!
//! 1. Each attempt first waits on the shared [`SlidingWindowRateLimiter`].
//! 2. The provider call runs under an explicit deadline.
//! 3. The response is interpreted as either tool requests or a final answer;
//!    when a schema is supplied the answer must parse as a [`StructuredPlan`].
//! 4. Transient failures are retried with capped exponential backoff. Anything
//!    else, or exhausting the attempts, becomes `ProviderUnavailable`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{ChatMessage, ChatRequest, ChatResponseWithTools, LlmProvider, StructuredSchema};
use crate::constants::limits::{
    DEFAULT_MODEL_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS,
};
use crate::constants::llm::{
    DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_TEMPERATURE, DEFAULT_TOP_P,
};
use crate::errors::{AppError, AppResult};
use crate::models::{StructuredPlan, ToolCallDescriptor};
use crate::rate_limiting::SlidingWindowRateLimiter;
use crate::tools::{ToolCallRequest, ToolDefinition};

/// Attempts granted to a structured-output call regardless of the retry policy
const MIN_STRUCTURED_ATTEMPTS: u32 = 2;

/// Outcome of one successful model call
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResult {
    /// The model wants tools executed before answering
    ToolCallsRequested {
        /// Requested calls, ids unique within the response
        calls: Vec<ToolCallRequest>,
        /// Text the model sent alongside the calls
        content: Option<String>,
    },
    /// The model answered
    FinalAnswer {
        /// Raw answer text
        content: String,
        /// Parsed plan, present exactly when a schema was requested
        plan: Option<StructuredPlan>,
    },
}

/// Bounded retry with capped exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Randomize each delay between 50% and 100% of its nominal value
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MODEL_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Single attempt per call; structured-output calls still get a second one
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay before retrying after failed attempt number `attempt` (1-based)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let nominal = self.base_delay.saturating_mul(factor).min(self.max_delay);
        if self.jitter && !nominal.is_zero() {
            nominal.mul_f64(rand::thread_rng().gen_range(0.5..=1.0))
        } else {
            nominal
        }
    }
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling
    pub top_p: f32,
    /// Output token cap
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Model client shared by all orchestration runs
pub struct ModelClient {
    provider: Arc<dyn LlmProvider>,
    rate_limiter: Arc<SlidingWindowRateLimiter>,
    retry: RetryPolicy,
    generation: GenerationConfig,
    model: Option<String>,
    call_timeout: Duration,
}

impl ModelClient {
    /// Client with default retry, generation and timeout settings
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, rate_limiter: Arc<SlidingWindowRateLimiter>) -> Self {
        Self {
            provider,
            rate_limiter,
            retry: RetryPolicy::default(),
            generation: GenerationConfig::default(),
            model: None,
            call_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }

    /// Override the retry policy
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override sampling parameters
    #[must_use]
    pub const fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Request a specific model instead of the provider default
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the per-attempt deadline
    #[must_use]
    pub const fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Underlying provider
    #[must_use]
    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    /// Active retry policy
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Perform one logical model call.
    ///
    /// With `schema` set, tools are never offered and the answer must parse
    /// as a [`StructuredPlan`].
    ///
    /// # Errors
    ///
    /// Returns `ProviderUnavailable` after the last transient failure, or
    /// immediately on a non-transient one.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        schema: Option<&StructuredSchema>,
    ) -> AppResult<ModelResult> {
        let request = self.build_request(messages, tools, schema);
        let tools_offered = !request.tools.is_empty();
        // A malformed plan always gets a second chance
        let floor = if schema.is_some() {
            MIN_STRUCTURED_ATTEMPTS
        } else {
            1
        };
        let max_attempts = self.retry.max_attempts.max(floor);

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.rate_limiter.acquire().await;

            let outcome = match timeout(self.call_timeout, self.provider.complete(&request)).await
            {
                Ok(Ok(response)) => interpret(response, tools_offered, schema.is_some()),
                Ok(Err(error)) => Err(error),
                Err(_) => Err(AppError::timeout(
                    "model call",
                    self.call_timeout.as_secs(),
                )),
            };

            match outcome {
                Ok(result) => {
                    debug!(
                        provider = self.provider.name(),
                        attempt,
                        tool_calls = matches!(result, ModelResult::ToolCallsRequested { .. }),
                        "Model call succeeded"
                    );
                    return Ok(result);
                }
                Err(error) if error.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Transient model failure, retrying: {error}"
                    );
                    sleep(delay).await;
                }
                Err(error) => {
                    error!(
                        provider = self.provider.name(),
                        attempt,
                        transient = error.is_transient(),
                        "Model call failed: {error}"
                    );
                    return Err(AppError::provider_unavailable(attempt, &error));
                }
            }
        }
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        schema: Option<&StructuredSchema>,
    ) -> ChatRequest {
        let capabilities = self.provider.capabilities();
        let mut request = ChatRequest::new(messages.to_vec())
            .with_temperature(self.generation.temperature)
            .with_top_p(self.generation.top_p)
            .with_max_tokens(self.generation.max_tokens);

        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }

        match schema {
            Some(schema) if capabilities.supports_structured_output() => {
                request.with_response_schema(schema.clone())
            }
            Some(_) => request,
            None if capabilities.supports_function_calling() && !tools.is_empty() => {
                request.with_tools(tools.to_vec())
            }
            None => request,
        }
    }
}

impl fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClient")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("retry", &self.retry)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

/// Turn one provider response into a result, or an `InvalidFormat` error to retry
fn interpret(
    response: ChatResponseWithTools,
    tools_offered: bool,
    expects_plan: bool,
) -> AppResult<ModelResult> {
    if let Some(refusal) = response.refusal.as_deref().filter(|r| !r.trim().is_empty()) {
        return Err(AppError::invalid_format(format!("model refused: {refusal}")));
    }

    if !response.tool_calls.is_empty() {
        if !tools_offered {
            return Err(AppError::invalid_format(
                "model requested tools when none were offered",
            ));
        }
        let calls = normalize_call_ids(response.tool_calls)
            .into_iter()
            .map(|call| ToolCallRequest::new(call.id, call.name, call.arguments))
            .collect();
        return Ok(ModelResult::ToolCallsRequested {
            calls,
            content: response.content.filter(|c| !c.trim().is_empty()),
        });
    }

    let content = response
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::invalid_format("model returned an empty completion"))?;

    let plan = if expects_plan {
        Some(StructuredPlan::parse_strict(&content)?)
    } else {
        None
    };
    Ok(ModelResult::FinalAnswer { content, plan })
}

/// Replace empty or repeated call ids so every result correlates to one call
fn normalize_call_ids(calls: Vec<ToolCallDescriptor>) -> Vec<ToolCallDescriptor> {
    let mut seen = HashSet::with_capacity(calls.len());
    calls
        .into_iter()
        .map(|mut call| {
            if call.id.trim().is_empty() || seen.contains(&call.id) {
                let replacement = format!("call_{}", Uuid::new_v4().simple());
                debug!(original = %call.id, %replacement, "Normalized tool call id");
                call.id = replacement;
            }
            seen.insert(call.id.clone());
            call
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn descriptor(id: &str) -> ToolCallDescriptor {
        ToolCallDescriptor {
            id: id.to_owned(),
            name: "lookup_nutrients".to_owned(),
            arguments: json!({"query": "oats"}),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(3000),
            jitter: false,
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(3000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(3000));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            jitter: true,
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.delay_for(2);
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(2000));
        }
    }

    #[test]
    fn test_duplicate_and_empty_ids_are_replaced() {
        let calls = normalize_call_ids(vec![descriptor("a"), descriptor("a"), descriptor("")]);
        let ids: HashSet<_> = calls.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(calls[0].id, "a");
        assert!(calls[1].id.starts_with("call_"));
        assert!(calls[2].id.starts_with("call_"));
    }

    #[test]
    fn test_unoffered_tool_calls_are_transient_failures() {
        let response = ChatResponseWithTools::tool_calls("m", vec![descriptor("a")]);
        let error = interpret(response, false, false).unwrap_err();
        assert!(error.is_transient());
    }

    #[test]
    fn test_refusal_is_retryable() {
        let mut response = ChatResponseWithTools::text("m", "");
        response.refusal = Some("I can't help with that".to_owned());
        assert!(interpret(response, true, true).unwrap_err().is_transient());
    }
}
