// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides a scripted LLM provider, stub tools, and engine construction helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `nutribot`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use nutribot::{
    config::OrchestrationConfig,
    errors::{AppError, AppResult, ErrorCode},
    llm::{
        ChatRequest, ChatResponseWithTools, LlmCapabilities, LlmProvider, ModelClient, RetryPolicy,
    },
    models::{ConversationTurn, PlanPriority, StructuredPlan, ToolCallDescriptor},
    rate_limiting::SlidingWindowRateLimiter,
    services::CoachEngine,
    tools::{ArgumentSchema, CoachTool, PropertySchema, ToolCapabilities, ToolExecutionContext, ToolRegistry},
};
use serde_json::{json, Value};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Scripted provider
// ============================================================================

/// Provider double that replays a fixed list of responses and records requests
pub struct ScriptedProvider {
    script: Mutex<VecDeque<AppResult<ChatResponseWithTools>>>,
    requests: Mutex<Vec<ChatRequest>>,
    calls: AtomicUsize,
    capabilities: LlmCapabilities,
}

impl ScriptedProvider {
    pub fn new(script: Vec<AppResult<ChatResponseWithTools>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            capabilities: LlmCapabilities::full_featured(),
        }
    }

    /// Provider that fails every call with `code`
    pub fn failing(code: ErrorCode, times: usize) -> Self {
        Self::new(
            (0..times)
                .map(|_| Err(AppError::new(code, "scripted failure")))
                .collect(),
        )
    }

    pub fn with_capabilities(mut self, capabilities: LlmCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Number of `complete` calls received
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn display_name(&self) -> &'static str {
        "Scripted test provider"
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponseWithTools> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::internal("script exhausted")))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

// ============================================================================
// Response builders
// ============================================================================

pub fn valid_plan() -> StructuredPlan {
    StructuredPlan {
        summary: "Keep protein steady across the day.".to_owned(),
        priorities: vec![PlanPriority {
            title: "Protein anchor".to_owned(),
            action: "Add chicken breast to lunch.".to_owned(),
            rationale: "About 31g protein per 100g supports your goal.".to_owned(),
            timeframe: "this week".to_owned(),
        }],
        meal_focus: vec!["Lean protein at every meal".to_owned()],
        supplement_options: Vec::new(),
        safety_watchouts: Vec::new(),
        follow_up_questions: vec!["How many meals do you eat per day?".to_owned()],
        disclaimer: "General education only, not medical advice.".to_owned(),
    }
}

pub fn plan_response(plan: &StructuredPlan) -> AppResult<ChatResponseWithTools> {
    Ok(ChatResponseWithTools::text(
        "scripted-model",
        serde_json::to_string(plan).unwrap(),
    ))
}

pub fn text_response(text: &str) -> AppResult<ChatResponseWithTools> {
    Ok(ChatResponseWithTools::text("scripted-model", text))
}

pub fn call(id: &str, name: &str, arguments: Value) -> ToolCallDescriptor {
    ToolCallDescriptor {
        id: id.to_owned(),
        name: name.to_owned(),
        arguments,
    }
}

pub fn tool_calls_response(calls: Vec<ToolCallDescriptor>) -> AppResult<ChatResponseWithTools> {
    Ok(ChatResponseWithTools::tool_calls("scripted-model", calls))
}

// ============================================================================
// Stub tools
// ============================================================================

/// Tool that echoes its arguments after an optional delay
pub struct EchoTool {
    pub name: &'static str,
    pub delay: Duration,
    pub fail: bool,
}

impl EchoTool {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub const fn delayed(name: &'static str, delay: Duration) -> Self {
        Self {
            name,
            delay,
            fail: false,
        }
    }

    pub const fn failing(name: &'static str) -> Self {
        Self {
            name,
            delay: Duration::ZERO,
            fail: true,
        }
    }
}

#[async_trait]
impl CoachTool for EchoTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Echo the arguments back"
    }

    fn argument_schema(&self) -> ArgumentSchema {
        ArgumentSchema::object().optional("value", PropertySchema::string("Anything"))
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<Value> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(AppError::external_service("echo", "backend down"));
        }
        Ok(json!({ "tool": self.name, "args": args, "user_id": context.user_id }))
    }
}

// ============================================================================
// Construction helpers
// ============================================================================

pub fn registry_with(tools: Vec<Arc<dyn CoachTool>>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool);
    }
    registry
}

/// Limiter generous enough never to delay a test
pub fn open_limiter() -> Arc<SlidingWindowRateLimiter> {
    Arc::new(SlidingWindowRateLimiter::per_minute(10_000).unwrap())
}

pub fn model_client(provider: Arc<ScriptedProvider>, retry: RetryPolicy) -> Arc<ModelClient> {
    Arc::new(ModelClient::new(provider, open_limiter()).with_retry(retry))
}

pub fn engine(
    provider: Arc<ScriptedProvider>,
    registry: ToolRegistry,
    config: OrchestrationConfig,
) -> CoachEngine {
    init_test_logging();
    CoachEngine::new(
        model_client(provider, RetryPolicy::no_retry()),
        Arc::new(registry),
        config,
    )
}

pub fn history(message: &str) -> Vec<ConversationTurn> {
    vec![ConversationTurn::user(message)]
}
