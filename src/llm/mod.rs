// ABOUTME: LLM provider abstraction layer for pluggable AI model integration
// ABOUTME: Defines the provider contract plus tool-calling and structured-output request types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Provider Service Provider Interface
//!
//! ## Key Concepts
//!
//! - **`LlmCapabilities`**: Bitflags describing provider features
//! - **`LlmProvider`**: Async trait performing one chat completion
//! - **`ChatMessage`**: Role-based message, including tool calls and tool results
//! - **`ChatRequest`**: Model, sampling, tool definitions and optional output schema
//! - **`ModelClient`**: Rate-limited, retrying wrapper yielding a [`ModelResult`]
//!
//! ## Example: Using a Provider
//!
//! ```rust,no_run
//! use nutribot::llm::{ChatMessage, ChatRequest, LlmProvider};
//!
//! async fn example(provider: &dyn LlmProvider) {
//!     let messages = vec![
//!         ChatMessage::system("You are a helpful nutrition coach."),
//!         ChatMessage::user("Is oatmeal a good breakfast?"),
//!     ];
//!
//!     let request = ChatRequest::new(messages);
//!     let response = provider.complete(&request).await;
//! }
//! ```

mod client;
mod openai_compatible;
pub mod prompts;

pub use client::{GenerationConfig, ModelClient, ModelResult, RetryPolicy};
pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
pub use prompts::{build_profile_context, get_coach_system_prompt};

use async_trait::async_trait;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::llm::PLAN_SCHEMA_NAME;
use crate::errors::AppResult;
use crate::models::{ConversationTurn, StructuredPlan, ToolCallDescriptor, TurnRole};
use crate::tools::ToolDefinition;

// ============================================================================
// Capability Flags
// ============================================================================

bitflags! {
    /// LLM provider capability flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// Provider supports function/tool calling
        const FUNCTION_CALLING = 0b0000_0001;
        /// Provider enforces a JSON schema on the output
        const STRUCTURED_OUTPUT = 0b0000_0010;
        /// Provider supports system messages
        const SYSTEM_MESSAGES = 0b0000_0100;
    }
}

impl LlmCapabilities {
    /// Capabilities of a current OpenAI-compatible endpoint
    #[must_use]
    pub const fn full_featured() -> Self {
        Self::FUNCTION_CALLING
            .union(Self::STRUCTURED_OUTPUT)
            .union(Self::SYSTEM_MESSAGES)
    }

    /// Check if function calling is supported
    #[must_use]
    pub const fn supports_function_calling(&self) -> bool {
        self.contains(Self::FUNCTION_CALLING)
    }

    /// Check if schema-constrained output is supported
    #[must_use]
    pub const fn supports_structured_output(&self) -> bool {
        self.contains(Self::STRUCTURED_OUTPUT)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
    /// Tool result message
    Tool,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl From<TurnRole> for MessageRole {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => Self::User,
            TurnRole::Assistant => Self::Assistant,
            TurnRole::Tool => Self::Tool,
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: Option<String>,
    /// Tool calls requested by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallDescriptor>,
    /// Call id answered by a tool message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role.into(),
            content: turn.content.clone(),
            tool_calls: turn.tool_calls.clone(),
            tool_call_id: turn.tool_call_id.clone(),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A named JSON schema the provider must constrain its output to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredSchema {
    /// Schema name reported to the provider
    pub name: String,
    /// JSON Schema document
    pub schema: Value,
}

impl StructuredSchema {
    /// Schema of the coaching plan
    #[must_use]
    pub fn structured_plan() -> Self {
        Self {
            name: PLAN_SCHEMA_NAME.to_owned(),
            schema: StructuredPlan::json_schema(),
        }
    }
}

/// Configuration for a chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Model identifier (provider-specific)
    pub model: Option<String>,
    /// Temperature for response randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Nucleus sampling parameter
    pub top_p: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools the model may call
    pub tools: Vec<ToolDefinition>,
    /// Required output schema
    pub response_schema: Option<StructuredSchema>,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            tools: Vec::new(),
            response_schema: None,
        }
    }

    /// Set the model to use
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set nucleus sampling
    #[must_use]
    pub const fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Offer tools to the model
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Constrain the output to a schema
    #[must_use]
    pub fn with_response_schema(mut self, schema: StructuredSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Response from a chat completion that may request tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponseWithTools {
    /// Generated text, if any
    pub content: Option<String>,
    /// Tool calls requested by the model
    pub tool_calls: Vec<ToolCallDescriptor>,
    /// Refusal text when the model declined to answer
    pub refusal: Option<String>,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason (stop, length, `tool_calls`, etc.)
    pub finish_reason: Option<String>,
}

impl ChatResponseWithTools {
    /// Plain text response with no tool calls
    #[must_use]
    pub fn text(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            refusal: None,
            model: model.into(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        }
    }

    /// Response requesting tool calls
    #[must_use]
    pub fn tool_calls(model: impl Into<String>, calls: Vec<ToolCallDescriptor>) -> Self {
        Self {
            content: None,
            tool_calls: calls,
            refusal: None,
            model: model.into(),
            usage: None,
            finish_reason: Some("tool_calls".to_owned()),
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// LLM provider trait for chat completion
///
/// Implement this trait to add a new model backend. Implementations perform a
/// single attempt; rate limiting, retries and timeouts live in [`ModelClient`].
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique provider identifier (e.g., "openai", "ollama")
    fn name(&self) -> &'static str;

    /// Human-readable display name for the provider
    fn display_name(&self) -> &'static str;

    /// Provider capabilities
    fn capabilities(&self) -> LlmCapabilities;

    /// Default model to use if not specified in request
    fn default_model(&self) -> &str;

    /// Perform one chat completion.
    ///
    /// # Errors
    ///
    /// Returns an `AppError` whose code tells the caller whether a retry can help.
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponseWithTools>;

    /// Check if the provider is reachable and the credentials are valid
    ///
    /// # Errors
    ///
    /// Returns an error when the health request itself cannot be made.
    async fn health_check(&self) -> AppResult<bool>;
}
