// ABOUTME: OpenAI-compatible chat completions provider with tool calling and strict JSON schema output
// ABOUTME: Works with api.openai.com and any server implementing the same wire format
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Provider
//!
//! Performs a single chat completion attempt per call. HTTP and wire failures
//! are mapped onto error codes so the model client can tell transient failures
//! (5xx, 429, timeouts, malformed bodies) from permanent ones (401, 400, 404).
//!
//! ## Supported Backends
//!
//! - **`OpenAI`**: <https://api.openai.com/v1>
//! - **Ollama**: <http://localhost:11434/v1>
//! - **vLLM**: <http://localhost:8000/v1>
//! - **Any `OpenAI`-compatible endpoint**

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use super::{
    ChatMessage, ChatRequest, ChatResponseWithTools, LlmCapabilities, LlmProvider,
    StructuredSchema, TokenUsage,
};
use crate::constants::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::ToolCallDescriptor;
use crate::tools::ToolDefinition;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Connection timeout
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Hard ceiling on one HTTP exchange; the model client applies its own, shorter deadline
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Service label used in error messages
const SERVICE: &str = "LLM API";

// ============================================================================
// API Request/Response Types (OpenAI-compatible format)
// ============================================================================

/// OpenAI-compatible API request structure
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

/// Tool definition for OpenAI-compatible API
#[derive(Debug, Clone, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAiFunction,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

/// Message structure for OpenAI-compatible API
#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiOutgoingToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Tool call echoed back on an assistant message
#[derive(Debug, Clone, Serialize)]
struct OpenAiOutgoingToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: &'static str,
    function: OpenAiOutgoingFunctionCall,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiOutgoingFunctionCall {
    name: String,
    arguments: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        let tool_calls = (!msg.tool_calls.is_empty()).then(|| {
            msg.tool_calls
                .iter()
                .map(|call| OpenAiOutgoingToolCall {
                    id: call.id.clone(),
                    call_type: "function",
                    function: OpenAiOutgoingFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.to_string(),
                    },
                })
                .collect()
        });
        Self {
            role: msg.role.as_str(),
            content: msg.content.clone(),
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }
}

/// OpenAI-compatible API response structure
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    model: String,
}

/// Choice in response
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

/// Message in response
#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

/// Tool call in response
#[derive(Debug, Clone, Deserialize)]
struct OpenAiToolCall {
    #[serde(default)]
    id: String,
    function: OpenAiFunctionCall,
}

/// Function call details in response
#[derive(Debug, Clone, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Usage statistics in response
#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Error response structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for the `OpenAI`-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL for the API (e.g., <https://api.openai.com/v1>)
    pub base_url: String,
    /// API key (optional for local servers)
    pub api_key: Option<String>,
    /// Default model to use
    pub default_model: String,
    /// Capabilities of this provider
    pub capabilities: LlmCapabilities,
}

impl OpenAiCompatibleConfig {
    /// Configuration for `base_url` with the given key and model
    #[must_use]
    pub fn new(base_url: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            api_key: api_key.filter(|key| !key.is_empty()),
            default_model: model.to_owned(),
            capabilities: LlmCapabilities::full_featured(),
        }
    }

    fn is_openai(&self) -> bool {
        self.base_url.contains("api.openai.com")
    }
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, None, DEFAULT_MODEL)
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Generic `OpenAI`-compatible LLM provider
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {e}")))?;

        if config.api_key.is_none() && config.is_openai() {
            warn!("No API key configured for {}; requests will be rejected", config.base_url);
        }
        info!(
            "Initializing OpenAI-compatible provider: base_url={}, model={}",
            config.base_url, config.default_model
        );

        Ok(Self { client, config })
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// Convert registry tool definitions to `OpenAI` format
    fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|tool| OpenAiTool {
                tool_type: "function",
                function: OpenAiFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.to_value(),
                },
            })
            .collect()
    }

    /// Strict `json_schema` response format
    fn response_format(schema: &StructuredSchema) -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "strict": true,
                "schema": schema.schema,
            }
        })
    }

    /// Convert tool calls to descriptors.
    ///
    /// Arguments that are not valid JSON are kept as the raw string so that
    /// argument validation reports them instead of silently dropping the call.
    fn convert_tool_calls(tool_calls: Vec<OpenAiToolCall>) -> Vec<ToolCallDescriptor> {
        tool_calls
            .into_iter()
            .map(|call| {
                let raw = call.function.arguments;
                let arguments = if raw.trim().is_empty() {
                    json!({})
                } else {
                    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
                };
                debug!(
                    tool_call_id = %call.id,
                    function_name = %call.function.name,
                    "Converting tool call"
                );
                ToolCallDescriptor {
                    id: call.id,
                    name: call.function.name,
                    arguments,
                }
            })
            .collect()
    }

    /// Map an HTTP error status and body onto an error code
    fn parse_error_response(status: StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |parsed| {
                format!(
                    "{} - {}",
                    parsed.error.error_type.as_deref().unwrap_or("unknown"),
                    parsed.error.message
                )
            },
        );

        match status.as_u16() {
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("API authentication failed: {detail}"),
            ),
            429 => AppError::external_rate_limited(SERVICE, detail),
            400 | 422 => AppError::invalid_input(format!("API validation error: {detail}")),
            404 => AppError::not_found(format!("Model or endpoint ({detail})")),
            500..=599 => AppError::external_unavailable(SERVICE, format!("HTTP {status}: {detail}")),
            _ => AppError::external_service(SERVICE, format!("HTTP {status}: {detail}")),
        }
    }

    /// Add authorization header if API key is configured
    fn add_auth_header(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(ref api_key) = self.config.api_key {
            request.bearer_auth(api_key)
        } else {
            request
        }
    }

    fn send_error(&self, error: &reqwest::Error) -> AppError {
        error!("Failed to send request to {}: {}", self.config.base_url, error);
        if error.is_timeout() {
            AppError::timeout("chat completion", REQUEST_TIMEOUT_SECS)
        } else if error.is_connect() {
            AppError::external_unavailable(
                SERVICE,
                format!("Cannot connect to {}", self.config.base_url),
            )
        } else {
            AppError::external_service(SERVICE, format!("Request failed: {error}"))
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        if self.config.is_openai() {
            "openai"
        } else {
            "openai_compatible"
        }
    }

    fn display_name(&self) -> &'static str {
        if self.config.is_openai() {
            "OpenAI"
        } else {
            "OpenAI-compatible endpoint"
        }
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model.as_deref().unwrap_or(&self.config.default_model)))]
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponseWithTools> {
        let model = request
            .model
            .as_deref()
            .unwrap_or(&self.config.default_model);

        let has_tools = !request.tools.is_empty();
        let openai_request = OpenAiRequest {
            model: model.to_owned(),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
            tools: has_tools.then(|| Self::convert_tools(&request.tools)),
            tool_choice: has_tools.then(|| "auto".to_owned()),
            response_format: request.response_schema.as_ref().map(Self::response_format),
        };
        debug!(
            messages = openai_request.messages.len(),
            tools = request.tools.len(),
            structured = openai_request.response_format.is_some(),
            "Sending chat completion request"
        );

        let http_request = self
            .client
            .post(self.api_url("chat/completions"))
            .json(&openai_request);

        let response = self
            .add_auth_header(http_request)
            .send()
            .await
            .map_err(|e| self.send_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read API response: {}", e);
            AppError::external_service(SERVICE, format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            error!(
                "Failed to parse API response: {} - body: {}",
                e,
                body.chars().take(500).collect::<String>()
            );
            AppError::invalid_format(format!("Malformed completion: {e}"))
        })?;

        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::invalid_format("API returned no choices"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .map(Self::convert_tool_calls)
            .unwrap_or_default();

        debug!(
            content_len = choice.message.content.as_ref().map_or(0, String::len),
            tool_calls = tool_calls.len(),
            finish_reason = ?choice.finish_reason,
            "Received chat completion"
        );

        Ok(ChatResponseWithTools {
            content: choice.message.content,
            tool_calls,
            refusal: choice.message.refusal,
            model: openai_response.model,
            usage: openai_response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    async fn health_check(&self) -> AppResult<bool> {
        debug!("Performing health check at {}", self.config.base_url);

        let response = self
            .add_auth_header(self.client.get(self.api_url("models")))
            .send()
            .await
            .map_err(|e| self.send_error(&e))?;

        let healthy = response.status().is_success();
        if healthy {
            debug!("Health check passed");
        } else {
            warn!("Health check failed with status: {}", response.status());
        }
        Ok(healthy)
    }
}
