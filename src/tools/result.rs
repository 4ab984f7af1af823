// ABOUTME: Defines tool call requests, results and audit events exchanged with the registry.
// ABOUTME: Results are always values, never errors, so the model can read and react to failures.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Tool Call Types
//!
//! - `ToolCallRequest` - One validated-before-execution call requested by the model
//! - `ToolCallResult` - Outcome of a call, success or failure, keyed by call id
//! - `ToolAuditEvent` - What the registry broadcasts after every execution

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::orchestration::RESULT_PREVIEW_CHARS;
use crate::errors::ToolError;
use crate::models::ToolCallDescriptor;

use super::context::ToolExecutionContext;

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Call identifier, unique within the run
    pub call_id: String,
    /// Requested tool
    pub tool_name: String,
    /// Argument mapping
    pub arguments: Value,
}

impl ToolCallRequest {
    /// Build a request
    #[must_use]
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: Value,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// The descriptor recorded on the assistant turn
    #[must_use]
    pub fn to_descriptor(&self) -> ToolCallDescriptor {
        ToolCallDescriptor {
            id: self.call_id.clone(),
            name: self.tool_name.clone(),
            arguments: self.arguments.clone(),
        }
    }
}

/// Outcome of one tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Call identifier of the originating request
    pub call_id: String,
    /// Tool that was called
    pub tool_name: String,
    /// Whether the tool produced data
    pub success: bool,
    /// Tool data, or `{"error": ...}` on failure
    pub payload: Value,
    /// Truncated payload text for audit logs
    pub preview: String,
}

impl ToolCallResult {
    /// Successful result
    #[must_use]
    pub fn success(request: &ToolCallRequest, payload: Value) -> Self {
        Self::build(request, true, payload)
    }

    /// Failure result describing `error`
    #[must_use]
    pub fn failure(request: &ToolCallRequest, error: &ToolError) -> Self {
        let kind = match error {
            ToolError::NotFound { .. } => "unknown_tool",
            ToolError::InvalidParameter { .. } | ToolError::MissingParameter { .. } => {
                "invalid_arguments"
            }
            ToolError::Timeout { .. } => "timeout",
            ToolError::ExecutionFailed { .. } | ToolError::AlreadyRegistered { .. } => {
                "execution_failed"
            }
        };
        Self::build(
            request,
            false,
            json!({ "error": error.to_string(), "error_kind": kind }),
        )
    }

    fn build(request: &ToolCallRequest, success: bool, payload: Value) -> Self {
        let preview = preview_text(&payload.to_string(), RESULT_PREVIEW_CHARS);
        Self {
            call_id: request.call_id.clone(),
            tool_name: request.tool_name.clone(),
            success,
            payload,
            preview,
        }
    }

    /// Payload serialized as the tool turn content sent back to the model
    #[must_use]
    pub fn content(&self) -> String {
        self.payload.to_string()
    }
}

/// Truncate `text` to at most `max_chars` characters without splitting a code point
#[must_use]
pub fn preview_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_owned(),
        None => text.to_owned(),
    }
}

/// Audit record broadcast after every tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolAuditEvent {
    /// Call identifier
    pub call_id: String,
    /// Tool name
    pub tool_name: String,
    /// Arguments as requested
    pub arguments: Value,
    /// Whether the call succeeded
    pub success: bool,
    /// Truncated result payload
    pub preview: String,
    /// Wall time spent in validation and execution
    pub duration_ms: u64,
    /// User the run acted for
    pub user_id: String,
    /// Conversation, when known
    pub conversation_id: Option<String>,
    /// Completion time
    pub occurred_at: DateTime<Utc>,
}

impl ToolAuditEvent {
    /// Build the event for a finished call
    #[must_use]
    pub fn new(
        request: &ToolCallRequest,
        result: &ToolCallResult,
        context: &ToolExecutionContext,
        elapsed: Duration,
    ) -> Self {
        Self {
            call_id: result.call_id.clone(),
            tool_name: result.tool_name.clone(),
            arguments: request.arguments.clone(),
            success: result.success,
            preview: result.preview.clone(),
            duration_ms: elapsed.as_millis() as u64,
            user_id: context.user_id.clone(),
            conversation_id: context.conversation_id.clone(),
            occurred_at: Utc::now(),
        }
    }
}
