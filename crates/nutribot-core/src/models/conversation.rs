// ABOUTME: Conversation turn types exchanged between the caller, the model and tools
// ABOUTME: Turns are append-only records; tool turns are keyed by the originating call id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// End user message
    User,
    /// Model output, possibly carrying tool call requests
    Assistant,
    /// Result of one tool call
    Tool,
}

impl TurnRole {
    /// Wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model, as recorded on the assistant turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDescriptor {
    /// Call identifier, unique within the run
    pub id: String,
    /// Name of the requested tool
    pub name: String,
    /// Arguments as produced by the model
    pub arguments: Value,
}

/// One entry of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who produced the turn
    pub role: TurnRole,
    /// Text content; absent on assistant turns that only request tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls requested by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallDescriptor>,
    /// Call id answered by a tool turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// When the turn was produced
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    fn new(role: TurnRole, content: Option<String>) -> Self {
        Self {
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            created_at: Utc::now(),
        }
    }

    /// A user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, Some(content.into()))
    }

    /// A plain assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, Some(content.into()))
    }

    /// An assistant turn requesting tool calls
    #[must_use]
    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCallDescriptor>) -> Self {
        let mut turn = Self::new(TurnRole::Assistant, content);
        turn.tool_calls = calls;
        turn
    }

    /// The result of one tool call
    #[must_use]
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut turn = Self::new(TurnRole::Tool, Some(content.into()));
        turn.tool_call_id = Some(call_id.into());
        turn
    }

    /// Non-blank text content, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// True for user or assistant turns that carry text and no tool wiring
    #[must_use]
    pub fn is_dialogue(&self) -> bool {
        matches!(self.role, TurnRole::User | TurnRole::Assistant)
            && self.tool_calls.is_empty()
            && self.text().is_some()
    }
}
