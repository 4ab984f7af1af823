// ABOUTME: Defines ToolExecutionContext which carries caller identity into tool executions.
// ABOUTME: One context is built per orchestration run and shared by every tool call in it.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use uuid::Uuid;

/// Context provided to every tool execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionContext {
    /// User the run is acting for
    pub user_id: String,
    /// Conversation the run belongs to, when persisted
    pub conversation_id: Option<String>,
    /// Identifier correlating every log line of one run
    pub request_id: String,
}

impl ToolExecutionContext {
    /// Context for `user_id` with a fresh request id
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: None,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    /// Attach the conversation id
    #[must_use]
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}
