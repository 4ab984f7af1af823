// ABOUTME: Chat service that validates input, loads history, runs the coach engine and persists turns
// ABOUTME: Defines the ConversationStore persistence seam and an in-memory implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::input::MAX_MESSAGE_CHARS;
use crate::constants::orchestration::STORED_HISTORY_LIMIT;
use crate::errors::{AppError, AppResult};
use crate::models::{ConversationTurn, StructuredPlan, UserProfile};
use crate::tools::ToolCallResult;

use super::coach_engine::{CoachEngine, CoachRequest, PlanSource};

/// Persistence collaborator for conversations
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a conversation owned by `user_id` and return its id
    ///
    /// # Errors
    ///
    /// Returns a storage error if the conversation cannot be created.
    async fn create_conversation(&self, user_id: &str) -> AppResult<String>;

    /// Most recent `limit` turns, oldest first
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the conversation does not exist or belongs to another user.
    async fn recent_turns(
        &self,
        conversation_id: &str,
        user_id: &str,
        limit: usize,
    ) -> AppResult<Vec<ConversationTurn>>;

    /// Append turns in order
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown or foreign conversation.
    async fn append_turns(
        &self,
        conversation_id: &str,
        user_id: &str,
        turns: &[ConversationTurn],
    ) -> AppResult<()>;

    /// Record tool executions for later inspection
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for an unknown or foreign conversation.
    async fn record_tool_events(
        &self,
        conversation_id: &str,
        user_id: &str,
        results: &[ToolCallResult],
    ) -> AppResult<()>;
}

#[derive(Debug, Default)]
struct StoredConversation {
    user_id: String,
    turns: Vec<ConversationTurn>,
    tool_events: Vec<ToolCallResult>,
}

/// Process-local conversation store
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: DashMap<String, StoredConversation>,
}

impl InMemoryConversationStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored turn of a conversation, oldest first
    #[must_use]
    pub fn turns(&self, conversation_id: &str) -> Vec<ConversationTurn> {
        self.conversations
            .get(conversation_id)
            .map(|c| c.turns.clone())
            .unwrap_or_default()
    }

    /// Tool events recorded for a conversation
    #[must_use]
    pub fn tool_events(&self, conversation_id: &str) -> Vec<ToolCallResult> {
        self.conversations
            .get(conversation_id)
            .map(|c| c.tool_events.clone())
            .unwrap_or_default()
    }

    fn with_owned<T>(
        &self,
        conversation_id: &str,
        user_id: &str,
        f: impl FnOnce(&mut StoredConversation) -> T,
    ) -> AppResult<T> {
        match self.conversations.get_mut(conversation_id) {
            Some(mut conversation) if conversation.user_id == user_id => Ok(f(&mut conversation)),
            _ => Err(AppError::not_found("Conversation")),
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(&self, user_id: &str) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        self.conversations.insert(
            id.clone(),
            StoredConversation {
                user_id: user_id.to_owned(),
                ..StoredConversation::default()
            },
        );
        Ok(id)
    }

    async fn recent_turns(
        &self,
        conversation_id: &str,
        user_id: &str,
        limit: usize,
    ) -> AppResult<Vec<ConversationTurn>> {
        self.with_owned(conversation_id, user_id, |conversation| {
            let start = conversation.turns.len().saturating_sub(limit);
            conversation.turns[start..].to_vec()
        })
    }

    async fn append_turns(
        &self,
        conversation_id: &str,
        user_id: &str,
        turns: &[ConversationTurn],
    ) -> AppResult<()> {
        self.with_owned(conversation_id, user_id, |conversation| {
            conversation.turns.extend_from_slice(turns);
        })
    }

    async fn record_tool_events(
        &self,
        conversation_id: &str,
        user_id: &str,
        results: &[ToolCallResult],
    ) -> AppResult<()> {
        self.with_owned(conversation_id, user_id, |conversation| {
            conversation.tool_events.extend_from_slice(results);
        })
    }
}

/// One user message to answer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Caller identity
    pub user_id: String,
    /// Existing conversation; a new one is created when absent
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// User message
    pub message: String,
    /// Personalization context
    #[serde(default)]
    pub profile: UserProfile,
}

/// Answer to a [`ChatRequest`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Conversation the turns were stored in
    pub conversation_id: String,
    /// Coaching plan
    pub plan: StructuredPlan,
    /// Whether the plan came from the fallback
    pub degraded: bool,
    /// Origin of the plan
    pub source: PlanSource,
}

/// Validates, persists and answers chat messages
pub struct ChatService {
    engine: Arc<CoachEngine>,
    store: Arc<dyn ConversationStore>,
}

impl ChatService {
    /// Create the service
    #[must_use]
    pub fn new(engine: Arc<CoachEngine>, store: Arc<dyn ConversationStore>) -> Self {
        Self { engine, store }
    }

    /// Answer one message.
    ///
    /// Business rules:
    /// - The message must be non-blank and at most 4000 characters
    /// - The profile must respect its list and length limits
    /// - The user turn is persisted before the engine runs
    /// - Engine turns and tool events are persisted after it returns
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for rejected input, `ResourceNotFound` for a
    /// foreign or unknown conversation, and storage errors from the store.
    pub async fn handle_chat(&self, request: ChatRequest) -> AppResult<ChatResponse> {
        let user_id = request.user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::invalid_input("user_id must not be empty"));
        }
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AppError::invalid_input("message must not be empty"));
        }
        let length = message.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return Err(AppError::invalid_input(format!(
                "message has {length} characters, at most {MAX_MESSAGE_CHARS} allowed"
            )));
        }
        request.profile.validate()?;

        let conversation_id = match request.conversation_id {
            Some(id) => id,
            None => self.store.create_conversation(user_id).await?,
        };

        let mut history = self
            .store
            .recent_turns(&conversation_id, user_id, STORED_HISTORY_LIMIT)
            .await?;
        let user_turn = ConversationTurn::user(message);
        self.store
            .append_turns(&conversation_id, user_id, std::slice::from_ref(&user_turn))
            .await?;
        history.push(user_turn);
        debug!(
            conversation_id = %conversation_id,
            history = history.len(),
            "Loaded conversation history"
        );

        let coach_request = CoachRequest::new(user_id, history)
            .with_profile(request.profile)
            .with_conversation(&conversation_id);
        let outcome = self.engine.run(&coach_request).await;

        self.store
            .append_turns(&conversation_id, user_id, &outcome.appended_turns)
            .await?;
        if !outcome.tool_results.is_empty() {
            self.store
                .record_tool_events(&conversation_id, user_id, &outcome.tool_results)
                .await?;
        }

        info!(
            conversation_id = %conversation_id,
            source = ?outcome.source,
            degraded = outcome.degraded,
            "Chat message answered"
        );

        Ok(ChatResponse {
            conversation_id,
            plan: outcome.plan,
            degraded: outcome.degraded,
            source: outcome.source,
        })
    }
}
