// ABOUTME: Bounded tool-calling orchestration loop producing a validated StructuredPlan
// ABOUTME: Drives model rounds, executes requested tools, and degrades to the fallback plan
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Coach Engine
//!
//! One run walks an explicit state machine:
//!
//! ```text
//! Init -> AwaitingModel -> (ExecutingTools -> AwaitingModel)* -> Finalizing -> Done
//!              \__________________________________________________/
//!                                      |
//!                                   Fallback -> Done
//! ```
//!
//! Every tool round increments the round counter; when it reaches
//! `max_tool_rounds` the engine stops offering tools and asks for the plan, so
//! a run makes at most `max_tool_rounds + 1` model calls. Any model failure
//! that survives the client's retries moves the run to `Fallback`, which always
//! yields a plan. The caller's history is never mutated; new turns come back in
//! [`CoachOutcome::appended_turns`].

use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::OrchestrationConfig;
use crate::errors::{AppError, ErrorCode};
use crate::llm::{
    build_profile_context, get_coach_system_prompt, ChatMessage, ModelClient, ModelResult,
    StructuredSchema,
};
use crate::models::{ConversationTurn, StructuredPlan, TurnRole, UserProfile};
use crate::tools::{ToolCallRequest, ToolCallResult, ToolDefinition, ToolExecutionContext, ToolRegistry};

use super::fallback::FallbackGenerator;
use super::safety::{crisis_plan, detect_crisis};

/// Input for one orchestration run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoachRequest {
    /// User the run acts for; scopes memory tools
    pub user_id: String,
    /// Conversation the run belongs to, if any
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Personalization context
    #[serde(default)]
    pub profile: UserProfile,
    /// Prior turns, oldest first, including the latest user message
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

impl CoachRequest {
    /// Request for `user_id` over `history`
    #[must_use]
    pub fn new(user_id: impl Into<String>, history: Vec<ConversationTurn>) -> Self {
        Self {
            user_id: user_id.into(),
            history,
            ..Self::default()
        }
    }

    /// Attach a profile
    #[must_use]
    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Attach a conversation id
    #[must_use]
    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Most recent non-blank user message
    #[must_use]
    pub fn latest_user_message(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .filter(|turn| turn.role == TurnRole::User)
            .find_map(ConversationTurn::text)
    }
}

/// Where the returned plan came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// Structured output from the model
    Model,
    /// Deterministic fallback after a provider failure
    Fallback,
    /// Crisis response; the model was never called
    SafetyOverride,
}

/// Result of one orchestration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachOutcome {
    /// Validated plan
    pub plan: StructuredPlan,
    /// Origin of the plan
    pub source: PlanSource,
    /// True exactly when the fallback produced the plan
    pub degraded: bool,
    /// Turns to append to the caller's history, ending with the plan text
    pub appended_turns: Vec<ConversationTurn>,
    /// Every tool result in execution order
    pub tool_results: Vec<ToolCallResult>,
    /// Model calls made (retries inside one call not counted)
    pub model_calls: u32,
    /// Tool rounds executed
    pub tool_rounds: u32,
}

/// Orchestration state
#[derive(Debug)]
enum LoopState {
    Init,
    AwaitingModel,
    ExecutingTools {
        calls: Vec<ToolCallRequest>,
        content: Option<String>,
    },
    Finalizing,
    Fallback {
        error: AppError,
    },
    Done {
        plan: StructuredPlan,
        source: PlanSource,
    },
}

impl LoopState {
    const fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::AwaitingModel => "awaiting_model",
            Self::ExecutingTools { .. } => "executing_tools",
            Self::Finalizing => "finalizing",
            Self::Fallback { .. } => "fallback",
            Self::Done { .. } => "done",
        }
    }
}

/// Working data of one run; discarded when the run ends
struct RunState {
    messages: Vec<ChatMessage>,
    appended: Vec<ConversationTurn>,
    tool_results: Vec<ToolCallResult>,
    rounds: u32,
    model_calls: u32,
    tool_rounds: u32,
}

impl RunState {
    fn commit(&mut self, turn: ConversationTurn) {
        self.messages.push(ChatMessage::from(&turn));
        self.appended.push(turn);
    }
}

/// Runs the coaching loop against a model client and tool registry
pub struct CoachEngine {
    model: Arc<ModelClient>,
    tools: Arc<ToolRegistry>,
    fallback: FallbackGenerator,
    config: OrchestrationConfig,
}

impl CoachEngine {
    /// Create an engine sharing `model` and `tools` with other engines
    #[must_use]
    pub const fn new(
        model: Arc<ModelClient>,
        tools: Arc<ToolRegistry>,
        config: OrchestrationConfig,
    ) -> Self {
        Self {
            model,
            tools,
            fallback: FallbackGenerator::new(),
            config,
        }
    }

    /// Tool registry used by this engine
    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Produce a plan for `request`. Never fails.
    #[instrument(skip_all, fields(user_id = %request.user_id, conversation_id = ?request.conversation_id))]
    pub async fn run(&self, request: &CoachRequest) -> CoachOutcome {
        if request.latest_user_message().is_some_and(detect_crisis) {
            warn!("Crisis language detected, returning lifeline response without model call");
            let plan = crisis_plan();
            return CoachOutcome {
                appended_turns: vec![ConversationTurn::assistant(plan.to_assistant_text())],
                plan,
                source: PlanSource::SafetyOverride,
                degraded: false,
                tool_results: Vec::new(),
                model_calls: 0,
                tool_rounds: 0,
            };
        }

        let definitions = self.tools.list_definitions();
        let mut context = ToolExecutionContext::new(&request.user_id);
        if let Some(conversation_id) = &request.conversation_id {
            context = context.with_conversation(conversation_id);
        }
        let schema = StructuredSchema::structured_plan();
        let max_rounds = self.config.max_tool_rounds.max(1);

        let mut run = RunState {
            messages: Vec::new(),
            appended: Vec::new(),
            tool_results: Vec::new(),
            rounds: 0,
            model_calls: 0,
            tool_rounds: 0,
        };
        let mut state = LoopState::Init;

        let (plan, source) = loop {
            debug!(
                state = state.name(),
                rounds = run.rounds,
                model_calls = run.model_calls,
                "Orchestration step"
            );
            state = match state {
                LoopState::Init => {
                    run.messages = self.seed_messages(request);
                    if definitions.is_empty() {
                        LoopState::Finalizing
                    } else {
                        LoopState::AwaitingModel
                    }
                }
                LoopState::AwaitingModel => {
                    run.rounds += 1;
                    run.model_calls += 1;
                    self.await_model(&mut run, &definitions).await
                }
                LoopState::ExecutingTools { calls, content } => {
                    let results = self.execute_round(&calls, &context).await;
                    info!(
                        round = run.rounds,
                        calls = calls.len(),
                        failed = results.iter().filter(|r| !r.success).count(),
                        "Tool round complete"
                    );

                    // Commit the round only once every result is in
                    let descriptors = calls.iter().map(ToolCallRequest::to_descriptor).collect();
                    run.commit(ConversationTurn::assistant_tool_calls(content, descriptors));
                    for result in &results {
                        run.commit(ConversationTurn::tool_result(&result.call_id, result.content()));
                    }
                    run.tool_results.extend(results);
                    run.tool_rounds += 1;

                    if run.rounds >= max_rounds {
                        debug!(max_rounds, "Tool round limit reached");
                        LoopState::Finalizing
                    } else {
                        LoopState::AwaitingModel
                    }
                }
                LoopState::Finalizing => {
                    run.model_calls += 1;
                    match self.model.complete(&run.messages, &[], Some(&schema)).await {
                        Ok(ModelResult::FinalAnswer {
                            plan: Some(plan), ..
                        }) => LoopState::Done {
                            plan,
                            source: PlanSource::Model,
                        },
                        Ok(_) => LoopState::Fallback {
                            error: AppError::new(
                                ErrorCode::ProviderUnavailable,
                                "model did not return a structured plan",
                            ),
                        },
                        Err(error) => LoopState::Fallback { error },
                    }
                }
                LoopState::Fallback { error } => {
                    warn!(
                        model_calls = run.model_calls,
                        error_code = ?error.code,
                        "Model unavailable, serving degraded fallback plan: {error}"
                    );
                    run.appended.clear();
                    LoopState::Done {
                        plan: self.fallback.generate(&request.history, &request.profile),
                        source: PlanSource::Fallback,
                    }
                }
                LoopState::Done { plan, source } => break (plan, source),
            };
        };

        run.appended
            .push(ConversationTurn::assistant(plan.to_assistant_text()));
        info!(
            source = ?source,
            model_calls = run.model_calls,
            tool_rounds = run.tool_rounds,
            "Coach run finished"
        );

        CoachOutcome {
            degraded: source == PlanSource::Fallback,
            plan,
            source,
            appended_turns: run.appended,
            tool_results: run.tool_results,
            model_calls: run.model_calls,
            tool_rounds: run.tool_rounds,
        }
    }

    /// System prompt, profile block, then the most recent dialogue turns
    fn seed_messages(&self, request: &CoachRequest) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(get_coach_system_prompt())];
        if let Some(profile_context) = build_profile_context(&request.profile) {
            messages.push(ChatMessage::system(profile_context));
        }

        let dialogue: Vec<&ConversationTurn> = request
            .history
            .iter()
            .filter(|turn| turn.is_dialogue())
            .collect();
        // The current user message is always sent
        let start = dialogue.len().saturating_sub(self.config.history_limit.max(1));
        messages.extend(dialogue[start..].iter().map(|turn| ChatMessage::from(*turn)));
        messages
    }

    async fn await_model(&self, run: &mut RunState, definitions: &[ToolDefinition]) -> LoopState {
        match self.model.complete(&run.messages, definitions, None).await {
            Ok(ModelResult::ToolCallsRequested { calls, content }) => {
                debug!(round = run.rounds, calls = calls.len(), "Model requested tools");
                LoopState::ExecutingTools { calls, content }
            }
            Ok(ModelResult::FinalAnswer { content, .. }) => {
                // The draft guides the structured pass but is not persisted
                run.messages.push(ChatMessage::assistant(content));
                LoopState::Finalizing
            }
            Err(error) => LoopState::Fallback { error },
        }
    }

    /// Execute one round; results come back in request order
    async fn execute_round(
        &self,
        calls: &[ToolCallRequest],
        context: &ToolExecutionContext,
    ) -> Vec<ToolCallResult> {
        if self.config.parallel_tool_calls {
            join_all(calls.iter().map(|call| self.tools.execute(call, context))).await
        } else {
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                results.push(self.tools.execute(call, context).await);
            }
            results
        }
    }
}
