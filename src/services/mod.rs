// ABOUTME: Coaching service layer: orchestration engine, fallback, safety screen and chat flow
// ABOUTME: Protocol-agnostic services reusable from the CLI or any future transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Coaching service layer

/// Chat flow: validation, history loading and persistence around the engine
pub mod chat;

/// Bounded tool-calling orchestration loop
pub mod coach_engine;

/// Deterministic plan used when the model is unavailable
pub mod fallback;

/// Crisis language screen
pub mod safety;

pub use chat::{ChatRequest, ChatResponse, ChatService, ConversationStore, InMemoryConversationStore};
pub use coach_engine::{CoachEngine, CoachOutcome, CoachRequest, PlanSource};
pub use fallback::FallbackGenerator;
pub use safety::{crisis_plan, detect_crisis};
