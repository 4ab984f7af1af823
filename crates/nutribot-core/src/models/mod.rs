// ABOUTME: Core data models shared across the coach engine
// ABOUTME: Conversation turns, user profiles and the structured coaching plan
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - **conversation**: append-only turns exchanged with the model
//! - **plan**: the validated `StructuredPlan` every run terminates with
//! - **profile**: caller-supplied user context, read-only inside the engine

mod conversation;
mod plan;
mod profile;

pub use conversation::{ConversationTurn, ToolCallDescriptor, TurnRole};
pub use plan::{PlanPriority, StructuredPlan};
pub use profile::UserProfile;
