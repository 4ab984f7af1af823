// ABOUTME: Main library entry point for the Nutribot coach engine
// ABOUTME: Tool-calling LLM orchestration that turns chat input into validated nutrition plans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Nutribot
//!
//! A coaching engine that answers free-form nutrition questions with a
//! validated [`models::StructuredPlan`]. The model may call lookup tools
//! mid-conversation; the engine bounds the number of rounds, keeps tool
//! results ordered, rate limits the upstream API, and falls back to a
//! deterministic plan when the provider is unavailable.
//!
//! ## Architecture
//!
//! - **Rate limiting**: Sliding window limiter shared by every model call
//! - **Tools**: `CoachTool` trait, argument schemas and the audited registry
//! - **LLM**: Provider trait, OpenAI-compatible client and the retrying `ModelClient`
//! - **Services**: Orchestration loop, fallback, crisis screen and chat flow
//! - **Config**: Environment-driven settings
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use nutribot::config::ServerConfig;
//! use nutribot::errors::AppResult;
//! use nutribot::external::MockUsdaClient;
//! use nutribot::llm::{ModelClient, OpenAiCompatibleProvider};
//! use nutribot::memory::InMemoryMemoryStore;
//! use nutribot::models::ConversationTurn;
//! use nutribot::services::{CoachEngine, CoachRequest};
//! use nutribot::tools::{ToolBackends, ToolRegistry};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let provider = Arc::new(OpenAiCompatibleProvider::new(config.llm.provider_config())?);
//!     let limiter = Arc::new(config.rate_limit.build_limiter()?);
//!     let model = ModelClient::new(provider, limiter).with_retry(config.retry.policy());
//!
//!     let mut tools = ToolRegistry::new().with_timeout(config.orchestration.tool_timeout());
//!     tools.register_builtin_tools(&ToolBackends::new(
//!         Arc::new(MockUsdaClient::new()),
//!         Arc::new(InMemoryMemoryStore::new()),
//!     ));
//!
//!     let engine = CoachEngine::new(Arc::new(model), Arc::new(tools), config.orchestration);
//!     let request = CoachRequest::new(
//!         "user-1",
//!         vec![ConversationTurn::user("How much protein is in chicken breast?")],
//!     );
//!     let outcome = engine.run(&request).await;
//!     println!("{}", outcome.plan.summary);
//!     Ok(())
//! }
//! ```

pub use nutribot_core::{constants, errors, models};

/// Environment-driven configuration
pub mod config;

/// External data sources backing the nutrition tools
pub mod external;

/// Model provider abstraction and the retrying model client
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Per-user memory store backing the memory tools
pub mod memory;

/// Sliding window rate limiter for upstream APIs
pub mod rate_limiting;

/// Orchestration engine and chat services
pub mod services;

/// Coach tools, schemas and the tool registry
pub mod tools;
