// ABOUTME: Defines the CoachTool trait and ToolCapabilities for the pluggable tools architecture.
// ABOUTME: Tools implement this trait to be registered and executed via the ToolRegistry.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Coach Tool Trait and Capabilities
//!
//! All tools the model can call implement [`CoachTool`], which provides:
//! - Tool metadata (name, description, argument schema)
//! - Capability flags for filtering and logging
//! - Async execution with a per-run context

use async_trait::async_trait;
use bitflags::bitflags;
use serde_json::Value;

use crate::errors::AppResult;

use super::context::ToolExecutionContext;
use super::schema::ArgumentSchema;

bitflags! {
    /// Capabilities that tools declare for filtering and audit logging.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ToolCapabilities: u8 {
        /// Tool reads data
        const READS_DATA = 0b0000_0001;
        /// Tool writes or modifies data
        const WRITES_DATA = 0b0000_0010;
        /// Tool calls a third-party API
        const EXTERNAL_API = 0b0000_0100;
        /// Tool touches per-user memory
        const USER_MEMORY = 0b0000_1000;
    }
}

impl ToolCapabilities {
    /// Check if tool reads data
    #[must_use]
    pub const fn reads_data(self) -> bool {
        self.contains(Self::READS_DATA)
    }

    /// Check if tool writes data
    #[must_use]
    pub const fn writes_data(self) -> bool {
        self.contains(Self::WRITES_DATA)
    }

    /// Get a description of all enabled capabilities for logging
    #[must_use]
    pub fn describe(&self) -> String {
        let parts: Vec<&str> = self
            .iter_names()
            .map(|(name, _)| match name {
                "READS_DATA" => "reads_data",
                "WRITES_DATA" => "writes_data",
                "EXTERNAL_API" => "external_api",
                "USER_MEMORY" => "user_memory",
                other => other,
            })
            .collect();

        if parts.is_empty() {
            "none".to_owned()
        } else {
            parts.join(", ")
        }
    }
}

/// A tool the model may invoke during an orchestration run.
///
/// Implementations receive arguments that already passed
/// [`ArgumentSchema::validate`], so required properties are present and typed.
#[async_trait]
pub trait CoachTool: Send + Sync {
    /// Unique tool name as exposed to the model
    fn name(&self) -> &'static str;

    /// Description the model uses to decide when to call the tool
    fn description(&self) -> &'static str;

    /// Declared arguments
    fn argument_schema(&self) -> ArgumentSchema;

    /// Capability flags
    fn capabilities(&self) -> ToolCapabilities;

    /// Run the tool.
    ///
    /// # Errors
    ///
    /// Any error is converted by the registry into a failure result for the model.
    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<Value>;
}
