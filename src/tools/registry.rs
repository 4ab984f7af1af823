// ABOUTME: Central registry for coach tools with argument validation and audited execution.
// ABOUTME: Provides tool discovery in registration order and feature-flag-based registration.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Tool Registry
//!
//! Central registry for coach tools, providing:
//! - Tool registration and lookup
//! - Definitions for the model in stable registration order
//! - Argument validation, per-call timeouts and failure capture
//! - A broadcast audit stream of every execution
//!
//! `execute` never returns an error. Unknown tools, bad arguments, executor
//! failures and timeouts all become failure results the model can read.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::constants::orchestration::{AUDIT_CHANNEL_CAPACITY, DEFAULT_TOOL_TIMEOUT_SECS};
use crate::errors::ToolError;

use super::context::ToolExecutionContext;
use super::implementations::ToolBackends;
use super::result::{ToolAuditEvent, ToolCallRequest, ToolCallResult};
use super::schema::ToolDefinition;
use super::traits::{CoachTool, ToolCapabilities};

/// Central registry for coach tools.
///
/// Built once at startup, then shared immutably by `Arc` across runs.
pub struct ToolRegistry {
    /// Registered tools by name
    tools: HashMap<String, Arc<dyn CoachTool>>,
    /// Names in registration order
    order: Vec<String>,
    /// Deadline applied to every execution
    timeout: Duration,
    /// Audit stream
    audit: broadcast::Sender<ToolAuditEvent>,
}

impl ToolRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        let (audit, _) = broadcast::channel(AUDIT_CHANNEL_CAPACITY);
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            audit,
        }
    }

    /// Override the per-call timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a tool in the registry
    ///
    /// # Returns
    ///
    /// `true` if the tool was registered, `false` if a tool with the same name exists
    pub fn register(&mut self, tool: Arc<dyn CoachTool>) -> bool {
        let name = tool.name().to_owned();

        if self.tools.contains_key(&name) {
            warn!("{}, skipping", ToolError::already_registered(&name));
            return false;
        }

        debug!(
            "Registering tool '{}' with capabilities: {}",
            name,
            tool.capabilities().describe()
        );
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        true
    }

    /// Get a tool by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn CoachTool>> {
        self.tools.get(name)
    }

    /// Check if a tool is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names in registration order
    #[must_use]
    pub fn tool_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Definitions for every tool, in registration order
    #[must_use]
    pub fn list_definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolDefinition {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.argument_schema(),
            })
            .collect()
    }

    /// Tools carrying all of `required`, in registration order
    #[must_use]
    pub fn filter_by_capabilities(&self, required: ToolCapabilities) -> Vec<&str> {
        self.order
            .iter()
            .filter(|name| {
                self.tools
                    .get(name.as_str())
                    .is_some_and(|tool| tool.capabilities().contains(required))
            })
            .map(String::as_str)
            .collect()
    }

    /// Receive an audit event for every subsequent execution
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ToolAuditEvent> {
        self.audit.subscribe()
    }

    /// Execute one tool call.
    ///
    /// Always yields a result: failures are captured in the payload, logged,
    /// and audited like successes.
    pub async fn execute(
        &self,
        request: &ToolCallRequest,
        context: &ToolExecutionContext,
    ) -> ToolCallResult {
        let started = Instant::now();
        let result = match self.run(request, context).await {
            Ok(payload) => ToolCallResult::success(request, payload),
            Err(error) => {
                warn!(
                    tool = %request.tool_name,
                    call_id = %request.call_id,
                    request_id = %context.request_id,
                    "Tool call failed: {error}"
                );
                ToolCallResult::failure(request, &error)
            }
        };

        let elapsed = started.elapsed();
        debug!(
            tool = %result.tool_name,
            call_id = %result.call_id,
            success = result.success,
            duration_ms = elapsed.as_millis() as u64,
            preview = %result.preview,
            "Tool call finished"
        );
        if self
            .audit
            .send(ToolAuditEvent::new(request, &result, context, elapsed))
            .is_err()
        {
            debug!("No tool audit subscribers");
        }
        result
    }

    async fn run(
        &self,
        request: &ToolCallRequest,
        context: &ToolExecutionContext,
    ) -> Result<Value, ToolError> {
        let tool = self
            .get(&request.tool_name)
            .ok_or_else(|| ToolError::not_found(&request.tool_name))?;

        tool.argument_schema()
            .validate(tool.name(), &request.arguments)?;

        let args = match &request.arguments {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };

        match timeout(self.timeout, tool.execute(args, context)).await {
            Ok(Ok(payload)) => Ok(payload),
            Ok(Err(error)) => Err(ToolError::execution_failed(
                &request.tool_name,
                error.message,
            )),
            Err(_) => Err(ToolError::timeout(
                &request.tool_name,
                self.timeout.as_secs(),
            )),
        }
    }

    /// Register all built-in tools based on feature flags
    pub fn register_builtin_tools(&mut self, backends: &ToolBackends) {
        info!("Registering built-in tools...");

        // Nutrition tools
        #[cfg(feature = "tools-nutrition")]
        self.register_nutrition_tools(backends);

        // Memory tools
        #[cfg(feature = "tools-memory")]
        self.register_memory_tools(backends);

        #[cfg(not(any(feature = "tools-nutrition", feature = "tools-memory")))]
        let _ = backends;

        info!("Registered {} built-in tools", self.len());
    }

    /// Register nutrition lookup tools
    #[cfg(feature = "tools-nutrition")]
    fn register_nutrition_tools(&mut self, backends: &ToolBackends) {
        use super::implementations::nutrition::create_nutrition_tools;

        for tool in create_nutrition_tools(&backends.nutrients) {
            self.register(tool);
        }

        info!(
            "Registered nutrition tools (registry now has {} tools)",
            self.tools.len()
        );
    }

    /// Register user memory tools
    #[cfg(feature = "tools-memory")]
    fn register_memory_tools(&mut self, backends: &ToolBackends) {
        use super::implementations::memory::create_memory_tools;

        for tool in create_memory_tools(&backends.memory) {
            self.register(tool);
        }

        info!(
            "Registered memory tools (registry now has {} tools)",
            self.tools.len()
        );
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tool_count", &self.tools.len())
            .field("tools", &self.tool_names())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
