// ABOUTME: Pluggable tool architecture for the coach orchestration loop.
// ABOUTME: Tools are registered once at startup and executed through the ToolRegistry.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Coach Tools
//!
//! - `traits`: the `CoachTool` trait and capability flags
//! - `schema`: typed argument schemas and their validation
//! - `registry`: registration, discovery and audited execution
//! - `implementations`: built-in nutrition and memory tools

/// Tool execution context
pub mod context;
/// Built-in tool implementations
pub mod implementations;
/// Tool registry
pub mod registry;
/// Call requests, results and audit events
pub mod result;
/// Argument schemas
pub mod schema;
/// Tool trait and capabilities
pub mod traits;

pub use context::ToolExecutionContext;
pub use implementations::ToolBackends;
pub use registry::ToolRegistry;
pub use result::{ToolAuditEvent, ToolCallRequest, ToolCallResult};
pub use schema::{ArgumentSchema, PropertySchema, PropertyType, ToolDefinition};
pub use traits::{CoachTool, ToolCapabilities};
