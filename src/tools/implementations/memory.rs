// ABOUTME: User memory tools backed by a MemoryStore.
// ABOUTME: Implements get_user_memory and store_user_memory scoped to the calling user.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::constants::tools::{GET_USER_MEMORY, STORE_USER_MEMORY};
use crate::errors::{AppError, AppResult};
use crate::memory::{MemoryEntry, MemoryStore};
use crate::tools::context::ToolExecutionContext;
use crate::tools::schema::{ArgumentSchema, PropertySchema};
use crate::tools::traits::{CoachTool, ToolCapabilities};

const RECENT_MEMORY_LIMIT: usize = 10;

/// Memories are only ever read or written for the user the run acts for
fn scoped_user<'a>(args: &'a Value, context: &'a ToolExecutionContext) -> AppResult<&'a str> {
    match args.get("user_id").and_then(Value::as_str).map(str::trim) {
        Some(requested) if !requested.is_empty() && requested != context.user_id => Err(
            AppError::invalid_input("memory access is limited to the current user"),
        ),
        _ => Ok(context.user_id.as_str()),
    }
}

fn text_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Read what is remembered about the user
pub struct GetUserMemoryTool {
    store: Arc<dyn MemoryStore>,
}

impl GetUserMemoryTool {
    /// Create the tool over `store`
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CoachTool for GetUserMemoryTool {
    fn name(&self) -> &'static str {
        GET_USER_MEMORY
    }

    fn description(&self) -> &'static str {
        "Retrieve remembered preferences and facts about the current user"
    }

    fn argument_schema(&self) -> ArgumentSchema {
        ArgumentSchema::object().optional(
            "user_id",
            PropertySchema::string("Current user id; defaults to the caller"),
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::USER_MEMORY
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<Value> {
        let user_id = scoped_user(&args, context)?;
        let snapshot = self.store.snapshot(user_id).await?;
        let recent = self.store.recent(user_id, RECENT_MEMORY_LIMIT).await?;
        Ok(json!({
            "user_id": user_id,
            "snapshot": snapshot,
            "recent": recent,
        }))
    }
}

/// Remember a durable fact about the user
pub struct StoreUserMemoryTool {
    store: Arc<dyn MemoryStore>,
}

impl StoreUserMemoryTool {
    /// Create the tool over `store`
    #[must_use]
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CoachTool for StoreUserMemoryTool {
    fn name(&self) -> &'static str {
        STORE_USER_MEMORY
    }

    fn description(&self) -> &'static str {
        "Store a durable preference or fact the user shared, such as a disliked food or a training schedule"
    }

    fn argument_schema(&self) -> ArgumentSchema {
        ArgumentSchema::object()
            .required("key", PropertySchema::string("Short topic, e.g. 'breakfast'"))
            .required("value", PropertySchema::string("What to remember"))
            .optional("reason", PropertySchema::string("Why this is worth remembering"))
            .optional(
                "user_id",
                PropertySchema::string("Current user id; defaults to the caller"),
            )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::WRITES_DATA | ToolCapabilities::USER_MEMORY
    }

    async fn execute(&self, args: Value, context: &ToolExecutionContext) -> AppResult<Value> {
        let user_id = scoped_user(&args, context)?;
        let (Some(key), Some(value)) = (text_arg(&args, "key"), text_arg(&args, "value")) else {
            return Ok(json!({ "status": "skipped", "reason": "key and value are required" }));
        };

        let reason = text_arg(&args, "reason").map(str::to_owned);
        self.store
            .add(user_id, MemoryEntry::new(key, value, reason))
            .await?;
        Ok(json!({ "status": "stored", "key": key }))
    }
}

/// Create all memory tools over a shared store
#[must_use]
pub fn create_memory_tools(store: &Arc<dyn MemoryStore>) -> Vec<Arc<dyn CoachTool>> {
    vec![
        Arc::new(GetUserMemoryTool::new(Arc::clone(store))),
        Arc::new(StoreUserMemoryTool::new(Arc::clone(store))),
    ]
}
