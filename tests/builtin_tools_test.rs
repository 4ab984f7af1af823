// ABOUTME: Integration tests for the built-in nutrition and memory tools
// ABOUTME: Runs the tools through the registry against the offline nutrient source
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::sync::Arc;

use nutribot::constants::tools::{
    ESTIMATE_MEAL_NUTRITION, GET_USER_MEMORY, LOOKUP_NUTRIENTS, STORE_USER_MEMORY,
};
use nutribot::external::MockUsdaClient;
use nutribot::memory::{InMemoryMemoryStore, MemoryStore};
use nutribot::tools::{ToolBackends, ToolCallRequest, ToolExecutionContext, ToolRegistry};
use serde_json::json;

fn builtin_registry(memory: Arc<InMemoryMemoryStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register_builtin_tools(&ToolBackends::new(Arc::new(MockUsdaClient::new()), memory));
    registry
}

#[test]
fn test_builtin_tools_registered_in_order() {
    let registry = builtin_registry(Arc::new(InMemoryMemoryStore::new()));
    assert_eq!(
        registry.tool_names(),
        [
            LOOKUP_NUTRIENTS,
            ESTIMATE_MEAL_NUTRITION,
            GET_USER_MEMORY,
            STORE_USER_MEMORY
        ]
    );
}

#[tokio::test]
async fn test_lookup_nutrients_reports_chicken_protein() {
    let registry = builtin_registry(Arc::new(InMemoryMemoryStore::new()));
    let result = registry
        .execute(
            &ToolCallRequest::new("c1", LOOKUP_NUTRIENTS, json!({"query": "chicken breast"})),
            &ToolExecutionContext::new("u1"),
        )
        .await;

    assert!(result.success, "{}", result.payload);
    let food = &result.payload["foods"][0];
    assert_eq!(food["fdc_id"], 171_477);
    assert_eq!(food["protein_g"], 31.02);
    assert_eq!(result.payload["source"], "usda_fdc_mock");
}

#[tokio::test]
async fn test_lookup_requires_query() {
    let registry = builtin_registry(Arc::new(InMemoryMemoryStore::new()));
    let result = registry
        .execute(
            &ToolCallRequest::new("c1", LOOKUP_NUTRIENTS, json!({"limit": 2})),
            &ToolExecutionContext::new("u1"),
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.payload["error_kind"], "invalid_arguments");
}

#[tokio::test]
async fn test_meal_estimate_totals_and_unmatched_items() {
    let registry = builtin_registry(Arc::new(InMemoryMemoryStore::new()));
    let result = registry
        .execute(
            &ToolCallRequest::new(
                "c1",
                ESTIMATE_MEAL_NUTRITION,
                json!({"food_items": ["chicken breast", "apples", "dragonfruit"]}),
            ),
            &ToolExecutionContext::new("u1"),
        )
        .await;

    assert!(result.success, "{}", result.payload);
    let totals = &result.payload["totals"];
    assert_eq!(totals["calories"], 217.0);
    assert_eq!(totals["protein_g"], 31.28);
    assert_eq!(result.payload["unmatched_items"], json!(["dragonfruit"]));
}

#[tokio::test]
async fn test_memory_round_trip_is_scoped_to_caller() {
    let memory = Arc::new(InMemoryMemoryStore::new());
    let registry = builtin_registry(Arc::clone(&memory));
    let context = ToolExecutionContext::new("u1");

    let stored = registry
        .execute(
            &ToolCallRequest::new(
                "c1",
                STORE_USER_MEMORY,
                json!({"key": "breakfast", "value": "oats with berries", "reason": "usual meal"}),
            ),
            &context,
        )
        .await;
    assert_eq!(stored.payload["status"], "stored");

    let fetched = registry
        .execute(&ToolCallRequest::new("c2", GET_USER_MEMORY, json!({})), &context)
        .await;
    assert_eq!(fetched.payload["snapshot"]["breakfast"], "oats with berries");

    let foreign = registry
        .execute(
            &ToolCallRequest::new("c3", GET_USER_MEMORY, json!({"user_id": "u2"})),
            &context,
        )
        .await;
    assert!(!foreign.success);

    assert!(memory.snapshot("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_memory_is_skipped() {
    let memory = Arc::new(InMemoryMemoryStore::new());
    let registry = builtin_registry(Arc::clone(&memory));

    let result = registry
        .execute(
            &ToolCallRequest::new("c1", STORE_USER_MEMORY, json!({"key": "  ", "value": "x"})),
            &ToolExecutionContext::new("u1"),
        )
        .await;

    assert!(result.success);
    assert_eq!(result.payload["status"], "skipped");
    assert!(memory.recent("u1", 10).await.unwrap().is_empty());
}
