// ABOUTME: Integration tests for the chat service flow
// ABOUTME: Covers input validation, conversation ownership, history loading and persistence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use common::{call, plan_response, tool_calls_response, valid_plan, EchoTool, ScriptedProvider};
use nutribot::config::OrchestrationConfig;
use nutribot::errors::{AppResult, ErrorCode};
use nutribot::llm::ChatResponseWithTools;
use nutribot::models::{TurnRole, UserProfile};
use nutribot::services::{
    ChatRequest, ChatService, ConversationStore, InMemoryConversationStore, PlanSource,
};
use nutribot::tools::ToolRegistry;
use serde_json::json;

fn service(
    script: Vec<AppResult<ChatResponseWithTools>>,
    registry: ToolRegistry,
) -> (ChatService, Arc<InMemoryConversationStore>, Arc<ScriptedProvider>) {
    let provider = Arc::new(ScriptedProvider::new(script));
    let engine = common::engine(
        Arc::clone(&provider),
        registry,
        OrchestrationConfig::default(),
    );
    let store = Arc::new(InMemoryConversationStore::new());
    let service = ChatService::new(Arc::new(engine), store.clone());
    (service, store, provider)
}

fn request(message: &str) -> ChatRequest {
    ChatRequest {
        user_id: "u1".to_owned(),
        message: message.to_owned(),
        ..ChatRequest::default()
    }
}

#[tokio::test]
async fn test_new_conversation_persists_turns() {
    let (service, store, _) = service(
        vec![plan_response(&valid_plan())],
        ToolRegistry::new(),
    );

    let response = service.handle_chat(request("  Is oatmeal a good breakfast?  ")).await.unwrap();

    assert_eq!(response.source, PlanSource::Model);
    assert!(!response.degraded);
    assert_eq!(response.plan, valid_plan());

    let turns = store.turns(&response.conversation_id);
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, TurnRole::User);
    assert_eq!(turns[0].text(), Some("Is oatmeal a good breakfast?"));
    assert_eq!(turns[1].role, TurnRole::Assistant);
}

#[tokio::test]
async fn test_follow_up_sees_prior_turns() {
    let (service, store, provider) = service(
        vec![plan_response(&valid_plan()), plan_response(&valid_plan())],
        ToolRegistry::new(),
    );

    let first = service.handle_chat(request("first question")).await.unwrap();
    let second = service
        .handle_chat(ChatRequest {
            conversation_id: Some(first.conversation_id.clone()),
            ..request("second question")
        })
        .await
        .unwrap();

    assert_eq!(second.conversation_id, first.conversation_id);
    assert_eq!(store.turns(&first.conversation_id).len(), 4);

    let contents: Vec<String> = provider.requests()[1]
        .messages
        .iter()
        .filter_map(|m| m.content.clone())
        .collect();
    assert!(contents.iter().any(|c| c == "first question"));
    assert_eq!(contents.last().map(String::as_str), Some("second question"));
}

#[tokio::test]
async fn test_tool_events_are_recorded() {
    let registry = common::registry_with(vec![Arc::new(EchoTool::new("echo"))]);
    let (service, store, _) = service(
        vec![
            tool_calls_response(vec![call("c1", "echo", json!({"value": "x"}))]),
            plan_response(&valid_plan()),
        ],
        registry,
    );

    let response = service.handle_chat(request("use a tool")).await.unwrap();

    let events = store.tool_events(&response.conversation_id);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].call_id, "c1");
    // user, assistant tool call, tool result, final plan
    assert_eq!(store.turns(&response.conversation_id).len(), 4);
}

#[tokio::test]
async fn test_degraded_response_is_still_persisted() {
    let (service, store, _) = service(Vec::new(), ToolRegistry::new());

    let response = service.handle_chat(request("hello")).await.unwrap();

    assert!(response.degraded);
    assert_eq!(response.source, PlanSource::Fallback);
    assert_eq!(store.turns(&response.conversation_id).len(), 2);
}

#[tokio::test]
async fn test_rejects_invalid_input() {
    let (service, _, provider) = service(Vec::new(), ToolRegistry::new());

    let err = service.handle_chat(request("   ")).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = service
        .handle_chat(request(&"a".repeat(4001)))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = service
        .handle_chat(ChatRequest {
            user_id: " ".to_owned(),
            ..request("hello")
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = service
        .handle_chat(ChatRequest {
            profile: UserProfile {
                goals: vec!["goal".to_owned(); 21],
                ..UserProfile::default()
            },
            ..request("hello")
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_message_at_length_limit_is_accepted() {
    let (service, _, _) = service(vec![plan_response(&valid_plan())], ToolRegistry::new());
    assert!(service.handle_chat(request(&"a".repeat(4000))).await.is_ok());
}

#[tokio::test]
async fn test_foreign_conversation_is_not_found() {
    let (service, store, provider) = service(Vec::new(), ToolRegistry::new());
    let owned = store.create_conversation("someone-else").await.unwrap();

    let err = service
        .handle_chat(ChatRequest {
            conversation_id: Some(owned.clone()),
            ..request("hello")
        })
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert!(store.turns(&owned).is_empty());
    assert_eq!(provider.call_count(), 0);

    let err = service
        .handle_chat(ChatRequest {
            conversation_id: Some("missing".to_owned()),
            ..request("hello")
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
