// ABOUTME: Integration tests for the model client
// ABOUTME: Covers result interpretation, retry classification, backoff timing and request shaping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{call, plan_response, text_response, tool_calls_response, valid_plan, ScriptedProvider};
use nutribot::errors::{AppError, ErrorCode};
use nutribot::llm::{
    ChatMessage, LlmCapabilities, ModelClient, ModelResult, RetryPolicy, StructuredSchema,
};
use nutribot::tools::{ArgumentSchema, ToolDefinition};
use serde_json::json;
use tokio::time::Instant;

fn messages() -> Vec<ChatMessage> {
    vec![ChatMessage::system("coach"), ChatMessage::user("hi")]
}

fn tools() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: "lookup_nutrients".to_owned(),
        description: "lookup".to_owned(),
        parameters: ArgumentSchema::object(),
    }]
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(1000),
        jitter: false,
    }
}

#[tokio::test]
async fn test_tool_calls_are_returned_as_requests() {
    let provider = Arc::new(ScriptedProvider::new(vec![tool_calls_response(vec![
        call("a", "lookup_nutrients", json!({"query": "oats"})),
        call("a", "lookup_nutrients", json!({"query": "rice"})),
    ])]));
    let client = common::model_client(Arc::clone(&provider), RetryPolicy::no_retry());

    let result = client.complete(&messages(), &tools(), None).await.unwrap();

    let ModelResult::ToolCallsRequested { calls, .. } = result else {
        panic!("expected tool calls");
    };
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].call_id, "a");
    assert_ne!(calls[1].call_id, "a");
    assert_eq!(calls[1].arguments["query"], "rice");

    let request = &provider.requests()[0];
    assert_eq!(request.tools.len(), 1);
    assert!(request.response_schema.is_none());
}

#[tokio::test]
async fn test_schema_request_parses_plan_and_omits_tools() {
    let plan = valid_plan();
    let provider = Arc::new(ScriptedProvider::new(vec![plan_response(&plan)]));
    let client = common::model_client(Arc::clone(&provider), RetryPolicy::no_retry());

    let result = client
        .complete(&messages(), &tools(), Some(&StructuredSchema::structured_plan()))
        .await
        .unwrap();

    let ModelResult::FinalAnswer { plan: parsed, .. } = result else {
        panic!("expected final answer");
    };
    assert_eq!(parsed, Some(plan));

    let request = &provider.requests()[0];
    assert!(request.tools.is_empty());
    assert_eq!(
        request.response_schema.as_ref().map(|s| s.name.as_str()),
        Some("structured_plan")
    );
}

#[tokio::test]
async fn test_free_text_answer_has_no_plan() {
    let provider = Arc::new(ScriptedProvider::new(vec![text_response("Eat more fiber.")]));
    let client = common::model_client(provider, RetryPolicy::no_retry());

    let result = client.complete(&messages(), &tools(), None).await.unwrap();
    assert_eq!(
        result,
        ModelResult::FinalAnswer {
            content: "Eat more fiber.".to_owned(),
            plan: None
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried_with_backoff() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        Err(AppError::external_unavailable("LLM API", "HTTP 503")),
        Err(AppError::external_rate_limited("LLM API", "slow down")),
        text_response("Recovered."),
    ]));
    let client = common::model_client(Arc::clone(&provider), fast_retry(3));
    let start = Instant::now();

    let result = client.complete(&messages(), &tools(), None).await.unwrap();

    assert!(matches!(result, ModelResult::FinalAnswer { .. }));
    assert_eq!(provider.call_count(), 3);
    // 100ms after the first failure, 200ms after the second
    assert_eq!(start.elapsed(), Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_structured_output_is_retried() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response(r#"{"summary": "missing everything else"}"#),
        plan_response(&valid_plan()),
    ]));
    let client = common::model_client(Arc::clone(&provider), fast_retry(2));

    let result = client
        .complete(&messages(), &[], Some(&StructuredSchema::structured_plan()))
        .await
        .unwrap();

    assert!(matches!(result, ModelResult::FinalAnswer { plan: Some(_), .. }));
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_malformed_plan_retried_even_without_retry_budget() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response(r#"{"summary": "half a plan"}"#),
        plan_response(&valid_plan()),
    ]));
    let client = common::model_client(Arc::clone(&provider), RetryPolicy::no_retry());

    let result = client
        .complete(&messages(), &[], Some(&StructuredSchema::structured_plan()))
        .await
        .unwrap();

    assert_eq!(
        result,
        ModelResult::FinalAnswer {
            content: serde_json::to_string(&valid_plan()).unwrap(),
            plan: Some(valid_plan()),
        }
    );
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_repeated_malformed_plan_gives_up_after_second_attempt() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("not json"),
        text_response(r#"{"summary": "still partial"}"#),
        plan_response(&valid_plan()),
    ]));
    let client = common::model_client(Arc::clone(&provider), RetryPolicy::no_retry());

    let err = client
        .complete(&messages(), &[], Some(&StructuredSchema::structured_plan()))
        .await
        .unwrap_err();

    assert!(err.is_provider_unavailable());
    assert_eq!(err.details["attempts"], 2);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_tool_round_call_keeps_single_attempt() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("   "),
        text_response("never reached"),
    ]));
    let client = common::model_client(Arc::clone(&provider), RetryPolicy::no_retry());

    let err = client.complete(&messages(), &tools(), None).await.unwrap_err();

    assert!(err.is_provider_unavailable());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_become_provider_unavailable() {
    let provider = Arc::new(ScriptedProvider::failing(ErrorCode::ExternalServiceError, 5));
    let client = common::model_client(Arc::clone(&provider), fast_retry(3));

    let err = client.complete(&messages(), &tools(), None).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::ProviderUnavailable);
    assert_eq!(err.details["attempts"], 3);
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let provider = Arc::new(ScriptedProvider::failing(ErrorCode::ExternalAuthFailed, 5));
    let client = common::model_client(Arc::clone(&provider), fast_retry(5));

    let err = client.complete(&messages(), &tools(), None).await.unwrap_err();

    assert!(err.is_provider_unavailable());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_hung_provider_times_out_and_retries() {
    struct Hung;

    #[async_trait::async_trait]
    impl nutribot::llm::LlmProvider for Hung {
        fn name(&self) -> &'static str {
            "hung"
        }
        fn display_name(&self) -> &'static str {
            "Hung"
        }
        fn capabilities(&self) -> LlmCapabilities {
            LlmCapabilities::full_featured()
        }
        fn default_model(&self) -> &str {
            "hung"
        }
        async fn complete(
            &self,
            _request: &nutribot::llm::ChatRequest,
        ) -> nutribot::errors::AppResult<nutribot::llm::ChatResponseWithTools> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(AppError::internal("unreachable"))
        }
        async fn health_check(&self) -> nutribot::errors::AppResult<bool> {
            Ok(true)
        }
    }

    let client = ModelClient::new(Arc::new(Hung), common::open_limiter())
        .with_retry(fast_retry(2))
        .with_timeout(Duration::from_secs(5));
    let start = Instant::now();

    let err = client.complete(&messages(), &[], None).await.unwrap_err();

    assert!(err.is_provider_unavailable());
    assert_eq!(err.details["last_error_code"], json!(ErrorCode::RequestTimeout));
    assert_eq!(start.elapsed(), Duration::from_millis(10_100));
}

#[tokio::test]
async fn test_provider_without_function_calling_gets_no_tools() {
    let provider = Arc::new(
        ScriptedProvider::new(vec![text_response("ok")])
            .with_capabilities(LlmCapabilities::SYSTEM_MESSAGES),
    );
    let client = common::model_client(Arc::clone(&provider), RetryPolicy::no_retry());

    client.complete(&messages(), &tools(), None).await.unwrap();

    assert!(provider.requests()[0].tools.is_empty());
}
