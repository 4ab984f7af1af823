// ABOUTME: Integration tests for structured plan parsing and the provider JSON schema
// ABOUTME: Rejects partial, unknown or out-of-range plans before they reach a caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use nutribot::errors::ErrorCode;
use nutribot::llm::StructuredSchema;
use nutribot::models::StructuredPlan;
use serde_json::{json, Value};

fn plan_json() -> Value {
    json!({
        "summary": "Chicken breast has about 31g protein per 100g.",
        "priorities": [{
            "title": "Protein anchor",
            "action": "Add chicken to lunch",
            "rationale": "Keeps you full",
            "timeframe": "daily"
        }],
        "meal_focus": ["Lean protein at lunch"],
        "supplement_options": [],
        "safety_watchouts": [],
        "follow_up_questions": ["How often do you cook?"],
        "disclaimer": "General education only, not medical advice."
    })
}

#[test]
fn test_parses_complete_plan() {
    let plan = StructuredPlan::parse_strict(&plan_json().to_string()).unwrap();
    assert_eq!(plan.priorities[0].title, "Protein anchor");
    assert_eq!(plan.follow_up_questions.len(), 1);
}

#[test]
fn test_tolerates_surrounding_whitespace() {
    let raw = format!("\n  {}  \n", plan_json());
    assert!(StructuredPlan::parse_strict(&raw).is_ok());
}

#[test]
fn test_rejects_unknown_field() {
    let mut value = plan_json();
    value["mood"] = json!("great");
    let err = StructuredPlan::parse_strict(&value.to_string()).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidFormat);
}

#[test]
fn test_rejects_missing_field() {
    let mut value = plan_json();
    value.as_object_mut().unwrap().remove("disclaimer");
    assert!(StructuredPlan::parse_strict(&value.to_string()).is_err());
}

#[test]
fn test_rejects_prose_and_markdown_fences() {
    assert!(StructuredPlan::parse_strict("Eat more protein.").is_err());
    let fenced = format!("```json\n{}\n```", plan_json());
    assert!(StructuredPlan::parse_strict(&fenced).is_err());
}

#[test]
fn test_rejects_too_many_priorities() {
    let mut value = plan_json();
    let priority = value["priorities"][0].clone();
    value["priorities"] = json!([priority.clone(), priority.clone(), priority.clone(), priority]);
    let err = StructuredPlan::parse_strict(&value.to_string()).unwrap_err();
    assert!(err.message.contains("priorities"));
}

#[test]
fn test_rejects_blank_summary() {
    let mut value = plan_json();
    value["summary"] = json!("   ");
    assert!(StructuredPlan::parse_strict(&value.to_string()).is_err());
}

#[test]
fn test_schema_requires_every_field() {
    let schema = StructuredSchema::structured_plan();
    assert_eq!(schema.name, "structured_plan");
    assert_eq!(schema.schema["additionalProperties"], false);

    let required: Vec<&str> = schema.schema["required"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    let fields: Vec<String> = plan_json().as_object().unwrap().keys().cloned().collect();
    assert_eq!(required.len(), fields.len());
    for field in &fields {
        assert!(required.contains(&field.as_str()), "{field} not required");
    }
}
