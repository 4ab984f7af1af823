// ABOUTME: Integration tests for the deterministic fallback plan
// ABOUTME: Checks goal variants, profile personalization, onboarding and schema validity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use nutribot::models::{ConversationTurn, StructuredPlan, UserProfile};
use nutribot::services::fallback::FALLBACK_DISCLAIMER;
use nutribot::services::FallbackGenerator;

fn checked_in() -> Vec<ConversationTurn> {
    vec![ConversationTurn::user("What should I eat after training?")]
}

fn profile_with_goal(goal: &str) -> UserProfile {
    UserProfile {
        goals: vec![goal.to_owned()],
        ..UserProfile::default()
    }
}

#[test]
fn test_same_inputs_give_same_plan() {
    let generator = FallbackGenerator::new();
    let profile = UserProfile {
        goals: vec!["build muscle".to_owned()],
        allergies: vec!["shellfish".to_owned()],
        notes: Some("Vegetarian on weekdays".to_owned()),
        ..UserProfile::default()
    };

    let first = generator.generate(&checked_in(), &profile);
    let second = generator.generate(&checked_in(), &profile);

    assert_eq!(first, second);
}

#[test]
fn test_default_plan_is_schema_valid() {
    let plan = FallbackGenerator::new().generate(&checked_in(), &UserProfile::default());

    plan.validate().unwrap();
    let reparsed = StructuredPlan::parse_strict(&serde_json::to_string(&plan).unwrap()).unwrap();
    assert_eq!(reparsed, plan);
    assert_eq!(plan.priorities.len(), 3);
    assert_eq!(plan.priorities[0].title, "Protein anchor");
    assert_eq!(plan.disclaimer, FALLBACK_DISCLAIMER);
    assert!(plan
        .summary
        .contains("better daily nutrition consistency"));
}

#[test]
fn test_weight_goal_leads_with_satiety() {
    let plan = FallbackGenerator::new().generate(&checked_in(), &profile_with_goal("Lose weight"));

    assert_eq!(plan.priorities[0].title, "Satiety first");
    assert!(plan.meal_focus[0].starts_with("Build meals around protein and fiber"));
    assert!(plan.summary.contains("Lose weight"));
}

#[test]
fn test_strength_goal_spreads_protein() {
    let plan =
        FallbackGenerator::new().generate(&checked_in(), &profile_with_goal("Strength training"));

    assert_eq!(plan.priorities[0].title, "Protein anchor");
    assert!(plan.meal_focus[0].contains("3-4 feedings"));
    assert!(plan.supplement_options[0].contains("strength output"));
}

#[test]
fn test_profile_lists_are_quoted_with_caps() {
    let profile = UserProfile {
        dietary_preferences: vec![
            "vegetarian".to_owned(),
            "low sodium".to_owned(),
            "  ".to_owned(),
            "high fiber".to_owned(),
            "halal".to_owned(),
        ],
        allergies: vec![
            "peanuts".to_owned(),
            "soy".to_owned(),
            "egg".to_owned(),
            "milk".to_owned(),
            "sesame".to_owned(),
        ],
        medications: vec!["metformin".to_owned()],
        ..UserProfile::default()
    };

    let plan = FallbackGenerator::new().generate(&checked_in(), &profile);

    let preference_line = plan.meal_focus.last().unwrap();
    assert!(preference_line.ends_with("vegetarian, low sodium, high fiber."));
    assert!(!preference_line.contains("halal"));

    assert_eq!(
        plan.safety_watchouts[1],
        "Double-check ingredient labels for: peanuts, soy, egg, milk."
    );
    assert!(plan.safety_watchouts[2].contains("clinician or pharmacist"));
}

#[test]
fn test_notes_are_acknowledged() {
    let profile = UserProfile {
        notes: Some("Night shifts".to_owned()),
        ..UserProfile::default()
    };

    let plan = FallbackGenerator::new().generate(&checked_in(), &profile);

    assert!(plan.summary.ends_with(" I also considered your saved notes."));
}

#[test]
fn test_empty_history_gets_onboarding_variant() {
    let plan = FallbackGenerator::new().generate(&[], &UserProfile::default());

    assert!(plan.summary.starts_with("Welcome!"));
    assert_eq!(
        plan.follow_up_questions[0],
        "What is the one nutrition change you most want to make this month?"
    );

    let assistant_only = vec![ConversationTurn::assistant("Hello there")];
    let plan = FallbackGenerator::new().generate(&assistant_only, &UserProfile::default());
    assert!(plan.summary.starts_with("Welcome!"));
}
