// ABOUTME: Crisis language screen run before any model call
// ABOUTME: Produces the fixed lifeline plan that short-circuits orchestration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::models::StructuredPlan;

/// Phrases that route a message to the crisis response, matched case-insensitively
const CRISIS_PHRASES: &[&str] = &[
    "kill myself",
    "suicide",
    "suicidal",
    "self-harm",
    "self harm",
    "end my life",
    "want to die",
    "don't want to live",
    "dont want to live",
    "better off dead",
    "no reason to live",
];

/// Disclaimer attached to the crisis plan
pub const CRISIS_DISCLAIMER: &str =
    "If you are in crisis, please contact 988 or your local emergency services.";

/// Whether `message` contains crisis language
#[must_use]
pub fn detect_crisis(message: &str) -> bool {
    let lower = message.to_lowercase();
    CRISIS_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Fixed response pointing the user to the 988 lifeline
#[must_use]
pub fn crisis_plan() -> StructuredPlan {
    StructuredPlan {
        summary: "I hear you, and what you are feeling matters. Please reach out to the 988 \
                  Suicide & Crisis Lifeline: call or text 988, any time of day. Talking to \
                  someone you trust can help too. Nutrition can wait; connecting with someone \
                  who can support you right now comes first."
            .to_owned(),
        priorities: Vec::new(),
        meal_focus: Vec::new(),
        supplement_options: Vec::new(),
        safety_watchouts: Vec::new(),
        follow_up_questions: Vec::new(),
        disclaimer: CRISIS_DISCLAIMER.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_phrases_case_insensitively() {
        assert!(detect_crisis("Some days I feel SUICIDAL"));
        assert!(detect_crisis("honestly i dont want to live like this"));
        assert!(detect_crisis("Everyone would be Better Off Dead without me"));
    }

    #[test]
    fn test_ordinary_messages_pass() {
        assert!(!detect_crisis("How much protein is in chicken breast?"));
        assert!(!detect_crisis("I'm feeling tired lately"));
    }

    #[test]
    fn test_crisis_plan_is_valid() {
        let plan = crisis_plan();
        assert!(plan.validate().is_ok());
        assert!(plan.summary.contains("988"));
        assert!(plan.priorities.is_empty());
    }
}
