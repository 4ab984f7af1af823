// ABOUTME: Structured coaching plan returned by every orchestration run
// ABOUTME: Strict parsing, value validation and the JSON schema sent to the model provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::input::MAX_PLAN_PRIORITIES;
use crate::errors::{AppError, AppResult};

/// One prioritized action in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanPriority {
    /// Short label
    pub title: String,
    /// What to do
    pub action: String,
    /// Why it matters for this user
    #[serde(alias = "why_it_matters")]
    pub rationale: String,
    /// When or how often
    pub timeframe: String,
}

/// The terminal output of a coaching run.
///
/// Every field is required on input and unknown fields are rejected, so a
/// partially generated document never reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredPlan {
    /// Plain-language answer to the user's message
    pub summary: String,
    /// Up to three prioritized actions
    pub priorities: Vec<PlanPriority>,
    /// Meal-level suggestions
    pub meal_focus: Vec<String>,
    /// Optional supplements worth discussing
    pub supplement_options: Vec<String>,
    /// Interactions, allergies and risks to watch
    pub safety_watchouts: Vec<String>,
    /// Questions that would improve the next answer
    pub follow_up_questions: Vec<String>,
    /// Medical disclaimer
    pub disclaimer: String,
}

impl StructuredPlan {
    /// Parse model output and enforce every plan invariant.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` when the text is not valid JSON, has missing or
    /// unknown fields, or violates a value constraint.
    pub fn parse_strict(raw: &str) -> AppResult<Self> {
        let plan: Self = serde_json::from_str(raw.trim()).map_err(|e| {
            AppError::invalid_format(format!("structured plan does not match schema: {e}"))
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Check value invariants that the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` naming the first violated constraint.
    pub fn validate(&self) -> AppResult<()> {
        if self.summary.trim().is_empty() {
            return Err(AppError::invalid_format("plan summary must not be empty"));
        }
        if self.disclaimer.trim().is_empty() {
            return Err(AppError::invalid_format("plan disclaimer must not be empty"));
        }
        if self.priorities.len() > MAX_PLAN_PRIORITIES {
            return Err(AppError::invalid_format(format!(
                "plan has {} priorities, at most {MAX_PLAN_PRIORITIES} allowed",
                self.priorities.len()
            )));
        }
        for (index, priority) in self.priorities.iter().enumerate() {
            let fields = [
                ("title", &priority.title),
                ("action", &priority.action),
                ("rationale", &priority.rationale),
                ("timeframe", &priority.timeframe),
            ];
            if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
                return Err(AppError::invalid_format(format!(
                    "priority {index} has an empty {name}"
                )));
            }
        }
        Ok(())
    }

    /// JSON schema used for strict structured output on the provider side
    #[must_use]
    pub fn json_schema() -> Value {
        let string_list = json!({ "type": "array", "items": { "type": "string" } });
        json!({
            "type": "object",
            "additionalProperties": false,
            "required": [
                "summary",
                "priorities",
                "meal_focus",
                "supplement_options",
                "safety_watchouts",
                "follow_up_questions",
                "disclaimer"
            ],
            "properties": {
                "summary": { "type": "string" },
                "priorities": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "required": ["title", "action", "rationale", "timeframe"],
                        "properties": {
                            "title": { "type": "string" },
                            "action": { "type": "string" },
                            "rationale": { "type": "string" },
                            "timeframe": { "type": "string" }
                        }
                    }
                },
                "meal_focus": string_list,
                "supplement_options": string_list,
                "safety_watchouts": string_list,
                "follow_up_questions": string_list,
                "disclaimer": { "type": "string" }
            }
        })
    }

    /// Render the plan as the assistant message stored in conversation history
    #[must_use]
    pub fn to_assistant_text(&self) -> String {
        let mut text = self.summary.trim().to_owned();
        if !self.priorities.is_empty() {
            text.push_str("\n\nPriorities:");
            for priority in &self.priorities {
                let _ = write!(text, "\n- {}: {}", priority.title, priority.action);
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StructuredPlan {
        StructuredPlan {
            summary: "Chicken breast is a lean protein source.".to_owned(),
            priorities: vec![PlanPriority {
                title: "Protein anchor".to_owned(),
                action: "Add a palm of chicken to lunch".to_owned(),
                rationale: "Supports satiety".to_owned(),
                timeframe: "Daily".to_owned(),
            }],
            meal_focus: vec![],
            supplement_options: vec![],
            safety_watchouts: vec![],
            follow_up_questions: vec![],
            disclaimer: "General education only, not medical advice.".to_owned(),
        }
    }

    #[test]
    fn test_rejects_blank_priority_field() {
        let mut plan = sample();
        plan.priorities[0].timeframe = "  ".to_owned();
        let err = plan.validate().unwrap_err();
        assert!(err.message.contains("timeframe"));
    }

    #[test]
    fn test_assistant_text_lists_priorities() {
        let text = sample().to_assistant_text();
        assert!(text.starts_with("Chicken breast"));
        assert!(text.contains("- Protein anchor: Add a palm of chicken to lunch"));
    }

    #[test]
    fn test_accepts_why_it_matters_alias() {
        let raw = r#"{"summary":"s","priorities":[{"title":"t","action":"a","why_it_matters":"w","timeframe":"f"}],
            "meal_focus":[],"supplement_options":[],"safety_watchouts":[],"follow_up_questions":[],"disclaimer":"d"}"#;
        let plan = StructuredPlan::parse_strict(raw).unwrap();
        assert_eq!(plan.priorities[0].rationale, "w");
    }
}
