// ABOUTME: Deterministic coaching plan used when the model provider is unavailable
// ABOUTME: Personalizes a fixed template from the profile without any I/O
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Fallback Generator
//!
//! Produces a schema-valid [`StructuredPlan`] from the conversation history and
//! profile alone. The same inputs always give the same plan.
//!
//! Template adjustments:
//! - weight or fat-loss goals swap the first priority for a satiety habit
//! - muscle, strength or performance goals spread protein across the day
//! - preferences, allergies, medications and notes each add one line
//! - a history without any user message yields the onboarding variant

use crate::models::{ConversationTurn, PlanPriority, StructuredPlan, TurnRole, UserProfile};

/// Goal used when the profile names none
const DEFAULT_GOAL: &str = "better daily nutrition consistency";

/// Disclaimer attached to every fallback plan
pub const FALLBACK_DISCLAIMER: &str = "General education only, not medical advice.";

/// Preferences quoted in the meal focus line
const MAX_PREFERENCES_QUOTED: usize = 3;

/// Allergies quoted in the label-check watch-out
const MAX_ALLERGIES_QUOTED: usize = 4;

/// Builds plans without the model
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackGenerator;

impl FallbackGenerator {
    /// Create a generator
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Build the fallback plan for `history` and `profile`
    #[must_use]
    pub fn generate(&self, history: &[ConversationTurn], profile: &UserProfile) -> StructuredPlan {
        let goal = profile.primary_goal().unwrap_or(DEFAULT_GOAL);
        let goal_lower = goal.to_lowercase();
        let has_user_message = history
            .iter()
            .any(|turn| turn.role == TurnRole::User && turn.text().is_some());

        let mut priorities = base_priorities();
        let mut meal_focus = vec![
            "Aim for 25-40g protein per meal based on your appetite and schedule.".to_owned(),
            "Add one high-fiber item each meal (vegetables, fruit, oats, beans, or seeds)."
                .to_owned(),
            "Keep one easy backup meal ready for busy days to avoid plan drift.".to_owned(),
        ];
        let mut supplement_options = vec![
            "Creatine monohydrate can be considered for performance goals (3-5g daily).".to_owned(),
            "Vitamin D or omega-3 may be worth discussing if intake or sun exposure is low."
                .to_owned(),
        ];

        if goal_lower.contains("weight") || goal_lower.contains("fat") {
            priorities[0] = priority(
                "Satiety first",
                "Start each meal with protein and vegetables before starch-heavy foods.",
                "This pattern can reduce overeating without aggressive restriction.",
                "today",
            );
            meal_focus[0] =
                "Build meals around protein and fiber first, then add carbs based on hunger."
                    .to_owned();
        }

        if ["muscle", "strength", "performance"]
            .iter()
            .any(|keyword| goal_lower.contains(keyword))
        {
            meal_focus[0] =
                "Spread protein across 3-4 feedings during the day to support recovery."
                    .to_owned();
            supplement_options[0] =
                "Creatine monohydrate is a common evidence-based option for strength output."
                    .to_owned();
        }

        if !profile.dietary_preferences.is_empty() {
            let quoted = quote(&profile.dietary_preferences, MAX_PREFERENCES_QUOTED);
            meal_focus.push(format!(
                "Keep every food choice aligned with your preference pattern: {quoted}."
            ));
        }

        let mut safety_watchouts = vec![
            "Avoid changing several supplements at once; adjust one variable at a time.".to_owned(),
        ];
        if !profile.allergies.is_empty() {
            let quoted = quote(&profile.allergies, MAX_ALLERGIES_QUOTED);
            safety_watchouts.push(format!("Double-check ingredient labels for: {quoted}."));
        }
        if !profile.medications.is_empty() {
            safety_watchouts.push(
                "Because medications are involved, confirm supplement compatibility with your \
                 clinician or pharmacist."
                    .to_owned(),
            );
        }

        let (mut summary, follow_up_questions) = if has_user_message {
            (
                format!(
                    "Based on your check-in, focus on {goal} with simple actions you can execute today."
                ),
                vec![
                    "What does your usual breakfast, lunch and dinner look like right now?"
                        .to_owned(),
                    "Would you prefer a budget-friendly, convenience-first, or performance-first plan?"
                        .to_owned(),
                ],
            )
        } else {
            (
                format!(
                    "Welcome! A good starting point is {goal} with consistent meals, clear \
                     protein targets, and safety-aware changes."
                ),
                vec![
                    "What is the one nutrition change you most want to make this month?".to_owned(),
                    "How many meals do you usually eat on a typical day?".to_owned(),
                ],
            )
        };
        if profile.notes().is_some() {
            summary.push_str(" I also considered your saved notes.");
        }

        StructuredPlan {
            summary,
            priorities,
            meal_focus,
            supplement_options,
            safety_watchouts,
            follow_up_questions,
            disclaimer: FALLBACK_DISCLAIMER.to_owned(),
        }
    }
}

fn base_priorities() -> Vec<PlanPriority> {
    vec![
        priority(
            "Protein anchor",
            "Add a clear protein source to your next two meals.",
            "Consistent protein makes energy, recovery, and satiety easier to manage.",
            "today",
        ),
        priority(
            "Plate balance",
            "Fill half the plate with vegetables, a quarter with protein and a quarter with carbs for at least one meal.",
            "Balanced meals usually improve micronutrient intake and appetite control.",
            "next meal",
        ),
        priority(
            "Hydration baseline",
            "Set two water reminders and pair each with a meal.",
            "Hydration affects hunger, training quality, and recovery.",
            "today",
        ),
    ]
}

fn priority(title: &str, action: &str, rationale: &str, timeframe: &str) -> PlanPriority {
    PlanPriority {
        title: title.to_owned(),
        action: action.to_owned(),
        rationale: rationale.to_owned(),
        timeframe: timeframe.to_owned(),
    }
}

fn quote(items: &[String], max: usize) -> String {
    items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .take(max)
        .collect::<Vec<_>>()
        .join(", ")
}
