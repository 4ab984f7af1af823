// ABOUTME: System prompts for LLM interactions loaded at compile time
// ABOUTME: Provides the coach system prompt and the user profile context block
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.

use crate::models::UserProfile;

/// Nutrition coach system prompt
pub const COACH_SYSTEM_PROMPT: &str = include_str!("coach_system.md");

/// Get the system prompt for the nutrition coach
#[must_use]
pub const fn get_coach_system_prompt() -> &'static str {
    COACH_SYSTEM_PROMPT
}

/// Render the profile as a delimited context block, or `None` when it is empty.
///
/// The delimiters let the system prompt refer to profile data as data.
#[must_use]
pub fn build_profile_context(profile: &UserProfile) -> Option<String> {
    let mut lines = Vec::new();
    let lists = [
        ("Goals", &profile.goals),
        ("Dietary preferences", &profile.dietary_preferences),
        ("Allergies", &profile.allergies),
        ("Medications", &profile.medications),
    ];
    for (label, items) in lists {
        let items: Vec<&str> = items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .collect();
        if !items.is_empty() {
            lines.push(format!("{label}: {}", items.join(", ")));
        }
    }
    if let Some(notes) = profile.notes() {
        lines.push(format!("Notes: {notes}"));
    }

    if lines.is_empty() {
        None
    } else {
        Some(format!(
            "<user_profile>\n{}\n</user_profile>",
            lines.join("\n")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_context_skips_empty_fields() {
        let profile = UserProfile {
            goals: vec!["build muscle".to_owned()],
            allergies: vec!["peanuts".to_owned(), " ".to_owned()],
            notes: Some("  ".to_owned()),
            ..UserProfile::default()
        };
        let block = build_profile_context(&profile).unwrap_or_default();
        assert_eq!(
            block,
            "<user_profile>\nGoals: build muscle\nAllergies: peanuts\n</user_profile>"
        );
        assert!(build_profile_context(&UserProfile::default()).is_none());
    }
}
