// ABOUTME: User profile supplied by the caller for personalization
// ABOUTME: Read-only inside the engine; validated against input limits at the service edge
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use crate::constants::input::{MAX_PROFILE_ITEMS, MAX_PROFILE_ITEM_CHARS, MAX_PROFILE_NOTES_CHARS};
use crate::errors::{AppError, AppResult};

/// Goals, preferences and health context for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Nutrition or training goals, most important first
    #[serde(default)]
    pub goals: Vec<String>,
    /// Dietary patterns such as "vegetarian"
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    /// Known allergies
    #[serde(default)]
    pub allergies: Vec<String>,
    /// Current medications
    #[serde(default)]
    pub medications: Vec<String>,
    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl UserProfile {
    /// True when no field carries information
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
            && self.dietary_preferences.is_empty()
            && self.allergies.is_empty()
            && self.medications.is_empty()
            && self.notes().is_none()
    }

    /// First listed goal
    #[must_use]
    pub fn primary_goal(&self) -> Option<&str> {
        self.goals
            .iter()
            .map(|goal| goal.trim())
            .find(|goal| !goal.is_empty())
    }

    /// Non-blank notes
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
    }

    /// Enforce list sizes and text lengths.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` naming the offending field.
    pub fn validate(&self) -> AppResult<()> {
        let lists = [
            ("goals", &self.goals),
            ("dietary_preferences", &self.dietary_preferences),
            ("allergies", &self.allergies),
            ("medications", &self.medications),
        ];
        for (field, items) in lists {
            if items.len() > MAX_PROFILE_ITEMS {
                return Err(AppError::invalid_input(format!(
                    "profile.{field} has {} entries, at most {MAX_PROFILE_ITEMS} allowed",
                    items.len()
                )));
            }
            if items
                .iter()
                .any(|item| item.chars().count() > MAX_PROFILE_ITEM_CHARS)
            {
                return Err(AppError::invalid_input(format!(
                    "profile.{field} entries must be at most {MAX_PROFILE_ITEM_CHARS} characters"
                )));
            }
        }
        if self
            .notes
            .as_ref()
            .is_some_and(|notes| notes.chars().count() > MAX_PROFILE_NOTES_CHARS)
        {
            return Err(AppError::invalid_input(format!(
                "profile.notes must be at most {MAX_PROFILE_NOTES_CHARS} characters"
            )));
        }
        Ok(())
    }
}
