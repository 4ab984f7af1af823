// ABOUTME: Nutrition tools backed by a NutrientSource.
// ABOUTME: Implements lookup_nutrients and estimate_meal_nutrition.
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Nutrition Tools
//!
//! - `LookupNutrientsTool` - Search foods and report macros per 100 g
//! - `EstimateMealNutritionTool` - Sum the top match of each listed food

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::constants::tools::{ESTIMATE_MEAL_NUTRITION, LOOKUP_NUTRIENTS};
use crate::errors::{AppError, AppResult};
use crate::external::{FoodMatch, NutrientSource};
use crate::tools::context::ToolExecutionContext;
use crate::tools::schema::{ArgumentSchema, PropertySchema, PropertyType};
use crate::tools::traits::{CoachTool, ToolCapabilities};

const DEFAULT_LOOKUP_LIMIT: u32 = 5;
const MAX_LOOKUP_LIMIT: u32 = 10;

// ============================================================================
// Helper functions
// ============================================================================

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn food_json(food: &FoodMatch) -> Value {
    json!({
        "description": food.description,
        "fdc_id": food.fdc_id,
        "calories": food.calories,
        "protein_g": food.protein_g,
        "fat_g": food.fat_g,
        "carbs_g": food.carbs_g,
    })
}

fn required_str<'a>(args: &'a Value, key: &str) -> AppResult<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::invalid_input(format!("'{key}' must be a non-empty string")))
}

// ============================================================================
// LookupNutrientsTool
// ============================================================================

/// Search foods and report their macronutrients
pub struct LookupNutrientsTool {
    source: Arc<dyn NutrientSource>,
}

impl LookupNutrientsTool {
    /// Create the tool over `source`
    #[must_use]
    pub fn new(source: Arc<dyn NutrientSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl CoachTool for LookupNutrientsTool {
    fn name(&self) -> &'static str {
        LOOKUP_NUTRIENTS
    }

    fn description(&self) -> &'static str {
        "Look up calories, protein, fat and carbohydrate per 100 g for a food in USDA FoodData Central"
    }

    fn argument_schema(&self) -> ArgumentSchema {
        ArgumentSchema::object()
            .required(
                "query",
                PropertySchema::string("Food to search for, e.g. 'chicken breast'"),
            )
            .optional(
                "limit",
                PropertySchema::integer("Number of matches to return (1-10, default 5)"),
            )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::EXTERNAL_API
    }

    async fn execute(&self, args: Value, _context: &ToolExecutionContext) -> AppResult<Value> {
        let query = required_str(&args, "query")?;
        let limit = args
            .get("limit")
            .and_then(Value::as_i64)
            .map_or(DEFAULT_LOOKUP_LIMIT, |limit| {
                limit.clamp(1, i64::from(MAX_LOOKUP_LIMIT)) as u32
            });

        let foods = self.source.search_foods(query, limit).await?;
        Ok(json!({
            "query": query,
            "foods": foods.iter().take(limit as usize).map(food_json).collect::<Vec<_>>(),
            "source": self.source.source_name(),
        }))
    }
}

// ============================================================================
// EstimateMealNutritionTool
// ============================================================================

/// Estimate the macros of a meal from its listed foods
pub struct EstimateMealNutritionTool {
    source: Arc<dyn NutrientSource>,
}

impl EstimateMealNutritionTool {
    /// Create the tool over `source`
    #[must_use]
    pub fn new(source: Arc<dyn NutrientSource>) -> Self {
        Self { source }
    }
}

#[derive(Default)]
struct MacroTotals {
    calories: f64,
    protein_g: f64,
    fat_g: f64,
    carbs_g: f64,
}

impl MacroTotals {
    fn add(&mut self, food: &FoodMatch) {
        self.calories += food.calories.unwrap_or(0.0);
        self.protein_g += food.protein_g.unwrap_or(0.0);
        self.fat_g += food.fat_g.unwrap_or(0.0);
        self.carbs_g += food.carbs_g.unwrap_or(0.0);
    }

    fn to_json(&self) -> Value {
        json!({
            "calories": round2(self.calories),
            "protein_g": round2(self.protein_g),
            "fat_g": round2(self.fat_g),
            "carbs_g": round2(self.carbs_g),
        })
    }
}

#[async_trait]
impl CoachTool for EstimateMealNutritionTool {
    fn name(&self) -> &'static str {
        ESTIMATE_MEAL_NUTRITION
    }

    fn description(&self) -> &'static str {
        "Estimate total calories and macros of a meal from a list of foods, using the top USDA match per food"
    }

    fn argument_schema(&self) -> ArgumentSchema {
        ArgumentSchema::object().required(
            "food_items",
            PropertySchema::array_of(
                PropertyType::String,
                "Foods in the meal, e.g. ['oatmeal', 'banana']",
            ),
        )
    }

    fn capabilities(&self) -> ToolCapabilities {
        ToolCapabilities::READS_DATA | ToolCapabilities::EXTERNAL_API
    }

    async fn execute(&self, args: Value, _context: &ToolExecutionContext) -> AppResult<Value> {
        let items: Vec<&str> = args
            .get("food_items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if items.is_empty() {
            return Err(AppError::invalid_input(
                "'food_items' must list at least one food",
            ));
        }

        let mut totals = MacroTotals::default();
        let mut matched = Vec::with_capacity(items.len());
        let mut unmatched = Vec::new();

        for item in items {
            match self.source.search_foods(item, 1).await?.into_iter().next() {
                Some(food) => {
                    totals.add(&food);
                    let mut entry = food_json(&food);
                    entry["input"] = json!(item);
                    matched.push(entry);
                }
                None => unmatched.push(item),
            }
        }

        Ok(json!({
            "items": matched,
            "totals": totals.to_json(),
            "unmatched_items": unmatched,
            "assumption": "Totals use the top match per food at a 100 g reference amount; scale to actual portions.",
            "source": self.source.source_name(),
        }))
    }
}

/// Create all nutrition tools over a shared source
#[must_use]
pub fn create_nutrition_tools(source: &Arc<dyn NutrientSource>) -> Vec<Arc<dyn CoachTool>> {
    vec![
        Arc::new(LookupNutrientsTool::new(Arc::clone(source))),
        Arc::new(EstimateMealNutritionTool::new(Arc::clone(source))),
    ]
}
