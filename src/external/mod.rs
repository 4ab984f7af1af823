// ABOUTME: External nutrient data sources (USDA FoodData Central)
// ABOUTME: Defines the NutrientSource seam used by the nutrition tools
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! External API Clients
//!
//! Nutrition tools depend on [`NutrientSource`] rather than a concrete client,
//! so the live USDA client and the offline mock are interchangeable.

pub mod usda_client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

pub use usda_client::{MockUsdaClient, UsdaClient, UsdaClientConfig};

/// Macronutrient summary of one food, per 100 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodMatch {
    /// `FoodData` Central ID
    pub fdc_id: u64,
    /// Food description
    pub description: String,
    /// Energy in kcal
    pub calories: Option<f64>,
    /// Protein in grams
    pub protein_g: Option<f64>,
    /// Total fat in grams
    pub fat_g: Option<f64>,
    /// Carbohydrate in grams
    pub carbs_g: Option<f64>,
}

/// Searchable source of food nutrient data
#[async_trait]
pub trait NutrientSource: Send + Sync {
    /// Short identifier reported in tool payloads
    fn source_name(&self) -> &'static str;

    /// Best matches for `query`, most relevant first.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty query or when the backing service fails.
    async fn search_foods(&self, query: &str, limit: u32) -> AppResult<Vec<FoodMatch>>;
}
