// ABOUTME: USDA FoodData Central API client for nutrient search
// ABOUTME: Implements cached, rate-limited food search plus an offline mock client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! USDA `FoodData` Central API Client
//!
//! # Features
//! - Food search returning macronutrients per 100 g
//! - Time-limited caching to minimize API calls
//! - Sliding-window rate limiting (30 requests per minute by default)
//! - Mock client for offline runs and tests
//!
//! # API Reference
//! USDA `FoodData` Central API: <https://fdc.nal.usda.gov/api-guide.html>

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::constants::usda::{
    DEFAULT_BASE_URL, DEFAULT_CACHE_TTL_SECS, DEFAULT_RATE_LIMIT_PER_MINUTE, REQUEST_TIMEOUT_SECS,
};
use crate::errors::{AppError, AppResult};
use crate::rate_limiting::SlidingWindowRateLimiter;

use super::{FoodMatch, NutrientSource};

const NUTRIENT_ENERGY_KCAL: u32 = 1008;
const NUTRIENT_PROTEIN: u32 = 1003;
const NUTRIENT_FAT: u32 = 1004;
const NUTRIENT_CARBS: u32 = 1005;
const MAX_PAGE_SIZE: u32 = 200;

/// USDA API client configuration
#[derive(Debug, Clone)]
pub struct UsdaClientConfig {
    /// USDA API key (free from <https://fdc.nal.usda.gov/api-key-signup.html>)
    pub api_key: String,
    /// Base URL for USDA API
    pub base_url: String,
    /// Cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// Rate limit per minute
    pub rate_limit_per_minute: u32,
}

impl Default for UsdaClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
        }
    }
}

/// USDA API search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchFood {
    fdc_id: u64,
    description: String,
    #[serde(default)]
    food_nutrients: Vec<SearchNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNutrient {
    nutrient_id: Option<u32>,
    value: Option<f64>,
}

impl From<SearchFood> for FoodMatch {
    fn from(food: SearchFood) -> Self {
        let amount = |id: u32| {
            food.food_nutrients
                .iter()
                .find(|n| n.nutrient_id == Some(id))
                .and_then(|n| n.value)
        };
        Self {
            fdc_id: food.fdc_id,
            calories: amount(NUTRIENT_ENERGY_KCAL),
            protein_g: amount(NUTRIENT_PROTEIN),
            fat_g: amount(NUTRIENT_FAT),
            carbs_g: amount(NUTRIENT_CARBS),
            description: food.description,
        }
    }
}

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

/// USDA `FoodData` Central API Client
pub struct UsdaClient {
    config: UsdaClientConfig,
    http_client: reqwest::Client,
    search_cache: RwLock<HashMap<String, CacheEntry<Vec<FoodMatch>>>>,
    rate_limiter: SlidingWindowRateLimiter,
}

impl UsdaClient {
    /// Create a new USDA API client
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero rate limit or when the HTTP
    /// client cannot be built.
    pub fn new(config: UsdaClientConfig) -> AppResult<Self> {
        let rate_limiter = SlidingWindowRateLimiter::per_minute(config.rate_limit_per_minute)?;
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::config(format!("failed to build USDA HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
            search_cache: RwLock::new(HashMap::new()),
            rate_limiter,
        })
    }

    async fn cached(&self, key: &str) -> Option<Vec<FoodMatch>> {
        let cache = self.search_cache.read().await;
        cache
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.data.clone())
    }

    async fn fetch(&self, query: &str, page_size: u32) -> AppResult<Vec<FoodMatch>> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/foods/search", self.config.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("pageSize", &page_size.to_string()),
                ("api_key", &self.config.api_key),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_unavailable("USDA API", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                "USDA API",
                format!("HTTP {status}: {body}"),
            ));
        }

        let search_response: SearchResponse = response.json().await.map_err(|e| {
            AppError::external_service("USDA API", format!("JSON parse error: {e}"))
        })?;

        Ok(search_response
            .foods
            .into_iter()
            .map(FoodMatch::from)
            .collect())
    }

    /// Insert a search result, evicting entries that have already expired
    async fn store(&self, key: String, foods: Vec<FoodMatch>) {
        let now = Instant::now();
        let mut cache = self.search_cache.write().await;
        cache.retain(|_, entry| now < entry.expires_at);
        cache.insert(
            key,
            CacheEntry {
                data: foods,
                expires_at: now + Duration::from_secs(self.config.cache_ttl_secs),
            },
        );
    }

    /// Clear the search cache
    pub async fn clear_cache(&self) {
        self.search_cache.write().await.clear();
    }
}

#[async_trait]
impl NutrientSource for UsdaClient {
    fn source_name(&self) -> &'static str {
        "usda_fdc"
    }

    async fn search_foods(&self, query: &str, limit: u32) -> AppResult<Vec<FoodMatch>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::invalid_input("Search query cannot be empty"));
        }
        let page_size = limit.clamp(1, MAX_PAGE_SIZE);

        let cache_key = format!("{}:{page_size}", query.to_lowercase());
        if let Some(hit) = self.cached(&cache_key).await {
            debug!(query, "USDA search cache hit");
            return Ok(hit);
        }

        let foods = self.fetch(query, page_size).await?;
        self.store(cache_key, foods.clone()).await;
        Ok(foods)
    }
}

/// Mock USDA client with fixed data (no API calls)
pub struct MockUsdaClient {
    foods: Vec<FoodMatch>,
}

impl MockUsdaClient {
    /// Create a new mock client with predefined data
    #[must_use]
    pub fn new() -> Self {
        Self {
            foods: vec![
                FoodMatch {
                    fdc_id: 171_477,
                    description: "Chicken, breast, meat only, cooked, roasted".to_owned(),
                    calories: Some(165.0),
                    protein_g: Some(31.02),
                    fat_g: Some(3.57),
                    carbs_g: Some(0.0),
                },
                FoodMatch {
                    fdc_id: 171_688,
                    description: "Apples, raw, with skin".to_owned(),
                    calories: Some(52.0),
                    protein_g: Some(0.26),
                    fat_g: Some(0.17),
                    carbs_g: Some(13.81),
                },
                FoodMatch {
                    fdc_id: 173_904,
                    description: "Cereals, oats, regular and quick, not fortified, dry".to_owned(),
                    calories: Some(379.0),
                    protein_g: Some(13.15),
                    fat_g: Some(6.52),
                    carbs_g: Some(67.7),
                },
            ],
        }
    }
}

impl Default for MockUsdaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NutrientSource for MockUsdaClient {
    fn source_name(&self) -> &'static str {
        "usda_fdc_mock"
    }

    async fn search_foods(&self, query: &str, limit: u32) -> AppResult<Vec<FoodMatch>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Err(AppError::invalid_input("Search query cannot be empty"));
        }

        Ok(self
            .foods
            .iter()
            .filter(|food| {
                let description = food.description.to_lowercase();
                query
                    .split_whitespace()
                    .all(|word| description.contains(word))
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
