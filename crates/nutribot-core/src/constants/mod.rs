// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Defaults, limits, tool identifiers and environment variable names for Nutribot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single large list.

/// Environment variable names read by the configuration layer
pub mod env_config {
    /// Base URL of the OpenAI-compatible chat completions API
    pub const LLM_BASE_URL: &str = "NUTRIBOT_LLM_BASE_URL";
    /// API key for the model provider
    pub const LLM_API_KEY: &str = "NUTRIBOT_LLM_API_KEY";
    /// Conventional `OpenAI` key variable, used when `LLM_API_KEY` is unset
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// Model identifier
    pub const LLM_MODEL: &str = "NUTRIBOT_LLM_MODEL";
    /// Sampling temperature
    pub const TEMPERATURE: &str = "NUTRIBOT_TEMPERATURE";
    /// Nucleus sampling parameter
    pub const TOP_P: &str = "NUTRIBOT_TOP_P";
    /// Maximum output tokens per completion
    pub const MAX_OUTPUT_TOKENS: &str = "NUTRIBOT_MAX_OUTPUT_TOKENS";
    /// Model requests allowed per rate window
    pub const REQUESTS_PER_MINUTE: &str = "NUTRIBOT_REQUESTS_PER_MINUTE";
    /// Rate window width in seconds
    pub const RATE_WINDOW_SECS: &str = "NUTRIBOT_RATE_WINDOW_SECS";
    /// Attempts per model call before the provider is considered unavailable
    pub const MODEL_MAX_ATTEMPTS: &str = "NUTRIBOT_MODEL_MAX_ATTEMPTS";
    /// Initial retry backoff in milliseconds
    pub const RETRY_BASE_DELAY_MS: &str = "NUTRIBOT_RETRY_BASE_DELAY_MS";
    /// Backoff ceiling in milliseconds
    pub const RETRY_MAX_DELAY_MS: &str = "NUTRIBOT_RETRY_MAX_DELAY_MS";
    /// Randomize backoff delays
    pub const RETRY_JITTER: &str = "NUTRIBOT_RETRY_JITTER";
    /// Per-attempt model call timeout in seconds
    pub const MODEL_TIMEOUT_SECS: &str = "NUTRIBOT_MODEL_TIMEOUT_SECS";
    /// Per-call tool timeout in seconds
    pub const TOOL_TIMEOUT_SECS: &str = "NUTRIBOT_TOOL_TIMEOUT_SECS";
    /// Maximum tool rounds per orchestration run
    pub const MAX_TOOL_ROUNDS: &str = "NUTRIBOT_MAX_TOOL_ROUNDS";
    /// Number of prior user/assistant turns sent to the model
    pub const HISTORY_LIMIT: &str = "NUTRIBOT_HISTORY_LIMIT";
    /// Execute tool calls of one round concurrently
    pub const PARALLEL_TOOLS: &str = "NUTRIBOT_PARALLEL_TOOLS";
    /// USDA `FoodData` Central API key
    pub const USDA_API_KEY: &str = "USDA_API_KEY";
    /// USDA `FoodData` Central base URL
    pub const USDA_BASE_URL: &str = "USDA_BASE_URL";
}

/// Model provider defaults
pub mod llm {
    /// Default OpenAI-compatible API base URL
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
    /// Default model
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.4;
    /// Default nucleus sampling parameter
    pub const DEFAULT_TOP_P: f32 = 0.9;
    /// Default maximum output tokens
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1200;
    /// Lower bound for `max_output_tokens`
    pub const MIN_OUTPUT_TOKENS: u32 = 100;
    /// Upper bound for `max_output_tokens`
    pub const MAX_OUTPUT_TOKENS: u32 = 4000;
    /// Default per-attempt timeout in seconds
    pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;
    /// Name given to the structured plan schema on the wire
    pub const PLAN_SCHEMA_NAME: &str = "structured_plan";
}

/// Rate limiting and retry defaults
pub mod limits {
    /// Default model requests per window
    pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;
    /// Default rate window in seconds
    pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
    /// Shortest sleep taken by a waiting limiter
    pub const MIN_LIMITER_SLEEP_MS: u64 = 10;
    /// Default attempts per model call
    pub const DEFAULT_MODEL_MAX_ATTEMPTS: u32 = 3;
    /// Upper bound for configured model attempts
    pub const MAX_MODEL_ATTEMPTS: u32 = 5;
    /// Default initial backoff
    pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;
    /// Default backoff ceiling
    pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 15_000;
}

/// Orchestration loop defaults
pub mod orchestration {
    /// Default maximum tool rounds per run
    pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 4;
    /// Smallest accepted `max_tool_rounds`
    pub const MIN_TOOL_ROUNDS: u32 = 1;
    /// Largest accepted `max_tool_rounds`
    pub const MAX_TOOL_ROUNDS: u32 = 8;
    /// Default number of prior turns sent to the model
    pub const DEFAULT_HISTORY_LIMIT: usize = 10;
    /// Turns loaded from the conversation store per chat request
    pub const STORED_HISTORY_LIMIT: usize = 16;
    /// Default per-call tool timeout in seconds
    pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 15;
    /// Characters kept in a tool result preview
    pub const RESULT_PREVIEW_CHARS: usize = 500;
    /// Capacity of the tool audit broadcast channel
    pub const AUDIT_CHANNEL_CAPACITY: usize = 256;
}

/// Input limits applied to chat requests and profiles
pub mod input {
    /// Maximum characters in one user message
    pub const MAX_MESSAGE_CHARS: usize = 4000;
    /// Maximum entries per profile list
    pub const MAX_PROFILE_ITEMS: usize = 20;
    /// Maximum characters per profile list entry
    pub const MAX_PROFILE_ITEM_CHARS: usize = 100;
    /// Maximum characters in profile notes
    pub const MAX_PROFILE_NOTES_CHARS: usize = 2000;
    /// Maximum priorities in a structured plan
    pub const MAX_PLAN_PRIORITIES: usize = 3;
}

/// Tool identifiers
pub mod tools {
    /// USDA nutrient search
    pub const LOOKUP_NUTRIENTS: &str = "lookup_nutrients";
    /// Whole-meal macro estimate
    pub const ESTIMATE_MEAL_NUTRITION: &str = "estimate_meal_nutrition";
    /// Read stored user memory
    pub const GET_USER_MEMORY: &str = "get_user_memory";
    /// Persist a user memory entry
    pub const STORE_USER_MEMORY: &str = "store_user_memory";
}

/// USDA `FoodData` Central defaults
pub mod usda {
    /// Default API base URL
    pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
    /// Search cache TTL in seconds
    pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;
    /// Requests per minute allowed against the USDA API
    pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 30;
    /// HTTP timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 10;
}
