// ABOUTME: Built-in coach tool implementations grouped by category
// ABOUTME: Each category exposes a factory the registry calls during built-in registration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use crate::external::NutrientSource;
use crate::memory::MemoryStore;

/// Nutrient lookup and meal estimation
#[cfg(feature = "tools-nutrition")]
pub mod nutrition;

/// Reading and writing user memory
#[cfg(feature = "tools-memory")]
pub mod memory;

/// Shared backends the built-in tools are constructed with
#[derive(Clone)]
pub struct ToolBackends {
    /// Food nutrient search
    pub nutrients: Arc<dyn NutrientSource>,
    /// Per-user memory
    pub memory: Arc<dyn MemoryStore>,
}

impl ToolBackends {
    /// Bundle the backends
    #[must_use]
    pub fn new(nutrients: Arc<dyn NutrientSource>, memory: Arc<dyn MemoryStore>) -> Self {
        Self { nutrients, memory }
    }
}
