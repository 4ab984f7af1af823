// ABOUTME: Per-user memory store backing the get/store user memory tools
// ABOUTME: Async trait seam plus a DashMap-backed in-process implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # User Memory
//!
//! Memories are append-only `(key, value)` entries. A snapshot resolves each key
//! to its most recently stored value.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

/// One remembered fact about a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Topic, e.g. `"breakfast_preference"`
    pub key: String,
    /// Remembered value
    pub value: String,
    /// Why the model decided to store it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When it was stored
    pub created_at: DateTime<Utc>,
}

impl MemoryEntry {
    /// Entry stamped with the current time
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            reason,
            created_at: Utc::now(),
        }
    }
}

/// Storage for user memories
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Append an entry for `user_id`
    ///
    /// # Errors
    ///
    /// Returns a storage error when the backend fails.
    async fn add(&self, user_id: &str, entry: MemoryEntry) -> AppResult<()>;

    /// Latest value per key
    ///
    /// # Errors
    ///
    /// Returns a storage error when the backend fails.
    async fn snapshot(&self, user_id: &str) -> AppResult<BTreeMap<String, String>>;

    /// Up to `limit` entries, newest first
    ///
    /// # Errors
    ///
    /// Returns a storage error when the backend fails.
    async fn recent(&self, user_id: &str, limit: usize) -> AppResult<Vec<MemoryEntry>>;
}

/// In-process memory store
#[derive(Debug, Default)]
pub struct InMemoryMemoryStore {
    entries: DashMap<String, Vec<MemoryEntry>>,
}

impl InMemoryMemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn add(&self, user_id: &str, entry: MemoryEntry) -> AppResult<()> {
        self.entries
            .entry(user_id.to_owned())
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn snapshot(&self, user_id: &str) -> AppResult<BTreeMap<String, String>> {
        Ok(self
            .entries
            .get(user_id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| (entry.key.clone(), entry.value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn recent(&self, user_id: &str, limit: usize) -> AppResult<Vec<MemoryEntry>> {
        Ok(self
            .entries
            .get(user_id)
            .map(|entries| entries.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
