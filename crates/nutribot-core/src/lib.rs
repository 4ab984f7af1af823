// ABOUTME: Core types and constants for the Nutribot coach engine
// ABOUTME: Foundation crate with error handling, conversation and plan models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Nutribot Core
//!
//! Foundation crate providing shared types and constants for the Nutribot coach
//! engine. This crate is designed to change infrequently, enabling incremental
//! compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `ToolError`
//! - **constants**: Defaults, limits, and environment variable names
//! - **models**: Conversation turns, user profiles, and the structured coaching plan

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants and configuration values organized by domain
pub mod constants;

/// Core data models (conversation turns, profiles, structured plans)
pub mod models;
