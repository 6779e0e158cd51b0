// ABOUTME: Configuration management module for the CGM sync engine
// ABOUTME: Re-exports the environment-driven engine configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! All settings come from environment variables; see [`environment::env_vars`].

/// Environment and engine configuration
pub mod environment;

pub use environment::{Environment, SyncEngineConfig};
