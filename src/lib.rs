// ABOUTME: Main library entry point for the CGM sync engine
// ABOUTME: Ingests glucose readings per patient, persists them idempotently, and tracks link health
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # CGM Sync Engine
//!
//! Pulls continuous glucose monitor readings for a population of patients
//! from Dexcom Share, `LibreLinkUp` or Nightscout, stores them once per
//! natural identifier, and keeps a per-patient connection status with
//! graduated failure escalation.
//!
//! ## Architecture
//!
//! - **Providers** (`cgm-providers`): adapter contract and timeout-enforcing registry
//! - **Core** (`cgm-core`): errors, models and constants shared by every layer
//! - **Database**: the `SyncStore` capability and its SQLite implementation
//! - **Sync**: identity resolver, executor, status machine and fleet orchestrator
//! - **Config / Logging / Crypto / Utils**: environment settings, tracing setup,
//!   stored-secret decryption and phone normalization
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cgm_sync_engine::config::SyncEngineConfig;
//! use cgm_sync_engine::models::SyncOptions;
//! use cgm_sync_engine::providers::ProviderRegistry;
//! use cgm_sync_engine::sync::SyncEngine;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SyncEngineConfig::from_env()?;
//!     let engine = SyncEngine::from_config(&config, ProviderRegistry::default()).await?;
//!
//!     let outcome = engine.sync_one("(555) 123-4567", SyncOptions::default()).await?;
//!     println!("persisted {} of {}", outcome.persisted, outcome.returned);
//!
//!     let fleet = engine.sync_all().await?;
//!     println!("{} of {} patients synced", fleet.successful, fleet.total);
//!     Ok(())
//! }
//! ```

/// Environment configuration
pub mod config;

/// Stored-secret encryption and decryption
pub mod crypto;

/// Store capability and SQLite implementation
pub mod database;

/// Logging configuration and structured sync events
pub mod logging;

/// Identity resolution, sync execution, status machine and fleet orchestration
pub mod sync;

/// Phone normalization
pub mod utils;

pub use cgm_core::{constants, errors, models};

/// Provider adapter contract and registry
pub use cgm_providers as providers;
