// ABOUTME: Core types and constants for the CGM sync engine
// ABOUTME: Foundation crate with error taxonomy, glucose data contracts, and sync window constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # CGM Core
//!
//! Foundation crate providing the shared data contracts for the CGM sync
//! engine. It has no I/O of its own so that provider adapters, the store and
//! the engine can all depend on it without pulling each other in.
//!
//! ## Modules
//!
//! - **errors**: `SyncError`, `ProviderError`, `StoreError` and `ErrorCode`
//! - **constants**: fetch windows, point caps, escalation threshold, auth markers
//! - **models**: `SyncConfiguration`, `Reading`, `GlucoseRecord`, outcomes and `ConnectionStatus`

/// Error taxonomy for sync, provider and persistence failures
pub mod errors;

/// Sync window sizes, escalation thresholds and classification markers
pub mod constants;

/// Sync configuration, reading and outcome models
pub mod models;
