// ABOUTME: CGM sync engine: identity resolution, provider selection, status machine, and fleet orchestration
// ABOUTME: Re-exports the per-patient executor, the fleet orchestrator, and the assembled engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Sync engine
//!
//! Data flows fleet → identity → executor → provider → store, with the
//! status machine consulted on failure:
//!
//! - [`identity`]: phone in any format to configuration, plus unified patient backfill
//! - [`selection`]: credential priority rules and credential decryption
//! - [`status`]: failure classification and the `active`/`unauthorized`/`error` machine
//! - [`executor`]: one patient's sync
//! - [`fleet`]: every eligible patient, isolated and bounded
//! - [`locks`]: one in-flight sync per configuration

/// Engine assembly
pub mod engine;
/// Single-patient sync
pub mod executor;
/// Fleet orchestration
pub mod fleet;
/// Identity resolution
pub mod identity;
/// Per-configuration mutual exclusion
pub mod locks;
/// Provider selection
pub mod selection;
/// Connection status state machine
pub mod status;

pub use engine::SyncEngine;
pub use executor::SyncExecutor;
pub use fleet::FleetOrchestrator;
pub use identity::IdentityResolver;
pub use locks::{PatientGuard, PatientLocks};
pub use selection::{credentials_for, CredentialPredicate, ProviderSelector};
pub use status::{
    next_status, AuthMarkerClassifier, FailureClass, FailureClassifier, StatusDecision,
};
pub use tokio_util::sync::CancellationToken;
