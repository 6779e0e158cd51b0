// ABOUTME: Data models for CGM sync configurations, glucose readings, and sync outcomes
// ABOUTME: Shared between provider adapters, the persistent store, and the sync engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Core data models

mod configuration;
mod outcome;
mod reading;
mod status;

pub use configuration::{ConfigurationFilter, ConfigurationUpdate, SyncConfiguration};
pub use outcome::{FleetOutcome, SyncOptions, SyncOutcome};
pub use reading::{natural_identifier, GlucoseRecord, Reading, UpsertOutcome};
pub use status::{ConnectionStatus, ParseStatusError, ProviderKind};
