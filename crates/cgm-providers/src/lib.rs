// ABOUTME: Glucose provider adapter contract for Dexcom Share, LibreLinkUp and Nightscout
// ABOUTME: Core adapter trait, credential sets, fetch windows, and the timeout-enforcing registry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Glucose data provider abstractions.
//!
//! The HTTP clients that talk to each upstream live outside this workspace;
//! they plug in by implementing [`GlucoseProvider`] and registering with a
//! [`ProviderRegistry`], which bounds every call with a network deadline.

pub use cgm_core::constants;
pub use cgm_core::errors;
pub use cgm_core::models;

/// Core provider trait, credentials and fetch windows
pub mod adapter;
/// Registry of adapters keyed by provider kind
pub mod registry;
/// Scripted provider for tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cgm_core::errors::provider::{ProviderError, ProviderResult};
pub use adapter::{FetchWindow, GlucoseProvider, ProviderCredentials};
pub use registry::{ProviderRegistry, DEFAULT_PROVIDER_TIMEOUT};
#[cfg(any(test, feature = "testing"))]
pub use testing::{RecordedFetch, StaticProvider};
