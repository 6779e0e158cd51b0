// ABOUTME: Utility modules shared by the sync engine
// ABOUTME: Contains phone normalization for patient identity lookup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Phone number normalization
pub mod phone;

pub use phone::{NanpPhoneNormalizer, PhoneNormalizer};
