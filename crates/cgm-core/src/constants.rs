// ABOUTME: Constants for sync windows, point caps, and connection status escalation
// ABOUTME: Pure data constants shared by the providers crate and the sync engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants organized by domain

/// Fetch window sizing per sync mode
pub mod windows {
    /// Regular sync window: last 3 days
    pub const DEFAULT_WINDOW_MINUTES: u32 = 3 * 24 * 60;
    /// Regular sync cap (3 days of 5-minute readings)
    pub const DEFAULT_MAX_COUNT: u32 = 864;
    /// Backfill window: last 14 days
    pub const BACKFILL_WINDOW_MINUTES: u32 = 14 * 24 * 60;
    /// Backfill cap (14 days of 5-minute readings)
    pub const BACKFILL_MAX_COUNT: u32 = 4032;
    /// Nightscout always fetches the last 24 hours, backfill or not
    pub const NIGHTSCOUT_WINDOW_MINUTES: u32 = 24 * 60;
    /// Nightscout cap (24 hours of 5-minute readings)
    pub const NIGHTSCOUT_MAX_COUNT: u32 = 288;
}

/// Connection status escalation
pub mod escalation {
    /// Consecutive non-auth failures at which the status becomes `error`
    pub const ERROR_THRESHOLD: u32 = 3;

    /// Case-insensitive substrings that mark a failure as an authentication problem
    pub const AUTH_FAILURE_MARKERS: &[&str] =
        &["auth", "unauthorized", "invalid", "401", "credentials"];
}

/// Human-readable outcome messages
pub mod messages {
    /// Outcome message when the provider was reachable but returned nothing
    pub const NO_READINGS_AVAILABLE: &str = "no readings available";
    /// Outcome message when the configuration has sync turned off
    pub const SYNC_DISABLED: &str = "sync disabled for this patient";
}

/// Glucose units
pub mod units {
    /// Milligrams per decilitre, the unit every adapter reports in
    pub const MG_DL: &str = "mg/dL";
}
